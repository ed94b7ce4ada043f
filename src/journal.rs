//! Append-only journal of bot activity, partitioned by sporting event.
//!
//! One JSON object per line, one file per event id. Records carry an
//! ISO-8601 timestamp and a `type` tag. The journal is write-only from the
//! bot's perspective; a failed write is logged and never propagated.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum JournalRecord {
    #[serde(rename_all = "camelCase")]
    BetPlaced {
        market_id: String,
        selection_id: u64,
        player: String,
        size: f64,
        price: f64,
    },
    #[serde(rename_all = "camelCase")]
    BetEdited {
        market_id: String,
        order_id: String,
        new_size: f64,
        new_price: f64,
    },
    #[serde(rename_all = "camelCase")]
    OddsUpdate {
        market_id: String,
        odds_a: Option<f64>,
        odds_b: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    MarketExcluded { market_id: String, reason: String },
    #[serde(rename_all = "camelCase")]
    BetOutcome {
        market_id: String,
        won: bool,
        profit: f64,
        balance: Option<f64>,
        multiplier: u32,
    },
    #[serde(rename_all = "camelCase")]
    MarketClosed {
        market_id: String,
        winner_selection_id: Option<u64>,
    },
}

#[derive(Debug, Serialize)]
struct Entry<'a> {
    timestamp: String,
    #[serde(flatten)]
    record: &'a JournalRecord,
}

/// Writes per-event record files under a base directory.
#[derive(Debug, Clone)]
pub struct EventJournal {
    dir: PathBuf,
}

impl EventJournal {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Appends one record to the event's file.
    pub fn record(&self, event_id: &str, record: &JournalRecord) {
        if let Err(e) = self.try_record(event_id, record) {
            warn!(event_id, error = %e, "journal write failed");
        }
    }

    fn try_record(&self, event_id: &str, record: &JournalRecord) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let entry = Entry {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            record,
        };
        let line = serde_json::to_string(&entry).map_err(io::Error::other)?;
        let path = self.dir.join(format!("{event_id}.jsonl"));
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")
    }
}
