//! Wire messages for the exchange streaming protocol.
//!
//! Every message on the stream is a UTF-8 JSON object terminated by CRLF.
//! Outbound and inbound messages carry an `op` discriminator; field names
//! follow the exchange's camelCase convention.

use serde::{Deserialize, Serialize};

/// Messages sent to the streaming endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op")]
pub enum RequestMessage {
    /// First message on every new connection.
    #[serde(rename = "authentication", rename_all = "camelCase")]
    Authentication { app_key: String, session: String },

    /// Subscribes one batch of markets to the market-data stream.
    #[serde(rename = "marketSubscription", rename_all = "camelCase")]
    MarketSubscription {
        id: u32,
        market_filter: MarketFilter,
        market_data_filter: MarketDataFilter,
    },

    /// Subscribes the session to its own order updates.
    #[serde(rename = "orderSubscription")]
    OrderSubscription { id: u32 },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketFilter {
    pub market_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketDataFilter {
    pub fields: Vec<String>,
}

/// Messages received from the streaming endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op")]
pub enum ResponseMessage {
    /// Greeting sent by the venue when the transport opens.
    #[serde(rename = "connection", rename_all = "camelCase")]
    Connection {
        #[serde(default)]
        connection_id: Option<String>,
    },

    /// Result of an authentication or subscription request.
    #[serde(rename = "status")]
    Status(StatusMessage),

    /// Market change: odds deltas and market definition updates.
    #[serde(rename = "mcm")]
    MarketChange(MarketChangeMessage),

    /// Order change: reports for this session's own orders.
    #[serde(rename = "ocm")]
    OrderChange(OrderChangeMessage),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusMessage {
    #[serde(default)]
    pub id: Option<u32>,
    pub status_code: String,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub connection_closed: Option<bool>,
}

impl StatusMessage {
    pub fn is_success(&self) -> bool {
        self.status_code == "SUCCESS"
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketChangeMessage {
    #[serde(default)]
    pub id: Option<u32>,
    #[serde(default)]
    pub mc: Vec<MarketChange>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketChange {
    pub id: String,
    #[serde(default)]
    pub market_definition: Option<MarketDefinition>,
    #[serde(default)]
    pub rc: Vec<RunnerChange>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketDefinition {
    #[serde(default)]
    pub in_play: Option<bool>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub score: Option<MatchScore>,
    #[serde(default)]
    pub runners: Vec<RunnerDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchScore {
    #[serde(default)]
    pub sets: Vec<SetScore>,
}

/// One set of the match as reported by the venue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetScore {
    pub home_games: u32,
    pub away_games: u32,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunnerDefinition {
    pub id: u64,
    #[serde(default)]
    pub status: Option<String>,
}

impl RunnerDefinition {
    pub fn is_winner(&self) -> bool {
        self.status.as_deref() == Some("WINNER")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunnerChange {
    pub id: u64,
    /// Best available-to-back ladder, entries of `[level, price, size]`.
    #[serde(default)]
    pub batb: Vec<[f64; 3]>,
    #[serde(default)]
    pub ltp: Option<f64>,
}

impl RunnerChange {
    /// Price at the top of the back ladder, if this delta carries one.
    pub fn best_back_price(&self) -> Option<f64> {
        self.batb.iter().find(|level| level[0] == 0.0).map(|level| level[1])
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderChangeMessage {
    #[serde(default)]
    pub id: Option<u32>,
    #[serde(default)]
    pub oc: Vec<OrderMarketChange>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderMarketChange {
    pub id: String,
    #[serde(rename = "or", default)]
    pub order_reports: Vec<OrderReport>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderReport {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub profit: Option<f64>,
}

impl OrderReport {
    /// "EC" marks an order whose execution is complete.
    pub fn is_execution_complete(&self) -> bool {
        self.status == "EC"
    }
}
