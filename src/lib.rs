//! Automated tennis staking bot for a betting exchange streaming API.
//!
//! The bot holds a persistent TLS connection to the exchange's streaming
//! endpoint, tracks per-match market state from CRLF-framed JSON deltas,
//! and runs a martingale staking strategy off the transitions: when a
//! close first set ends with the loser still at backable odds, it backs
//! the loser, doubling its stake multiplier after each settled loss and
//! resetting after each win.
//!
//! # Architecture
//!
//! - **Connectors** own the wire: session login, the framed TLS stream,
//!   and the REST betting client.
//! - **Engine** owns the behavior: the message router mutates market
//!   state and fires the staking engine; the bot loop owns the connection
//!   lifecycle and reconnects after a fixed delay.
//! - **Execution** is the gateway seam: a simulated in-memory ledger for
//!   test runs, the REST client for live ones.
//! - At most one bet is outstanding across all markets at any time. The
//!   flag guarding this is committed before any suspending call.
//!
//! # Usage
//!
//! ```no_run
//! use betfair_tennis_bot::config::Settings;
//! use betfair_tennis_bot::connectors::{login, Credentials, SSO_URL};
//! use betfair_tennis_bot::engine::{Bot, MessageRouter, StakingEngine};
//! use betfair_tennis_bot::execution::SimulatedGateway;
//! use betfair_tennis_bot::journal::EventJournal;
//! use betfair_tennis_bot::markets::MarketStore;
//!
//! #[tokio::main]
//! async fn main() {
//!     let settings = Settings::from_env();
//!     let credentials = Credentials::from_env().expect("credentials");
//!     let http = reqwest::Client::new();
//!     let session = login(&http, SSO_URL, &credentials).await.expect("login");
//!
//!     let staking = StakingEngine::new(&settings, SimulatedGateway::new());
//!     let journal = EventJournal::new(settings.journal_dir.clone());
//!     let router = MessageRouter::new(MarketStore::default(), staking, journal, settings.mode);
//!     Bot::new(settings, credentials.app_key, session, router).run().await;
//! }
//! ```

pub mod config;
pub mod connectors;
pub mod engine;
pub mod execution;
pub mod journal;
pub mod markets;
pub mod protocol;
pub mod utils;

// Re-export commonly used types
pub use config::{FillPolicy, Settings, StakingMode};
pub use engine::{Bot, MessageRouter, StakingEngine};
pub use markets::{MarketState, MarketStore};
