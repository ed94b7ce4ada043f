//! Connectors for the exchange streaming and REST APIs.
//!
//! This module provides the low-level clients: session login, the betting
//! REST client, and the framed TLS stream. Raw wire data is decoded here
//! and normalized through the engine layer before it drives any staking
//! decision.

mod auth;
mod framing;
mod rest;
mod stream;

pub use auth::{login, AuthError, Credentials, SSO_URL};
pub use framing::FrameDecoder;
pub use rest::{
    BettingClient, EventInfo, MarketSummary, PlacementReport, RestError, RunnerSummary,
};
pub use stream::{ExchangeStream, StreamError};
