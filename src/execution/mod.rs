//! Order execution gateways.
//!
//! The staking engine issues place/edit actions through the `OrderGateway`
//! trait; whether they hit an in-memory ledger or the venue's REST API is
//! invisible to it. Gateway calls are request/response only — they never
//! mutate market or staking state themselves.

mod live;
mod simulated;

use async_trait::async_trait;
use thiserror::Error;

pub use live::LiveGateway;
pub use simulated::{SimOrder, SimulatedGateway};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("placement failed: {0}")]
    Placement(String),

    #[error("edit failed: {0}")]
    Edit(String),
}

/// A confirmed order as the gateway reports it back.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedOrder {
    pub order_id: String,
    pub size: f64,
    pub price: f64,
}

#[async_trait]
pub trait OrderGateway: Send {
    /// Places a back bet of `size` at `price`; returns the venue order id.
    async fn place_order(
        &mut self,
        market_id: &str,
        selection_id: u64,
        size: f64,
        price: f64,
    ) -> Result<PlacedOrder, GatewayError>;

    /// Replaces an order's remaining size and price.
    async fn replace_order(
        &mut self,
        market_id: &str,
        order_id: &str,
        new_size: f64,
        new_price: f64,
    ) -> Result<(), GatewayError>;
}
