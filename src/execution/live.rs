//! Gateway backed by the venue's REST betting API.

use async_trait::async_trait;

use crate::connectors::BettingClient;

use super::{GatewayError, OrderGateway, PlacedOrder};

#[derive(Debug)]
pub struct LiveGateway {
    client: BettingClient,
}

impl LiveGateway {
    pub fn new(client: BettingClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OrderGateway for LiveGateway {
    async fn place_order(
        &mut self,
        market_id: &str,
        selection_id: u64,
        size: f64,
        price: f64,
    ) -> Result<PlacedOrder, GatewayError> {
        let report = self
            .client
            .place_order(market_id, selection_id, size, price)
            .await
            .map_err(|e| GatewayError::Placement(e.to_string()))?;

        Ok(PlacedOrder {
            order_id: report.order_id,
            size: report.size_matched.unwrap_or(size),
            price: report.average_price_matched.unwrap_or(price),
        })
    }

    async fn replace_order(
        &mut self,
        market_id: &str,
        order_id: &str,
        new_size: f64,
        new_price: f64,
    ) -> Result<(), GatewayError> {
        self.client
            .replace_order(market_id, order_id, new_size, new_price)
            .await
            .map_err(|e| GatewayError::Edit(e.to_string()))
    }
}
