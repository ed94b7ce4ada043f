//! In-memory order ledger for simulated runs.
//!
//! Every placement fills completely at the requested price; the ledger
//! keeps the full order history so tests and status reports can inspect
//! what the strategy did.

use async_trait::async_trait;
use tracing::info;

use super::{GatewayError, OrderGateway, PlacedOrder};

#[derive(Debug, Clone, PartialEq)]
pub struct SimOrder {
    pub order_id: String,
    pub market_id: String,
    pub selection_id: u64,
    pub size: f64,
    pub price: f64,
}

#[derive(Debug, Default)]
pub struct SimulatedGateway {
    next_id: u64,
    orders: Vec<SimOrder>,
}

impl SimulatedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// All orders placed this run, oldest first.
    pub fn orders(&self) -> &[SimOrder] {
        &self.orders
    }
}

#[async_trait]
impl OrderGateway for SimulatedGateway {
    async fn place_order(
        &mut self,
        market_id: &str,
        selection_id: u64,
        size: f64,
        price: f64,
    ) -> Result<PlacedOrder, GatewayError> {
        self.next_id += 1;
        let order_id = format!("sim-{}", self.next_id);

        self.orders.push(SimOrder {
            order_id: order_id.clone(),
            market_id: market_id.to_string(),
            selection_id,
            size,
            price,
        });

        info!(market_id, selection_id, size, price, order_id, "simulated order placed");
        Ok(PlacedOrder {
            order_id,
            size,
            price,
        })
    }

    async fn replace_order(
        &mut self,
        _market_id: &str,
        order_id: &str,
        new_size: f64,
        new_price: f64,
    ) -> Result<(), GatewayError> {
        let order = self
            .orders
            .iter_mut()
            .find(|o| o.order_id == order_id)
            .ok_or_else(|| GatewayError::Edit(format!("unknown order {order_id}")))?;

        order.size = new_size;
        order.price = new_price;
        info!(order_id, new_size, new_price, "simulated order replaced");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_place_records_order() {
        let mut gateway = SimulatedGateway::new();
        let placed = gateway.place_order("1.1", 101, 10.0, 2.5).await.unwrap();
        assert_eq!(placed.order_id, "sim-1");
        assert_eq!(gateway.orders().len(), 1);
        assert_eq!(gateway.orders()[0].price, 2.5);
    }

    #[tokio::test]
    async fn test_order_ids_are_distinct() {
        let mut gateway = SimulatedGateway::new();
        let first = gateway.place_order("1.1", 101, 5.0, 2.0).await.unwrap();
        let second = gateway.place_order("1.2", 202, 5.0, 2.0).await.unwrap();
        assert_ne!(first.order_id, second.order_id);
    }

    #[tokio::test]
    async fn test_replace_updates_order() {
        let mut gateway = SimulatedGateway::new();
        let placed = gateway.place_order("1.1", 101, 10.0, 1000.0).await.unwrap();
        gateway
            .replace_order("1.1", &placed.order_id, 0.01, 2.5)
            .await
            .unwrap();
        assert_eq!(gateway.orders()[0].size, 0.01);
        assert_eq!(gateway.orders()[0].price, 2.5);
    }

    #[tokio::test]
    async fn test_replace_unknown_order_fails() {
        let mut gateway = SimulatedGateway::new();
        let result = gateway.replace_order("1.1", "missing", 1.0, 2.0).await;
        assert!(matches!(result, Err(GatewayError::Edit(_))));
    }
}
