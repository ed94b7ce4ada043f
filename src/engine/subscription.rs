//! Subscription batching for the market and order streams.
//!
//! Subscriptions do not survive a reconnect; after every successful
//! authentication the full batch is rebuilt from the currently open
//! markets. Message construction is pure — sending stays with the
//! connection owner.

use crate::protocol::{MarketDataFilter, MarketFilter, RequestMessage};

/// Hard backend limit on market ids per subscription request.
pub const MARKET_BATCH_SIZE: usize = 10;

const MARKET_DATA_FIELDS: [&str; 2] = ["EX_BEST_OFFERS", "EX_MARKET_DEF"];

#[derive(Debug, Default)]
pub struct SubscriptionManager {
    next_id: u32,
    subscribed: bool,
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Clears the per-connection subscribed flag ahead of a reconnect.
    pub fn reset(&mut self) {
        self.subscribed = false;
    }

    /// Builds the subscription batch for the given open markets: one
    /// market-data request per chunk of at most [`MARKET_BATCH_SIZE`] ids,
    /// each with a distinct sequence id, plus exactly one order-stream
    /// request. Returns nothing if this connection is already subscribed.
    pub fn build_subscriptions(&mut self, open_market_ids: &[String]) -> Vec<RequestMessage> {
        if self.subscribed {
            return Vec::new();
        }

        let mut messages = Vec::new();
        for chunk in open_market_ids.chunks(MARKET_BATCH_SIZE) {
            messages.push(RequestMessage::MarketSubscription {
                id: self.allocate_id(),
                market_filter: MarketFilter {
                    market_ids: chunk.to_vec(),
                },
                market_data_filter: MarketDataFilter {
                    fields: MARKET_DATA_FIELDS.iter().map(|f| f.to_string()).collect(),
                },
            });
        }
        messages.push(RequestMessage::OrderSubscription {
            id: self.allocate_id(),
        });

        self.subscribed = true;
        messages
    }

    fn allocate_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("1.{i}")).collect()
    }

    fn batch_sizes(messages: &[RequestMessage]) -> Vec<usize> {
        messages
            .iter()
            .filter_map(|m| match m {
                RequestMessage::MarketSubscription { market_filter, .. } => {
                    Some(market_filter.market_ids.len())
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_25_markets_batch_into_10_10_5_plus_order_sub() {
        let mut manager = SubscriptionManager::new();
        let messages = manager.build_subscriptions(&ids(25));

        assert_eq!(batch_sizes(&messages), vec![10, 10, 5]);
        let order_subs = messages
            .iter()
            .filter(|m| matches!(m, RequestMessage::OrderSubscription { .. }))
            .count();
        assert_eq!(order_subs, 1);
        assert_eq!(messages.len(), 4);
    }

    #[test]
    fn test_sequence_ids_are_distinct() {
        let mut manager = SubscriptionManager::new();
        let messages = manager.build_subscriptions(&ids(25));
        let mut seen: Vec<u32> = messages
            .iter()
            .map(|m| match m {
                RequestMessage::MarketSubscription { id, .. } => *id,
                RequestMessage::OrderSubscription { id } => *id,
                RequestMessage::Authentication { .. } => unreachable!(),
            })
            .collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), messages.len());
    }

    #[test]
    fn test_idempotent_until_reset() {
        let mut manager = SubscriptionManager::new();
        assert!(!manager.build_subscriptions(&ids(5)).is_empty());
        assert!(manager.is_subscribed());
        assert!(manager.build_subscriptions(&ids(5)).is_empty());

        manager.reset();
        assert!(!manager.is_subscribed());
        let rebuilt = manager.build_subscriptions(&ids(5));
        assert_eq!(rebuilt.len(), 2);
    }

    #[test]
    fn test_no_markets_still_subscribes_orders() {
        let mut manager = SubscriptionManager::new();
        let messages = manager.build_subscriptions(&[]);
        assert_eq!(messages.len(), 1);
        assert!(matches!(
            messages[0],
            RequestMessage::OrderSubscription { .. }
        ));
    }
}
