//! Per-match market state tracked from the stream.
//!
//! The store is the sole source of truth for "is a bet already open" on a
//! given market; the process-wide one-bet-at-a-time flag lives with the
//! staking engine. Raw stream deltas never reach the staking logic
//! directly; they are applied here first.

use std::collections::HashMap;

use crate::protocol::SetScore;

/// Lifecycle of a tracked market.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketStatus {
    Upcoming,
    InPlay,
    Ended,
}

/// The single outstanding back bet on a market, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenBet {
    pub selection_id: u64,
    pub size: f64,
    pub price: f64,
    /// Venue order id, once the gateway has confirmed placement.
    pub order_id: Option<String>,
}

/// Tracked state for one match-odds market.
#[derive(Debug, Clone)]
pub struct MarketState {
    pub market_id: String,
    /// Parent sporting event; partitions the journal.
    pub event_id: String,
    pub player_a: String,
    pub player_b: String,
    pub selection_a: u64,
    pub selection_b: u64,
    /// Invariant: stored odds are always finite and > 1.
    pub odds_a: Option<f64>,
    pub odds_b: Option<f64>,
    pub sets: Vec<SetScore>,
    /// One-shot latch; the first-set trigger never re-fires once true.
    pub first_set_ended: bool,
    pub is_open: bool,
    pub status: MarketStatus,
    pub bet: Option<OpenBet>,
}

impl MarketState {
    pub fn new(
        market_id: impl Into<String>,
        event_id: impl Into<String>,
        player_a: impl Into<String>,
        player_b: impl Into<String>,
        selection_a: u64,
        selection_b: u64,
    ) -> Self {
        Self {
            market_id: market_id.into(),
            event_id: event_id.into(),
            player_a: player_a.into(),
            player_b: player_b.into(),
            selection_a,
            selection_b,
            odds_a: None,
            odds_b: None,
            sets: Vec::new(),
            first_set_ended: false,
            is_open: true,
            status: MarketStatus::Upcoming,
            bet: None,
        }
    }

    /// Stores a validated best-back price against the matching side.
    /// Returns false when the selection belongs to neither runner.
    pub fn apply_odds(&mut self, selection_id: u64, price: f64) -> bool {
        if selection_id == self.selection_a {
            self.odds_a = Some(price);
            true
        } else if selection_id == self.selection_b {
            self.odds_b = Some(price);
            true
        } else {
            false
        }
    }

    pub fn odds_for(&self, selection_id: u64) -> Option<f64> {
        if selection_id == self.selection_a {
            self.odds_a
        } else if selection_id == self.selection_b {
            self.odds_b
        } else {
            None
        }
    }

    pub fn player_for(&self, selection_id: u64) -> &str {
        if selection_id == self.selection_a {
            &self.player_a
        } else {
            &self.player_b
        }
    }
}

/// In-memory mapping of market id to match state.
#[derive(Debug, Default)]
pub struct MarketStore {
    markets: HashMap<String, MarketState>,
}

impl MarketStore {
    pub fn insert(&mut self, state: MarketState) {
        self.markets.insert(state.market_id.clone(), state);
    }

    pub fn get(&self, market_id: &str) -> Option<&MarketState> {
        self.markets.get(market_id)
    }

    pub fn get_mut(&mut self, market_id: &str) -> Option<&mut MarketState> {
        self.markets.get_mut(market_id)
    }

    /// Drops a market whose terminal state has been journaled.
    pub fn remove(&mut self, market_id: &str) -> Option<MarketState> {
        self.markets.remove(market_id)
    }

    /// Ids of markets still eligible for tracking, in stable order.
    pub fn open_market_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .markets
            .values()
            .filter(|m| m.is_open)
            .map(|m| m.market_id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }

    /// Markets currently holding an unsettled bet. The staking invariant
    /// keeps this at most 1 across the whole store.
    pub fn open_bet_count(&self) -> usize {
        self.markets.values().filter(|m| m.bet.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market(id: &str) -> MarketState {
        MarketState::new(id, "ev-1", "Alcaraz", "Sinner", 101, 202)
    }

    #[test]
    fn test_apply_odds_maps_by_selection() {
        let mut m = market("1.1");
        assert!(m.apply_odds(101, 1.8));
        assert!(m.apply_odds(202, 2.2));
        assert_eq!(m.odds_a, Some(1.8));
        assert_eq!(m.odds_b, Some(2.2));
    }

    #[test]
    fn test_apply_odds_unknown_selection() {
        let mut m = market("1.1");
        assert!(!m.apply_odds(999, 1.5));
        assert_eq!(m.odds_a, None);
        assert_eq!(m.odds_b, None);
    }

    #[test]
    fn test_odds_for_and_player_for() {
        let mut m = market("1.1");
        m.apply_odds(202, 3.0);
        assert_eq!(m.odds_for(202), Some(3.0));
        assert_eq!(m.odds_for(101), None);
        assert_eq!(m.player_for(101), "Alcaraz");
        assert_eq!(m.player_for(202), "Sinner");
    }

    #[test]
    fn test_open_market_ids_excludes_closed() {
        let mut store = MarketStore::default();
        store.insert(market("1.2"));
        store.insert(market("1.1"));
        let mut excluded = market("1.3");
        excluded.is_open = false;
        store.insert(excluded);

        assert_eq!(store.open_market_ids(), vec!["1.1", "1.2"]);
    }

    #[test]
    fn test_remove_drops_market() {
        let mut store = MarketStore::default();
        store.insert(market("1.1"));
        assert!(store.remove("1.1").is_some());
        assert!(store.get("1.1").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_open_bet_count() {
        let mut store = MarketStore::default();
        let mut with_bet = market("1.1");
        with_bet.bet = Some(OpenBet {
            selection_id: 101,
            size: 10.0,
            price: 2.5,
            order_id: None,
        });
        store.insert(with_bet);
        store.insert(market("1.2"));
        assert_eq!(store.open_bet_count(), 1);
    }
}
