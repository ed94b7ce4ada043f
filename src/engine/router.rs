//! Routes decoded stream messages into state mutations and staking actions.
//!
//! The router owns the market store and staking engine, and is the only
//! code that mutates either in response to stream traffic. It never
//! touches the transport: outbound protocol messages are returned to the
//! caller, which writes them on the active connection.

use tracing::{debug, info, warn};

use crate::config::StakingMode;
use crate::execution::OrderGateway;
use crate::journal::{EventJournal, JournalRecord};
use crate::markets::{MarketStatus, MarketStore};
use crate::protocol::{
    MarketChange, OrderChangeMessage, RequestMessage, ResponseMessage, StatusMessage,
};

use super::staking::StakingEngine;
use super::subscription::SubscriptionManager;

pub struct MessageRouter<G> {
    store: MarketStore,
    subscriptions: SubscriptionManager,
    staking: StakingEngine<G>,
    journal: EventJournal,
    mode: StakingMode,
    authenticated: bool,
}

impl<G: OrderGateway> MessageRouter<G> {
    pub fn new(
        store: MarketStore,
        staking: StakingEngine<G>,
        journal: EventJournal,
        mode: StakingMode,
    ) -> Self {
        Self {
            store,
            subscriptions: SubscriptionManager::new(),
            staking,
            journal,
            mode,
            authenticated: false,
        }
    }

    pub fn store(&self) -> &MarketStore {
        &self.store
    }

    pub fn staking(&self) -> &StakingEngine<G> {
        &self.staking
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Resets connection-scoped state ahead of a reconnect. Market and
    /// staking state survive; subscriptions do not.
    pub fn on_disconnect(&mut self) {
        self.authenticated = false;
        self.subscriptions.reset();
    }

    /// Handles one inbound message; returns protocol messages to send on
    /// the active connection.
    pub async fn handle(&mut self, message: ResponseMessage) -> Vec<RequestMessage> {
        match message {
            ResponseMessage::Connection { connection_id } => {
                info!(
                    connection_id = connection_id.as_deref().unwrap_or("unknown"),
                    "stream connection greeted"
                );
                Vec::new()
            }
            ResponseMessage::Status(status) => self.handle_status(status),
            ResponseMessage::MarketChange(mcm) => {
                for change in mcm.mc {
                    self.handle_market_change(change).await;
                }
                Vec::new()
            }
            ResponseMessage::OrderChange(ocm) => {
                self.handle_order_changes(ocm);
                Vec::new()
            }
        }
    }

    /// The first successful status on a connection is the authentication
    /// result; it triggers the subscription batch. Later ones acknowledge
    /// subscriptions.
    fn handle_status(&mut self, status: StatusMessage) -> Vec<RequestMessage> {
        if status.connection_closed == Some(true) {
            warn!(
                error_code = status.error_code.as_deref().unwrap_or("unknown"),
                "venue is closing the connection"
            );
            return Vec::new();
        }
        if !status.is_success() {
            warn!(
                id = status.id,
                error_code = status.error_code.as_deref().unwrap_or("unknown"),
                error_message = status.error_message.as_deref().unwrap_or(""),
                "stream request failed"
            );
            return Vec::new();
        }

        if !self.authenticated {
            self.authenticated = true;
            info!("stream authenticated");
            return self
                .subscriptions
                .build_subscriptions(&self.store.open_market_ids());
        }

        debug!(id = status.id, "subscription acknowledged");
        Vec::new()
    }

    async fn handle_market_change(&mut self, change: MarketChange) {
        let market_id = change.id.clone();
        let Some(market) = self.store.get_mut(&market_id) else {
            debug!(%market_id, "delta for untracked market");
            return;
        };
        if !market.is_open || market.status == MarketStatus::Ended {
            return;
        }

        let definition = change.market_definition;
        let in_play = definition
            .as_ref()
            .and_then(|d| d.in_play)
            .unwrap_or(market.status == MarketStatus::InPlay);

        // Exclusion rule: an in-play market whose definition carries no
        // score feed can never fire the first-set trigger, so it is
        // dropped from tracking for good.
        if self.mode == StakingMode::Live {
            if let Some(def) = definition.as_ref() {
                if in_play && def.score.is_none() {
                    market.is_open = false;
                    warn!(%market_id, "excluding in-play market without score feed");
                    self.journal.record(
                        &market.event_id,
                        &JournalRecord::MarketExcluded {
                            market_id: market_id.clone(),
                            reason: "in-play without score feed".to_string(),
                        },
                    );
                    return;
                }
            }
        }

        // Odds updates: only finite prices above 1 are ever stored.
        let mut odds_changed = false;
        for rc in &change.rc {
            match rc.best_back_price() {
                Some(price) if price.is_finite() && price > 1.0 => {
                    if market.apply_odds(rc.id, price) {
                        odds_changed = true;
                    } else {
                        warn!(
                            %market_id,
                            selection_id = rc.id,
                            "odds delta for unmatched selection"
                        );
                    }
                }
                Some(price) => {
                    warn!(
                        %market_id,
                        selection_id = rc.id,
                        price,
                        "ignoring unusable back price"
                    );
                }
                None => {}
            }
        }
        if odds_changed {
            self.journal.record(
                &market.event_id,
                &JournalRecord::OddsUpdate {
                    market_id: market_id.clone(),
                    odds_a: market.odds_a,
                    odds_b: market.odds_b,
                },
            );
        }

        if self.mode == StakingMode::Test && in_play {
            self.staking.try_place_test_bet(market, &self.journal).await;
        }

        // Score trigger: fires exactly once, on the delta where the first
        // set completes.
        if self.mode == StakingMode::Live {
            if let Some(score) = definition.as_ref().and_then(|d| d.score.as_ref()) {
                market.sets = score.sets.clone();
                if !market.first_set_ended {
                    if let Some(first) = market.sets.first().copied() {
                        if first.completed {
                            market.first_set_ended = true;
                            info!(
                                %market_id,
                                home = first.home_games,
                                away = first.away_games,
                                "first set complete"
                            );
                            self.staking
                                .try_place_after_first_set(market, first, &self.journal)
                                .await;
                        }
                    }
                }
            }
        }

        let delta_status = definition.as_ref().and_then(|d| d.status.as_deref());
        if delta_status == Some("CLOSED") {
            let winner = definition
                .as_ref()
                .and_then(|d| d.runners.iter().find(|r| r.is_winner()).map(|r| r.id));
            if market.bet.is_some() {
                let won = market.bet.as_ref().map(|b| Some(b.selection_id) == winner)
                    == Some(true);
                self.staking.settle(market, won, None, &self.journal);
            }
            market.status = MarketStatus::Ended;
            market.is_open = false;
            self.journal.record(
                &market.event_id,
                &JournalRecord::MarketClosed {
                    market_id: market_id.clone(),
                    winner_selection_id: winner,
                },
            );
            info!(%market_id, winner_selection_id = ?winner, "market closed");
            // Terminal state is journaled, not retained in memory.
            self.store.remove(&market_id);
            return;
        }

        market.status = if in_play {
            MarketStatus::InPlay
        } else {
            MarketStatus::Upcoming
        };
    }

    /// Live-mode settlement signal: an execution-complete report for the
    /// tracked order carries the realized profit.
    fn handle_order_changes(&mut self, ocm: OrderChangeMessage) {
        if self.mode != StakingMode::Live {
            return;
        }

        for oc in ocm.oc {
            let Some(market) = self.store.get_mut(&oc.id) else {
                continue;
            };
            for report in &oc.order_reports {
                if !report.is_execution_complete() {
                    continue;
                }
                let tracked = market
                    .bet
                    .as_ref()
                    .and_then(|b| b.order_id.as_deref())
                    .map(|id| id == report.id)
                    .unwrap_or(false);
                if !tracked {
                    continue;
                }

                let profit = report.profit.unwrap_or(0.0);
                info!(
                    market_id = %oc.id,
                    order_id = %report.id,
                    profit,
                    "settlement from order stream"
                );
                self.staking
                    .settle(market, profit > 0.0, Some(profit), &self.journal);
            }
        }
    }
}
