//! Martingale staking engine.
//!
//! Owns the process-wide staking state: the simulated-or-fixed balance,
//! the loss multiplier, and the one-bet-at-a-time flag. Staking is
//! strictly sequential across the whole store, not per market; the flag
//! is committed synchronously at decision time, before the first gateway
//! await, so a frame processed during the exchange can never trigger a
//! second placement.

use tracing::{debug, error, info, warn};

use crate::config::{FillPolicy, Settings, StakingMode};
use crate::execution::{GatewayError, OrderGateway, PlacedOrder};
use crate::journal::{EventJournal, JournalRecord};
use crate::markets::{MarketState, OpenBet};
use crate::protocol::SetScore;

/// Top of the venue's odds ladder; a back order here matches any
/// available opposing offer immediately.
const MAX_PRICE: f64 = 1000.0;

/// Remainder left on the order after an aggressive-fill trim.
const RESIDUAL_SIZE: f64 = 0.01;

/// Minimum odds on the set loser for the first-set trigger to fire.
const MIN_UNDERDOG_ODDS: f64 = 2.0;

/// Maximum game difference in the first set for the trigger to fire.
const MAX_GAME_DIFF: u32 = 2;

/// Process-wide staking state, mutated only by the engine.
#[derive(Debug, Clone)]
pub struct StakingState {
    pub balance: f64,
    /// Martingale multiplier: doubles after a settled loss, resets to 1
    /// after a settled win. Always a power of two.
    pub multiplier: u32,
    pub has_open_bet: bool,
    pub test_bet_placed: bool,
}

pub struct StakingEngine<G> {
    state: StakingState,
    mode: StakingMode,
    fill_policy: FillPolicy,
    staking_percentage: f64,
    commission_rate: f64,
    min_stake: f64,
    test_odds_target: f64,
    test_odds_tolerance: f64,
    gateway: G,
}

impl<G: OrderGateway> StakingEngine<G> {
    pub fn new(settings: &Settings, gateway: G) -> Self {
        Self {
            state: StakingState {
                balance: settings.initial_balance,
                multiplier: 1,
                has_open_bet: false,
                test_bet_placed: false,
            },
            mode: settings.mode,
            fill_policy: settings.fill_policy,
            staking_percentage: settings.staking_percentage,
            commission_rate: settings.commission_rate,
            min_stake: settings.min_stake,
            test_odds_target: settings.test_odds_target,
            test_odds_tolerance: settings.test_odds_tolerance,
            gateway,
        }
    }

    pub fn state(&self) -> &StakingState {
        &self.state
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn has_open_bet(&self) -> bool {
        self.state.has_open_bet
    }

    /// Stake for the next bet under the configured sizing policy.
    fn stake_size(&self) -> f64 {
        match self.fill_policy {
            FillPolicy::Direct => round2(
                self.staking_percentage * self.state.balance * f64::from(self.state.multiplier),
            ),
            FillPolicy::AggressiveFill => self.min_stake,
        }
    }

    /// First-set staking condition: the set loser is backed when the set
    /// was close (game difference at most 2) and its odds are at least 2.
    pub async fn try_place_after_first_set(
        &mut self,
        market: &mut MarketState,
        set: SetScore,
        journal: &EventJournal,
    ) -> bool {
        let diff = set.home_games.abs_diff(set.away_games);
        if diff > MAX_GAME_DIFF {
            debug!(
                market_id = %market.market_id,
                diff, "first set not close enough, no bet"
            );
            return false;
        }

        let loser = if set.home_games > set.away_games {
            market.selection_b
        } else {
            market.selection_a
        };
        let Some(odds) = market.odds_for(loser) else {
            warn!(market_id = %market.market_id, selection_id = loser, "no odds for set loser");
            return false;
        };
        if odds < MIN_UNDERDOG_ODDS {
            debug!(market_id = %market.market_id, odds, "set loser odds below threshold");
            return false;
        }
        if self.state.has_open_bet {
            debug!(market_id = %market.market_id, "bet already open elsewhere");
            return false;
        }

        self.place_bet(market, loser, odds, journal).await
    }

    /// Test-cycle trigger: bets on whichever side's odds sit within
    /// tolerance of the target, side A checked before side B. At most one
    /// test bet per cycle.
    pub async fn try_place_test_bet(
        &mut self,
        market: &mut MarketState,
        journal: &EventJournal,
    ) -> bool {
        if self.state.test_bet_placed || self.state.has_open_bet {
            return false;
        }

        let sides = [
            (market.selection_a, market.odds_a),
            (market.selection_b, market.odds_b),
        ];
        let hit = sides.iter().find_map(|&(selection, odds)| {
            odds.filter(|o| (o - self.test_odds_target).abs() <= self.test_odds_tolerance)
                .map(|o| (selection, o))
        });
        let Some((selection, odds)) = hit else {
            return false;
        };

        if self.place_bet(market, selection, odds, journal).await {
            self.state.test_bet_placed = true;
            true
        } else {
            false
        }
    }

    async fn place_bet(
        &mut self,
        market: &mut MarketState,
        selection_id: u64,
        price: f64,
        journal: &EventJournal,
    ) -> bool {
        let size = self.stake_size();
        if size <= 0.0 {
            warn!(market_id = %market.market_id, "computed stake is zero, skipping bet");
            return false;
        }

        // Commit the intent before the first await: any frame processed
        // while the gateway call is in flight must already see the open
        // bet, or two triggers could both decide to place.
        self.state.has_open_bet = true;
        if self.mode == StakingMode::Test {
            self.state.balance -= size;
        }
        market.bet = Some(OpenBet {
            selection_id,
            size,
            price,
            order_id: None,
        });

        let result = match self.fill_policy {
            FillPolicy::Direct => {
                self.gateway
                    .place_order(&market.market_id, selection_id, size, price)
                    .await
            }
            FillPolicy::AggressiveFill => {
                self.place_aggressive(
                    &market.market_id,
                    &market.event_id,
                    selection_id,
                    size,
                    price,
                    journal,
                )
                .await
            }
        };

        match result {
            Ok(placed) => {
                if let Some(bet) = market.bet.as_mut() {
                    bet.order_id = Some(placed.order_id.clone());
                }
                journal.record(
                    &market.event_id,
                    &JournalRecord::BetPlaced {
                        market_id: market.market_id.clone(),
                        selection_id,
                        player: market.player_for(selection_id).to_string(),
                        size,
                        price,
                    },
                );
                info!(
                    market_id = %market.market_id,
                    player = market.player_for(selection_id),
                    size,
                    price,
                    multiplier = self.state.multiplier,
                    "bet placed"
                );
                true
            }
            Err(e) => {
                error!(
                    market_id = %market.market_id,
                    error = %e,
                    "placement failed, releasing bet intent"
                );
                market.bet = None;
                self.state.has_open_bet = false;
                if self.mode == StakingMode::Test {
                    self.state.balance += size;
                }
                false
            }
        }
    }

    /// Places at the top of the ladder for a guaranteed immediate match,
    /// then trims the unmatched remainder to a negligible residual at the
    /// observed price, capping exposure.
    async fn place_aggressive(
        &mut self,
        market_id: &str,
        event_id: &str,
        selection_id: u64,
        size: f64,
        observed_price: f64,
        journal: &EventJournal,
    ) -> Result<PlacedOrder, GatewayError> {
        let placed = self
            .gateway
            .place_order(market_id, selection_id, size, MAX_PRICE)
            .await?;

        match self
            .gateway
            .replace_order(market_id, &placed.order_id, RESIDUAL_SIZE, observed_price)
            .await
        {
            Ok(()) => journal.record(
                event_id,
                &JournalRecord::BetEdited {
                    market_id: market_id.to_string(),
                    order_id: placed.order_id.clone(),
                    new_size: RESIDUAL_SIZE,
                    new_price: observed_price,
                },
            ),
            Err(e) => {
                warn!(order_id = %placed.order_id, error = %e, "failed to trim unmatched remainder")
            }
        }

        Ok(PlacedOrder {
            order_id: placed.order_id,
            size,
            price: observed_price,
        })
    }

    /// Settles the outstanding bet on `market`.
    ///
    /// `reported_profit` comes from the live order stream when available;
    /// otherwise profit is computed from the stored bet. Settlement is
    /// synchronous — no suspension between reading and clearing the flags.
    pub fn settle(
        &mut self,
        market: &mut MarketState,
        won: bool,
        reported_profit: Option<f64>,
        journal: &EventJournal,
    ) {
        let Some(bet) = market.bet.take() else {
            return;
        };

        let profit = reported_profit.unwrap_or_else(|| {
            if won {
                (bet.price - 1.0) * bet.size * (1.0 - self.commission_rate)
            } else {
                -bet.size
            }
        });

        if self.mode == StakingMode::Test && won {
            // The stake was debited at placement; a win returns it with profit.
            self.state.balance += profit + bet.size;
        }
        if won {
            self.state.multiplier = 1;
        } else {
            self.state.multiplier = self.state.multiplier.saturating_mul(2);
        }
        self.state.has_open_bet = false;
        self.state.test_bet_placed = false;

        let balance = (self.mode == StakingMode::Test).then_some(self.state.balance);
        journal.record(
            &market.event_id,
            &JournalRecord::BetOutcome {
                market_id: market.market_id.clone(),
                won,
                profit,
                balance,
                multiplier: self.state.multiplier,
            },
        );
        info!(
            market_id = %market.market_id,
            won,
            profit,
            multiplier = self.state.multiplier,
            "bet settled"
        );
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
