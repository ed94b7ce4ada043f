//! Engine layer: message routing, subscriptions, staking, and the bot loop.
//!
//! Everything here runs in a single execution context. Stream frames are
//! processed strictly in arrival order; the staking engine's intent flag
//! is the only guard needed against re-entrant placement.

mod executor;
mod router;
mod staking;
mod subscription;

pub use executor::Bot;
pub use router::MessageRouter;
pub use staking::{StakingEngine, StakingState};
pub use subscription::{SubscriptionManager, MARKET_BATCH_SIZE};
