//! Runtime settings loaded from the environment.
//!
//! Every knob has a default suitable for simulated runs; production
//! deployments override via `.env` or the process environment. Values that
//! fail to parse fall back to the default with a warning rather than
//! aborting startup.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// Which staking trigger drives the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StakingMode {
    /// Simulated ledger; bets are triggered by odds hitting a target value.
    Test,
    /// Real funds; bets are triggered by the first-set score condition.
    Live,
}

/// How orders are priced at placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillPolicy {
    /// Place at the observed current price.
    Direct,
    /// Place at the maximum price for a guaranteed fill, then trim the
    /// unmatched remainder back to the observed price.
    AggressiveFill,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub stream_host: String,
    pub stream_port: u16,
    pub mode: StakingMode,
    pub fill_policy: FillPolicy,
    /// Fraction of balance staked per bet under the percentage policy.
    pub staking_percentage: f64,
    pub commission_rate: f64,
    pub initial_balance: f64,
    /// Venue minimum stake; the guaranteed-fill policy bets exactly this.
    pub min_stake: f64,
    pub reconnect_delay: Duration,
    pub status_interval: Duration,
    pub market_fetch_attempts: u32,
    pub market_fetch_backoff: Duration,
    pub test_odds_target: f64,
    pub test_odds_tolerance: f64,
    pub journal_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            stream_host: "stream-api.betfair.com".to_string(),
            stream_port: 443,
            mode: StakingMode::Test,
            fill_policy: FillPolicy::Direct,
            staking_percentage: 0.10,
            commission_rate: 0.05,
            initial_balance: 1000.0,
            min_stake: 2.0,
            reconnect_delay: Duration::from_secs(20),
            status_interval: Duration::from_secs(60),
            market_fetch_attempts: 5,
            market_fetch_backoff: Duration::from_secs(10),
            test_odds_target: 2.0,
            test_odds_tolerance: 0.05,
            journal_dir: PathBuf::from("logs"),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            stream_host: env_or("BOT_STREAM_HOST", defaults.stream_host),
            stream_port: env_parse("BOT_STREAM_PORT", defaults.stream_port),
            mode: std::env::var("BOT_STAKING_MODE")
                .ok()
                .and_then(|v| parse_mode(&v))
                .unwrap_or(defaults.mode),
            fill_policy: std::env::var("BOT_FILL_POLICY")
                .ok()
                .and_then(|v| parse_fill_policy(&v))
                .unwrap_or(defaults.fill_policy),
            staking_percentage: env_parse("BOT_STAKING_PERCENTAGE", defaults.staking_percentage),
            commission_rate: env_parse("BOT_COMMISSION_RATE", defaults.commission_rate),
            initial_balance: env_parse("BOT_INITIAL_BALANCE", defaults.initial_balance),
            min_stake: env_parse("BOT_MIN_STAKE", defaults.min_stake),
            reconnect_delay: Duration::from_secs(env_parse(
                "BOT_RECONNECT_DELAY_SECS",
                defaults.reconnect_delay.as_secs(),
            )),
            status_interval: Duration::from_secs(env_parse(
                "BOT_STATUS_INTERVAL_SECS",
                defaults.status_interval.as_secs(),
            )),
            market_fetch_attempts: env_parse(
                "BOT_MARKET_FETCH_ATTEMPTS",
                defaults.market_fetch_attempts,
            ),
            market_fetch_backoff: Duration::from_secs(env_parse(
                "BOT_MARKET_FETCH_BACKOFF_SECS",
                defaults.market_fetch_backoff.as_secs(),
            )),
            test_odds_target: env_parse("BOT_TEST_ODDS_TARGET", defaults.test_odds_target),
            test_odds_tolerance: env_parse("BOT_TEST_ODDS_TOLERANCE", defaults.test_odds_tolerance),
            journal_dir: PathBuf::from(env_or(
                "BOT_JOURNAL_DIR",
                defaults.journal_dir.to_string_lossy().into_owned(),
            )),
        }
    }
}

fn parse_mode(value: &str) -> Option<StakingMode> {
    match value.to_ascii_lowercase().as_str() {
        "test" => Some(StakingMode::Test),
        "live" => Some(StakingMode::Live),
        _ => {
            warn!(value, "unknown staking mode");
            None
        }
    }
}

fn parse_fill_policy(value: &str) -> Option<FillPolicy> {
    match value.to_ascii_lowercase().as_str() {
        "direct" => Some(FillPolicy::Direct),
        "aggressive" => Some(FillPolicy::AggressiveFill),
        _ => {
            warn!(value, "unknown fill policy");
            None
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_parse<T: FromStr + Copy>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "unparseable setting, using default");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.stream_port, 443);
        assert_eq!(settings.mode, StakingMode::Test);
        assert_eq!(settings.fill_policy, FillPolicy::Direct);
        assert_eq!(settings.staking_percentage, 0.10);
        assert_eq!(settings.commission_rate, 0.05);
        assert_eq!(settings.reconnect_delay, Duration::from_secs(20));
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("test"), Some(StakingMode::Test));
        assert_eq!(parse_mode("LIVE"), Some(StakingMode::Live));
        assert_eq!(parse_mode("paper"), None);
    }

    #[test]
    fn test_parse_fill_policy() {
        assert_eq!(parse_fill_policy("direct"), Some(FillPolicy::Direct));
        assert_eq!(
            parse_fill_policy("Aggressive"),
            Some(FillPolicy::AggressiveFill)
        );
        assert_eq!(parse_fill_policy("limit"), None);
    }
}
