//! Betfair Tennis Bot - Main Entry Point
//!
//! Startup order matters: credentials and login failures are fatal (no
//! recovery is meaningful without a session), as is an empty market list
//! after bounded retries. Everything after that is a long-running loop
//! whose only failure signal is the log stream.

use anyhow::Context;
use tracing::{error, info, warn};

use betfair_tennis_bot::config::{Settings, StakingMode};
use betfair_tennis_bot::connectors::{login, BettingClient, Credentials, MarketSummary, SSO_URL};
use betfair_tennis_bot::engine::{Bot, MessageRouter, StakingEngine};
use betfair_tennis_bot::execution::{LiveGateway, OrderGateway, SimulatedGateway};
use betfair_tennis_bot::journal::EventJournal;
use betfair_tennis_bot::markets::{MarketState, MarketStore};
use betfair_tennis_bot::utils::init_telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Note: no .env file loaded: {e}");
    }

    init_telemetry();

    let settings = Settings::from_env();
    info!(
        mode = ?settings.mode,
        fill_policy = ?settings.fill_policy,
        host = %settings.stream_host,
        "betfair-tennis-bot starting"
    );

    let credentials = Credentials::from_env().context(
        "missing exchange credentials (set BETFAIR_APP_KEY, BETFAIR_USERNAME, BETFAIR_PASSWORD)",
    )?;

    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .context("failed to build HTTP client")?;
    let session = login(&http, SSO_URL, &credentials)
        .await
        .context("exchange login failed")?;

    let betting = BettingClient::new(credentials.app_key.clone(), session.clone());
    let summaries = betting
        .list_open_markets_with_retry(settings.market_fetch_attempts, settings.market_fetch_backoff)
        .await;
    if summaries.is_empty() {
        anyhow::bail!("no open match-odds markets found");
    }
    info!(count = summaries.len(), "tracking markets");

    let mut store = MarketStore::default();
    for summary in &summaries {
        match market_state_from_summary(summary) {
            Some(state) => store.insert(state),
            None => warn!(market_id = %summary.market_id, "skipping market without two runners"),
        }
    }

    let journal = EventJournal::new(settings.journal_dir.clone());
    match settings.mode {
        StakingMode::Test => {
            let staking = StakingEngine::new(&settings, SimulatedGateway::new());
            run(settings, credentials, session, store, staking, journal).await;
        }
        StakingMode::Live => {
            let staking = StakingEngine::new(&settings, LiveGateway::new(betting));
            run(settings, credentials, session, store, staking, journal).await;
        }
    }

    info!("shutting down");
    Ok(())
}

async fn run<G: OrderGateway>(
    settings: Settings,
    credentials: Credentials,
    session: String,
    store: MarketStore,
    staking: StakingEngine<G>,
    journal: EventJournal,
) {
    let mode = settings.mode;
    let router = MessageRouter::new(store, staking, journal, mode);
    let bot = Bot::new(settings, credentials.app_key, session, router);

    tokio::select! {
        _ = bot.run() => error!("bot loop ended unexpectedly"),
        _ = shutdown_signal() => {}
    }
}

/// Builds initial match state from a catalogue entry. The first runner is
/// the home side.
fn market_state_from_summary(summary: &MarketSummary) -> Option<MarketState> {
    let [home, away] = summary.runners.as_slice() else {
        return None;
    };
    let event_id = summary
        .event
        .as_ref()
        .and_then(|e| e.id.clone())
        .unwrap_or_else(|| summary.market_id.clone());

    Some(MarketState::new(
        summary.market_id.clone(),
        event_id,
        home.runner_name.clone(),
        away.runner_name.clone(),
        home.selection_id,
        away.selection_id,
    ))
}

/// Signal handler for graceful shutdown.
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    info!("shutdown signal received");
}
