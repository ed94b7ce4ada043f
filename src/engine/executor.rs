//! Top-level bot loop: connection lifecycle and message dispatch.
//!
//! One task owns the connection, the router, and everything behind it.
//! The lifecycle runs `Disconnected -> Connecting -> Authenticating ->
//! Subscribed`; any transport error or close drops back to disconnected
//! and schedules a reconnect after a fixed delay. Subscriptions never
//! survive a reconnect, and neither does a partial frame: the decoder is
//! owned by the per-connection stream handle.

use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::connectors::{ExchangeStream, StreamError};
use crate::execution::OrderGateway;
use crate::protocol::RequestMessage;

use super::router::MessageRouter;

pub struct Bot<G> {
    settings: Settings,
    app_key: String,
    session: String,
    router: MessageRouter<G>,
}

impl<G: OrderGateway> Bot<G> {
    pub fn new(
        settings: Settings,
        app_key: String,
        session: String,
        router: MessageRouter<G>,
    ) -> Self {
        Self {
            settings,
            app_key,
            session,
            router,
        }
    }

    /// Runs the bot until the task is dropped. Transport failures are
    /// never fatal; every one leads back here and into the next attempt.
    pub async fn run(mut self) {
        loop {
            match self.run_connection().await {
                Ok(()) => warn!("stream closed by server"),
                Err(e) => error!(error = %e, "stream connection lost"),
            }

            self.router.on_disconnect();
            info!(
                delay_secs = self.settings.reconnect_delay.as_secs(),
                "reconnecting after delay"
            );
            tokio::time::sleep(self.settings.reconnect_delay).await;
        }
    }

    /// One connection's lifetime: connect, authenticate, then dispatch
    /// frames in arrival order until the transport fails or closes.
    async fn run_connection(&mut self) -> Result<(), StreamError> {
        let mut stream =
            ExchangeStream::connect(&self.settings.stream_host, self.settings.stream_port).await?;

        // Authentication is the first outbound action on a new transport;
        // no subscription is attempted before it succeeds.
        stream
            .send(&RequestMessage::Authentication {
                app_key: self.app_key.clone(),
                session: self.session.clone(),
            })
            .await?;

        let mut status_interval = tokio::time::interval(self.settings.status_interval);
        status_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        status_interval.tick().await;

        loop {
            tokio::select! {
                message = stream.next_message() => {
                    match message? {
                        Some(message) => {
                            let outbound = self.router.handle(message).await;
                            for request in outbound {
                                stream.send(&request).await?;
                            }
                        }
                        None => return Ok(()),
                    }
                }
                _ = status_interval.tick() => {
                    self.report_status();
                }
            }
        }
    }

    fn report_status(&self) {
        let staking = self.router.staking().state();
        info!(
            markets = self.router.store().len(),
            authenticated = self.router.is_authenticated(),
            balance = staking.balance,
            multiplier = staking.multiplier,
            open_bet = staking.has_open_bet,
            "status report"
        );
    }
}

impl<G> std::fmt::Debug for Bot<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bot")
            .field("stream_host", &self.settings.stream_host)
            .field("app_key", &"[REDACTED]")
            .finish()
    }
}
