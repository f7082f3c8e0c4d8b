use std::{sync::Arc, time::Duration};

use futures::StreamExt;
use tokio::time::timeout;

use crate::channel::ChannelName;
use crate::context::Context;
use crate::errors::{AuthError, FetchError};
use crate::event::Event;
use crate::provider::Provider;
use crate::state::{Applied, Transition};

const DEFAULT_CONCURRENCY: usize = 5;
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassReport {
    pub checked: usize,
    pub failed: usize,
    pub transitions: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    Completed(PassReport),
    /// No token, no channel was looked up.
    AuthFailed,
    /// Another pass was already running.
    Skipped,
}

/// Polls every configured channel, merges the results into the state map
/// and publishes what changed.
pub struct Reconciler<P> {
    ctx: Arc<Context>,
    provider: P,
    concurrency: usize,
    fetch_timeout: Duration,
    running: tokio::sync::Mutex<()>,
}

impl<P> Reconciler<P>
where
    P: Provider,
{
    pub fn new(ctx: Arc<Context>, provider: P) -> Self {
        Reconciler {
            ctx,
            provider,
            concurrency: DEFAULT_CONCURRENCY,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            running: tokio::sync::Mutex::new(()),
        }
    }

    /// How many channels are looked up at the same time.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Longest wait for the token or for one channel lookup. Past that the
    /// call is abandoned and counts as a failure.
    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.ctx
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Run one pass over all configured channels. Never fails: a channel
    /// that cannot be fetched keeps its previous state, and a token failure
    /// is reported as an event.
    pub async fn run_pass(&self) -> PassOutcome {
        let _running = match self.running.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                log::debug!("A pass is already running, skipping");
                return PassOutcome::Skipped;
            }
        };

        let events = self.ctx.events();
        events.publish(Event::SyncingStarted);
        let outcome = self.reconcile().await;
        events.publish(Event::SyncingEnded);

        match outcome {
            PassOutcome::Completed(report) => log::info!(
                "Checked {} channel(s), {} failed, {} transition(s)",
                report.checked,
                report.failed,
                report.transitions
            ),
            PassOutcome::AuthFailed => log::warn!("Pass aborted, cannot authenticate"),
            PassOutcome::Skipped => {}
        }
        outcome
    }

    async fn reconcile(&self) -> PassOutcome {
        let credentials = match self.ctx.credentials() {
            Some(credentials) => credentials,
            None => return self.auth_failed(AuthError::MissingCredentials),
        };
        let token = timeout(self.fetch_timeout, self.provider.get_token(&credentials));
        let token = match token.await {
            Ok(Ok(token)) => token,
            Ok(Err(err)) => return self.auth_failed(err),
            Err(_) => return self.auth_failed(AuthError::TimedOut(self.fetch_timeout)),
        };

        let channels = self.ctx.channels();
        let auto_open = self.ctx.auto_open();
        let token = &token;

        // buffered keeps the configured order, so events always come out
        // in the same order whatever the response times are
        let results = futures::stream::iter(channels)
            .map(|channel| async move {
                let applied = self.reconcile_channel(&channel, token).await;
                (channel, applied)
            })
            .buffered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        let mut report = PassReport::default();
        for (channel, applied) in results {
            report.checked += 1;
            match applied {
                Err(err) => {
                    report.failed += 1;
                    log::warn!("{}, keeping last known state", err);
                }
                Ok(Applied::Untracked) => {
                    log::debug!("{} was removed during the pass, result dropped", channel);
                }
                Ok(Applied::Updated {
                    transition: None, ..
                }) => {}
                Ok(Applied::Updated {
                    transition: Some(transition),
                    display_name,
                }) => {
                    report.transitions += 1;
                    self.publish_transition(channel, display_name, transition, auto_open);
                }
            }
        }

        self.ctx
            .events()
            .publish(Event::SnapshotUpdated(self.ctx.state().snapshot()));
        PassOutcome::Completed(report)
    }

    async fn reconcile_channel(
        &self,
        channel: &ChannelName,
        token: &P::Token,
    ) -> Result<Applied, FetchError> {
        let info = timeout(
            self.fetch_timeout,
            self.provider.fetch_channel_info(channel, token),
        )
        .await
        .map_err(|elapsed| FetchError::new(channel.clone(), elapsed))??;
        Ok(self.ctx.state().apply(channel, info))
    }

    fn publish_transition(
        &self,
        channel: ChannelName,
        display_name: String,
        transition: Transition,
        auto_open: bool,
    ) {
        let events = self.ctx.events();
        match transition {
            Transition::WentLive => {
                log::info!("{} is live!", channel);
                let url = channel.stream_url();
                events.publish(Event::StreamWentLive {
                    channel: channel.clone(),
                    display_name,
                });
                if auto_open {
                    events.publish(Event::OpenStream { channel, url });
                }
            }
            Transition::WentOffline => {
                log::info!("{} is offline!", channel);
                events.publish(Event::StreamWentOffline {
                    channel,
                    display_name,
                });
            }
            Transition::InfoUpdatedWhileOffline => {
                log::info!("{} updated its stream info while offline", channel);
                events.publish(Event::StreamInfoUpdatedWhileOffline {
                    channel,
                    display_name,
                });
            }
        }
    }

    fn auth_failed(&self, err: AuthError) -> PassOutcome {
        log::error!("Cannot get twitch token: {}", err);
        self.ctx.events().publish(Event::AuthFailure(err.to_string()));
        PassOutcome::AuthFailed
    }
}
