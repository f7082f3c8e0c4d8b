//! Scripted provider and in-memory store used by the tests of this crate.
use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::channel::{ChannelInfo, ChannelName};
use crate::config::{ConfigStore, Configuration, Credentials, Obfuscated};
use crate::context::Context;
use crate::errors::{AuthError, ConfigError, FetchError};
use crate::event::{Event, EventBus};
use crate::provider::Provider;

#[derive(Debug, Clone, Copy)]
enum Latency {
    Delay(Duration),
    Hang,
}

#[derive(Debug, Default)]
pub struct ScriptedProvider {
    infos: Mutex<HashMap<String, ChannelInfo>>,
    latencies: Mutex<HashMap<String, Latency>>,
    reject_tokens: AtomicBool,
    hang_tokens: AtomicBool,
    pub token_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn set(&self, channel: &str, info: ChannelInfo) {
        self.infos.lock().insert(channel.to_string(), info);
    }

    /// Lookups for this channel fail until `set` is called again.
    pub fn fail(&self, channel: &str) {
        self.infos.lock().remove(channel);
    }

    pub fn reject_tokens(&self, reject: bool) {
        self.reject_tokens.store(reject, Ordering::SeqCst);
    }

    /// The token exchange never answers.
    pub fn hang_tokens(&self, hang: bool) {
        self.hang_tokens.store(hang, Ordering::SeqCst);
    }

    /// Lookups for this channel answer after `delay`.
    pub fn set_delay(&self, channel: &str, delay: Duration) {
        self.latencies
            .lock()
            .insert(channel.to_string(), Latency::Delay(delay));
    }

    /// Lookups for this channel never answer.
    pub fn hang(&self, channel: &str) {
        self.latencies.lock().insert(channel.to_string(), Latency::Hang);
    }

    /// Back to answering right away.
    pub fn respond(&self, channel: &str) {
        self.latencies.lock().remove(channel);
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    type Token = ();

    async fn get_token(&self, _credentials: &Credentials) -> Result<(), AuthError> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang_tokens.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.reject_tokens.load(Ordering::SeqCst) {
            return Err(AuthError::Rejected("invalid client".to_string()));
        }
        Ok(())
    }

    async fn fetch_channel_info(
        &self,
        channel: &ChannelName,
        _token: &(),
    ) -> Result<ChannelInfo, FetchError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let latency = self.latencies.lock().get(channel.as_str()).copied();
        match latency {
            Some(Latency::Delay(delay)) => tokio::time::sleep(delay).await,
            Some(Latency::Hang) => std::future::pending::<()>().await,
            None => tokio::task::yield_now().await,
        }
        self.infos
            .lock()
            .get(channel.as_str())
            .cloned()
            .ok_or_else(|| FetchError::new(channel.clone(), "connection reset"))
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    pub saved: Arc<Mutex<Option<Configuration>>>,
    pub broken: Arc<AtomicBool>,
}

impl ConfigStore for MemoryStore {
    fn load(&self) -> Result<Option<Configuration>, ConfigError> {
        Ok(self.saved.lock().clone())
    }

    fn save(&self, config: &Configuration) -> Result<(), ConfigError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(ConfigError::Io {
                path: "memory".into(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            });
        }
        *self.saved.lock() = Some(config.clone());
        Ok(())
    }
}

pub fn channel(name: &str) -> ChannelName {
    ChannelName::parse(name).unwrap()
}

pub fn context(channels: &[&str]) -> (Arc<Context>, MemoryStore) {
    let store = MemoryStore::default();
    let config = Configuration {
        client_id: Some("client".to_string()),
        client_secret: Some(Obfuscated("secret".to_string())),
        channels: channels.iter().map(|c| channel(c)).collect(),
        initialized: true,
        ..Configuration::default()
    };
    let ctx = Context::new(config, Box::new(store.clone()), EventBus::new(256));
    (Arc::new(ctx), store)
}

pub fn live(display_name: &str, viewers: u64, game: &str) -> ChannelInfo {
    ChannelInfo {
        display_name: display_name.to_string(),
        is_live: true,
        viewer_count: viewers,
        game_name: Some(game.to_string()),
        stream_title: Some("live now".to_string()),
        ..ChannelInfo::default()
    }
}

pub fn offline(display_name: &str) -> ChannelInfo {
    ChannelInfo {
        display_name: display_name.to_string(),
        is_live: false,
        game_name: Some("Just Chatting".to_string()),
        stream_title: Some("live now".to_string()),
        ..ChannelInfo::default()
    }
}

/// Everything published so far on this receiver.
pub fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Events minus the pass bookkeeping, i.e. what a notifier would act on.
pub fn notable(events: Vec<Event>) -> Vec<Event> {
    events
        .into_iter()
        .filter(|e| {
            !matches!(
                e,
                Event::SyncingStarted | Event::SyncingEnded | Event::SnapshotUpdated(_)
            )
        })
        .collect()
}
