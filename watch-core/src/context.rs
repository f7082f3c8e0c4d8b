use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::channel::ChannelName;
use crate::config::{ConfigStore, Configuration, Credentials, Obfuscated};
use crate::errors::ConfigError;
use crate::event::EventBus;
use crate::state::StateMap;

/// Process wide state: the configuration, the last known state of each
/// channel and the event bus. Created once at startup from the persisted
/// configuration and flushed at shutdown.
pub struct Context {
    config: RwLock<Configuration>,
    /// bumped on every change, under the config write lock
    revision: AtomicU64,
    /// revision last handed to the store, also serializes the saves
    persisted: Mutex<u64>,
    state: StateMap,
    events: EventBus,
    store: Box<dyn ConfigStore>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("store", &"<ConfigStore>")
            .finish()
    }
}

impl Context {
    pub fn new(config: Configuration, store: Box<dyn ConfigStore>, events: EventBus) -> Self {
        let state = StateMap::default();
        for channel in &config.channels {
            state.track(channel);
        }
        Context {
            config: RwLock::new(config),
            revision: AtomicU64::new(0),
            persisted: Mutex::new(0),
            state,
            events,
            store,
        }
    }

    pub fn config(&self) -> Configuration {
        self.config.read().clone()
    }

    pub fn channels(&self) -> Vec<ChannelName> {
        self.config.read().channels.clone()
    }

    pub fn credentials(&self) -> Option<Credentials> {
        self.config.read().credentials()
    }

    pub fn auto_open(&self) -> bool {
        self.config.read().auto_open_streams
    }

    pub fn state(&self) -> &StateMap {
        &self.state
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn set_auto_open(&self, enabled: bool) {
        self.modify(|config, _| {
            let changed = config.auto_open_streams != enabled;
            config.auto_open_streams = enabled;
            changed
        });
        log::info!(
            "Opening streams when they go live is {}",
            if enabled { "enabled" } else { "disabled" }
        );
    }

    /// Store new application credentials. The caller is expected to
    /// trigger a pass afterwards.
    pub fn save_credentials(&self, client_id: String, client_secret: String) {
        self.modify(|config, _| {
            config.client_id = Some(client_id);
            config.client_secret = Some(Obfuscated(client_secret));
            config.initialized = true;
            true
        });
        log::info!("Twitch credentials saved");
    }

    /// Write the configuration as it is now.
    pub fn flush(&self) -> Result<(), ConfigError> {
        let (revision, config) = {
            let config = self.config.read();
            (self.revision.load(Ordering::SeqCst), config.clone())
        };
        let mut persisted = self.persisted.lock();
        self.store.save(&config)?;
        *persisted = (*persisted).max(revision);
        Ok(())
    }

    /// Apply `f` to the configuration and persist the result if `f` reports
    /// a change. The store is called with a copy, outside the config lock,
    /// so readers never wait on the disk. A copy older than one already
    /// saved is dropped. A failed save is logged and the in-memory change
    /// is kept, the next successful save catches up.
    pub(crate) fn modify<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut Configuration, &StateMap) -> bool,
    {
        let (revision, config) = {
            let mut config = self.config.write();
            if !f(&mut config, &self.state) {
                return false;
            }
            let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
            (revision, config.clone())
        };
        self.persist(revision, &config);
        true
    }

    fn persist(&self, revision: u64, config: &Configuration) {
        let mut persisted = self.persisted.lock();
        if *persisted >= revision {
            log::debug!("Config revision {} superseded, not saving it", revision);
            return;
        }
        match self.store.save(config) {
            Ok(()) => *persisted = revision,
            Err(err) => log::error!("Failed to save config: {:?}", err),
        }
    }
}
