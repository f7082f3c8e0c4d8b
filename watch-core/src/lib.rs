pub mod channel;
pub mod channels;
pub mod config;
pub mod context;
pub mod engine;
pub mod errors;
pub mod event;
pub mod provider;
pub mod scheduler;
pub mod state;
pub mod update;

#[cfg(test)]
mod mock;

pub use channel::{ChannelInfo, ChannelName, ChannelState};
pub use channels::{ChannelSet, Membership};
pub use config::{ConfigStore, Configuration, Credentials, JsonFileStore};
pub use context::Context;
pub use engine::{PassOutcome, PassReport, Reconciler};
pub use errors::{Error, Result};
pub use event::{Event, EventBus};
pub use provider::Provider;
pub use scheduler::{PassTrigger, Schedule, Scheduler};
pub use state::Snapshot;
pub use update::{UpdateChecker, UpdateWatch};
