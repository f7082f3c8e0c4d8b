use tokio::sync::broadcast;

use crate::channel::ChannelName;
use crate::state::Snapshot;

/// Everything the engine tells the outside world about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    SyncingStarted,
    SyncingEnded,
    SnapshotUpdated(Snapshot),
    StreamWentLive {
        channel: ChannelName,
        display_name: String,
    },
    StreamWentOffline {
        channel: ChannelName,
        display_name: String,
    },
    StreamInfoUpdatedWhileOffline {
        channel: ChannelName,
        display_name: String,
    },
    /// The auto-open preference is on and the channel just went live.
    OpenStream { channel: ChannelName, url: String },
    /// Credentials are missing or were rejected, the user must set them up again.
    AuthFailure(String),
    UpdateAvailable(String),
}

/// Fan-out of engine events to independent subscribers (logger, notifier, UI).
/// A subscriber too slow to keep up loses the oldest events.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        EventBus { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: Event) {
        if self.tx.send(event).is_err() {
            log::trace!("No subscriber for engine events");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        EventBus::new(128)
    }
}
