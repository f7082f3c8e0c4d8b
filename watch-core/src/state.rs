use std::{collections::BTreeMap, sync::Arc};

use itertools::Itertools;
use parking_lot::Mutex;
use serde::Serialize;

use crate::channel::{ChannelInfo, ChannelName, ChannelState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    WentLive,
    WentOffline,
    /// Game or title changed while the channel stayed offline,
    /// often a sign that the stream is about to start.
    InfoUpdatedWhileOffline,
}

/// Compare freshly fetched info with the previous state of a channel.
/// At most one transition per channel and per pass.
pub fn classify(previous: &ChannelState, next: &ChannelInfo) -> Option<Transition> {
    let was_live = previous.is_live();

    if next.is_live && !was_live {
        return Some(Transition::WentLive);
    }
    if !next.is_live && was_live {
        return Some(Transition::WentOffline);
    }

    // both fields unknown on the first observation, never notify then
    let seen_before = previous.game_name.is_some() && previous.stream_title.is_some();
    let info_changed = differs(&previous.game_name, &next.game_name)
        || differs(&previous.stream_title, &next.stream_title);
    if seen_before && info_changed && !next.is_live {
        Some(Transition::InfoUpdatedWhileOffline)
    } else {
        None
    }
}

fn differs(previous: &Option<String>, next: &Option<String>) -> bool {
    matches!((previous, next), (Some(p), Some(n)) if p != n)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// The channel is not (or no longer) watched, nothing was written.
    Untracked,
    Updated {
        transition: Option<Transition>,
        display_name: String,
    },
}

/// Last known state of every watched channel.
/// Each write locks the whole map for the duration of a single channel merge,
/// so a channel is always either fully updated or untouched.
#[derive(Debug, Clone, Default)]
pub struct StateMap {
    channels: Arc<Mutex<BTreeMap<ChannelName, ChannelState>>>,
}

impl StateMap {
    /// Start tracking a channel with an empty state.
    /// Returns false if it was already tracked.
    pub fn track(&self, name: &ChannelName) -> bool {
        let mut channels = self.channels.lock();
        if channels.contains_key(name) {
            return false;
        }
        channels.insert(name.clone(), ChannelState::new(name));
        true
    }

    pub fn forget(&self, name: &ChannelName) -> Option<ChannelState> {
        self.channels.lock().remove(name)
    }

    pub fn get(&self, name: &ChannelName) -> Option<ChannelState> {
        self.channels.lock().get(name).cloned()
    }

    pub fn apply(&self, name: &ChannelName, info: ChannelInfo) -> Applied {
        let mut channels = self.channels.lock();
        let state = match channels.get_mut(name) {
            None => return Applied::Untracked,
            Some(state) => state,
        };

        let transition = classify(state, &info);
        state.merge(info);
        Applied::Updated {
            transition,
            display_name: state.display_name.clone(),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot(self.channels.lock().clone())
    }
}

/// Complete copy of the state map, published after every pass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<ChannelName, ChannelState>);

impl Snapshot {
    pub fn get(&self, name: &ChannelName) -> Option<&ChannelState> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ChannelName, &ChannelState)> {
        self.0.iter()
    }

    /// Live channels, most watched first.
    pub fn live(&self) -> Vec<(&ChannelName, &ChannelState)> {
        self.0
            .iter()
            .filter(|(_, s)| s.is_live())
            .sorted_by(|(a_name, a), (b_name, b)| {
                b.viewer_count
                    .cmp(&a.viewer_count)
                    .then_with(|| a_name.cmp(b_name))
            })
            .collect()
    }

    /// Offline channels (including never fetched ones), by display name.
    pub fn offline(&self) -> Vec<(&ChannelName, &ChannelState)> {
        self.0
            .iter()
            .filter(|(_, s)| !s.is_live())
            .sorted_by_key(|(_, s)| s.display_name.to_lowercase())
            .collect()
    }
}
