use std::sync::Arc;

use crate::channel::ChannelName;
use crate::context::Context;
use crate::errors::Result;
use crate::event::Event;
use crate::scheduler::PassTrigger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Added,
    Removed,
    AlreadyPresent,
    NotPresent,
}

/// The only place where the list of watched channels changes.
#[derive(Debug, Clone)]
pub struct ChannelSet {
    ctx: Arc<Context>,
    trigger: PassTrigger,
}

impl ChannelSet {
    pub fn new(ctx: Arc<Context>, trigger: PassTrigger) -> Self {
        ChannelSet { ctx, trigger }
    }

    pub fn list(&self) -> Vec<ChannelName> {
        self.ctx.channels()
    }

    /// Watch a new channel and look it up right away.
    pub fn add(&self, raw: &str) -> Result<Membership> {
        let name = ChannelName::parse(raw)?;
        let added = self.ctx.modify(|config, state| {
            if config.contains(&name) {
                return false;
            }
            config.channels.push(name.clone());
            state.track(&name);
            true
        });

        if !added {
            log::info!("{} is already in the config", name);
            return Ok(Membership::AlreadyPresent);
        }
        log::info!("{} added to config", name);
        self.publish_snapshot();
        self.trigger.run_now();
        Ok(Membership::Added)
    }

    /// Stop watching a channel. Its state goes away together with the
    /// config entry, so a later `add` starts from scratch.
    pub fn remove(&self, raw: &str) -> Result<Membership> {
        let name = ChannelName::parse(raw)?;
        let removed = self.ctx.modify(|config, state| {
            if !config.contains(&name) {
                return false;
            }
            config.channels.retain(|c| c != &name);
            state.forget(&name);
            true
        });

        if !removed {
            log::info!("{} is not in the config", name);
            return Ok(Membership::NotPresent);
        }
        log::info!("{} removed from config", name);
        self.publish_snapshot();
        Ok(Membership::Removed)
    }

    fn publish_snapshot(&self) {
        self.ctx
            .events()
            .publish(Event::SnapshotUpdated(self.ctx.state().snapshot()));
    }
}
