use std::{sync::Arc, time::Duration};

use futures::FutureExt;
use tokio::{
    sync::{watch, Notify},
    task::JoinHandle,
    time::MissedTickBehavior,
};

use crate::engine::{PassOutcome, Reconciler};
use crate::provider::Provider;
use crate::update::UpdateWatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub poll_interval: Duration,
    pub update_interval: Duration,
}

impl Default for Schedule {
    fn default() -> Self {
        Schedule {
            poll_interval: Duration::from_secs(60),
            update_interval: Duration::from_secs(60 * 60),
        }
    }
}

/// Requests an out-of-band pass. Any number of requests made before a
/// pass starts are served by that one pass: requests while idle lead to
/// one immediate pass, requests while a pass runs to one follow-up pass.
#[derive(Debug, Clone, Default)]
pub struct PassTrigger(Arc<Notify>);

impl PassTrigger {
    pub fn run_now(&self) {
        self.0.notify_one();
    }
}

/// Owns the polling timer and the update-check timer.
pub struct Scheduler {
    trigger: PassTrigger,
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl Scheduler {
    /// Spawn both timers. The first pass runs right away, then every
    /// `poll_interval` or whenever the trigger fires.
    pub fn start<P>(
        reconciler: Arc<Reconciler<P>>,
        updates: Option<UpdateWatch>,
        schedule: Schedule,
        trigger: PassTrigger,
    ) -> Self
    where
        P: Provider + 'static,
    {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let mut tasks = Vec::with_capacity(2);

        if let Some(updates) = updates {
            let events = reconciler.context().events().clone();
            tasks.push(tokio::spawn(update_loop(
                updates,
                events,
                schedule.update_interval,
                shutdown_rx.clone(),
            )));
        }
        tasks.push(tokio::spawn(poll_loop(
            reconciler,
            schedule.poll_interval,
            trigger.clone(),
            shutdown_rx,
        )));

        log::info!(
            "Scheduler started, polling every {}s",
            schedule.poll_interval.as_secs()
        );
        Scheduler {
            trigger,
            shutdown,
            tasks,
        }
    }

    pub fn trigger(&self) -> PassTrigger {
        self.trigger.clone()
    }

    pub fn run_now(&self) {
        self.trigger.run_now();
    }

    /// Cancel both timers. A pass already in flight is allowed to finish.
    pub async fn stop(self) {
        if self.shutdown.send(true).is_err() {
            log::debug!("Scheduler tasks already gone");
        }
        for task in self.tasks {
            if let Err(err) = task.await {
                log::error!("Scheduler task crashed: {}", err);
            }
        }
        log::info!("Scheduler stopped");
    }
}

async fn poll_loop<P>(
    reconciler: Arc<Reconciler<P>>,
    period: Duration,
    trigger: PassTrigger,
    mut shutdown: watch::Receiver<bool>,
) where
    P: Provider,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {}
            _ = trigger.0.notified() => log::debug!("Pass requested"),
        }
        // the pass about to start also serves a request stored meanwhile
        if trigger.0.notified().now_or_never().is_some() {
            log::debug!("Pending pass request merged");
        }
        if let PassOutcome::Skipped = reconciler.run_pass().await {
            log::warn!("Pass skipped, the previous one is still running");
        }
    }
}

async fn update_loop(
    updates: UpdateWatch,
    events: crate::event::EventBus,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = ticker.tick() => updates.check(&events).await,
        }
    }
}
