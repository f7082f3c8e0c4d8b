use std::fmt::Write;

use anyhow::{Context, Result};
use time::{format_description::well_known::Rfc3339, macros::format_description, OffsetDateTime};
use tokio::sync::broadcast::{self, error::RecvError};
use watch_core::{ChannelName, ChannelState, Event, Snapshot};

/// Turn the change feed into console notifications. Runs until the bus
/// is closed.
pub async fn run(mut rx: broadcast::Receiver<Event>) {
    loop {
        match rx.recv().await {
            Ok(event) => handle(event).await,
            Err(RecvError::Lagged(n)) => log::warn!("Notifier fell behind, {} event(s) lost", n),
            Err(RecvError::Closed) => break,
        }
    }
    log::debug!("Event bus closed, notifier exiting");
}

async fn handle(event: Event) {
    match event {
        Event::SyncingStarted => log::debug!("Syncing..."),
        Event::SyncingEnded => log::debug!("Sync done"),
        Event::SnapshotUpdated(snapshot) => {
            log::debug!("{} channel(s), {} live", snapshot.len(), snapshot.live().len())
        }
        Event::OpenStream { channel, url } => {
            log::info!("Opening {}", url);
            if let Err(err) = open_url(url).await {
                log::error!("Cannot open stream of {}: {:?}", channel, err);
            }
        }
        event => {
            log::debug!("{:?}", event);
            if let Some(text) = notification_text(&event) {
                println!("{}", text);
            }
        }
    }
}

/// Text shown to the user for the events worth a notification.
pub fn notification_text(event: &Event) -> Option<String> {
    let text = match event {
        Event::StreamWentLive { display_name, .. } => format!("{} is live!", display_name),
        Event::StreamWentOffline { display_name, .. } => {
            format!("{} is offline.", display_name)
        }
        Event::StreamInfoUpdatedWhileOffline { display_name, .. } => {
            format!("{} updated their stream info, going live soon?", display_name)
        }
        Event::AuthFailure(reason) => format!(
            "Cannot authenticate with twitch ({}). Check your credentials with `streamwatch setup`.",
            reason
        ),
        Event::UpdateAvailable(version) => {
            format!("streamwatch {} is available.", version)
        }
        _ => return None,
    };
    Some(text)
}

/// Status board: live channels first, most watched on top, then the
/// offline ones alphabetically.
pub fn render_status(snapshot: &Snapshot) -> String {
    if snapshot.is_empty() {
        return "No channel watched, add one with `add <channel>`".to_string();
    }

    let mut out = String::new();
    for (name, state) in snapshot.live() {
        let _ = writeln!(out, "{}", live_line(name, state));
    }
    for (_, state) in snapshot.offline() {
        let status = if state.is_live.is_none() {
            "unknown"
        } else {
            "offline"
        };
        let _ = writeln!(out, "  {} ({})", state.display_name, status);
    }
    out
}

fn live_line(name: &ChannelName, state: &ChannelState) -> String {
    let mut line = format!(
        "● {} - {} viewers",
        state.display_name,
        format_viewers(state.viewer_count)
    );
    if let Some(game) = state.game_name.as_deref().filter(|g| !g.is_empty()) {
        let _ = write!(line, " - {}", game);
    }
    if state.is_mature == Some(true) {
        line.push_str(" [18+]");
    }
    if let Some(since) = state.started_at.as_deref().and_then(live_since) {
        let _ = write!(line, " - live since {}", since);
    }
    let _ = write!(line, " - {}", name.stream_url());
    line
}

/// `2021-03-10T15:04:21Z` becomes `15:04 UTC`.
fn live_since(started_at: &str) -> Option<String> {
    let started = OffsetDateTime::parse(started_at, &Rfc3339).ok()?;
    let hour = started
        .format(format_description!("[hour]:[minute]"))
        .ok()?;
    Some(format!("{} UTC", hour))
}

/// Thousands separators, `12345` becomes `12,345`.
pub fn format_viewers(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Hand the URL to the system browser, on the blocking pool since the
/// opener waits for the browser process to spawn.
async fn open_url(url: String) -> Result<()> {
    tokio::task::spawn_blocking(move || webbrowser::open(&url))
        .await
        .context("Browser task crashed")?
        .context("Cannot open the system browser")
}
