use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use watch_core::{ChannelSet, Context, Membership, PassTrigger};

use crate::commands::{self, Command};
use crate::notifier;

/// Read commands from stdin until `quit`. When stdin is closed (running
/// as a service), waits forever and leaves shutdown to the signal handler.
pub async fn run(ctx: Arc<Context>, channels: ChannelSet, trigger: PassTrigger) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", commands::USAGE);

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let cmd = match commands::parse_command(&line) {
            Ok(cmd) => cmd,
            Err(err) => {
                log::debug!("{}", err);
                println!("{}", commands::USAGE);
                continue;
            }
        };
        if cmd == Command::Quit {
            return Ok(());
        }
        println!("{}", execute(&ctx, &channels, &trigger, cmd));
    }

    log::debug!("stdin closed, console disabled");
    std::future::pending::<()>().await;
    Ok(())
}

/// Apply one command and describe the outcome.
pub fn execute(ctx: &Context, channels: &ChannelSet, trigger: &PassTrigger, cmd: Command) -> String {
    match cmd {
        Command::Add(raw) => match channels.add(raw) {
            Ok(Membership::Added) => format!("Now watching {}", raw.to_lowercase()),
            Ok(_) => format!("{} is already watched", raw.to_lowercase()),
            Err(err) => err.to_string(),
        },
        Command::Remove(raw) => match channels.remove(raw) {
            Ok(Membership::Removed) => format!("Stopped watching {}", raw.to_lowercase()),
            Ok(_) => format!("{} was not watched", raw.to_lowercase()),
            Err(err) => err.to_string(),
        },
        Command::Refresh => {
            trigger.run_now();
            "Refreshing...".to_string()
        }
        Command::AutoOpen(enabled) => {
            ctx.set_auto_open(enabled);
            format!(
                "Streams will {}open when they go live",
                if enabled { "" } else { "not " }
            )
        }
        Command::Credentials(client_id, client_secret) => {
            ctx.save_credentials(client_id.to_string(), client_secret.to_string());
            trigger.run_now();
            "Credentials saved, refreshing...".to_string()
        }
        Command::List => notifier::render_status(&ctx.state().snapshot()),
        Command::Quit => "Bye".to_string(),
    }
}
