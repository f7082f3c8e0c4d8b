#[macro_use]
extern crate anyhow;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context as _, Result};
use log::info;
use structopt::StructOpt;
use watch_core::{
    ChannelSet, ConfigStore, Context, EventBus, JsonFileStore, PassTrigger, Reconciler, Schedule,
    Scheduler, UpdateWatch,
};
use watch_twitch::{TwitchClient, REQUEST_TIMEOUT};

mod commands;
mod console;
mod notifier;
mod updates;

#[derive(Debug, StructOpt)]
struct Opt {
    /// path to the json configuration
    #[structopt(long, default_value = "config.json", parse(from_os_str))]
    config: PathBuf,

    /// seconds between two polls
    #[structopt(long, default_value = "60")]
    poll_interval: u64,

    /// seconds between two update checks
    #[structopt(long, default_value = "3600")]
    update_interval: u64,

    #[structopt(long)]
    no_update_check: bool,

    /// github repository where releases are published
    #[structopt(long, default_value = "streamwatch/streamwatch")]
    release_repo: String,

    /// how many channels are looked up at the same time
    #[structopt(long, default_value = "5")]
    concurrency: usize,

    #[structopt(subcommand)]
    cmd: Option<Cmd>,
}

#[derive(Debug, StructOpt)]
enum Cmd {
    /// Store the twitch application credentials and exit
    Setup {
        #[structopt(long)]
        client_id: String,
        #[structopt(long)]
        client_secret: String,
    },
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let opt = Opt::from_args();

    let store = JsonFileStore::new(&opt.config);
    let loaded = store.load();
    let debug = matches!(&loaded, Ok(Some(config)) if config.debug_mode);
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if debug { "debug" } else { "info" }),
    )
    .init();

    let config = loaded
        .with_context(|| format!("Cannot load {}", opt.config.display()))?
        .unwrap_or_else(|| {
            info!("No config at {}, starting empty", opt.config.display());
            Default::default()
        });

    let ctx = Arc::new(Context::new(config, Box::new(store), EventBus::default()));

    if let Some(Cmd::Setup {
        client_id,
        client_secret,
    }) = opt.cmd
    {
        if client_id.trim().is_empty() || client_secret.trim().is_empty() {
            return Err(anyhow!("Client id and secret cannot be empty"));
        }
        ctx.save_credentials(client_id.trim().to_string(), client_secret.trim().to_string());
        ctx.flush().context("Cannot save credentials")?;
        println!("Credentials saved to {}", opt.config.display());
        return Ok(());
    }

    if ctx.credentials().is_none() {
        log::warn!("No twitch credentials, run `streamwatch setup --client-id <id> --client-secret <secret>`");
    }
    info!("Watching channel(s): {:?}", ctx.channels());

    let notifier = tokio::spawn(notifier::run(ctx.events().subscribe()));

    let twitch = TwitchClient::new(REQUEST_TIMEOUT).context("Cannot build the twitch client")?;
    let reconciler =
        Arc::new(Reconciler::new(ctx.clone(), twitch).with_concurrency(opt.concurrency));
    let updates = if opt.no_update_check {
        None
    } else {
        Some(UpdateWatch::new(
            Box::new(updates::GithubReleases::new(&opt.release_repo)),
            env!("CARGO_PKG_VERSION"),
        ))
    };
    let schedule = Schedule {
        poll_interval: Duration::from_secs(opt.poll_interval.max(1)),
        update_interval: Duration::from_secs(opt.update_interval.max(1)),
    };

    let trigger = PassTrigger::default();
    let channels = ChannelSet::new(ctx.clone(), trigger.clone());
    let scheduler = Scheduler::start(reconciler, updates, schedule, trigger.clone());

    let result = tokio::select! {
        res = console::run(ctx.clone(), channels, trigger) => res.context("Console crashed"),
        res = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
            res.context("Cannot listen for ctrl-c")
        }
    };

    scheduler.stop().await;
    notifier.abort();
    ctx.flush().context("Cannot save config on exit")?;
    result
}
