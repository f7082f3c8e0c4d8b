use anyhow::{Context, Result};
use watch_core::{
    channel::ChannelName,
    config::{Credentials, Obfuscated},
    provider::Provider,
};
use watch_twitch::{TwitchClient, REQUEST_TIMEOUT};

/// Look up a single channel with the credentials from the environment.
/// usage: testtwitch <channel>
#[tokio::main]
async fn main() -> Result<()> {
    let channel = std::env::args()
        .nth(1)
        .context("usage: testtwitch <channel>")?;
    let channel = ChannelName::parse(&channel)?;

    let credentials = Credentials {
        client_id: std::env::var("TWITCH_CLIENT_ID").context("twitch client id")?,
        client_secret: Obfuscated(
            std::env::var("TWITCH_CLIENT_SECRET").context("twitch client secret")?,
        ),
    };

    let client = TwitchClient::new(REQUEST_TIMEOUT)?;
    let token = client
        .get_token(&credentials)
        .await
        .context("Cannot get app access token")?;

    let info = client.fetch_channel_info(&channel, &token).await?;
    dbg!(info);

    Ok(())
}
