use async_trait::async_trait;

use crate::channel::{ChannelInfo, ChannelName};
use crate::config::Credentials;
use crate::errors::{AuthError, FetchError};

/// The streaming platform as seen by the engine.
#[async_trait]
pub trait Provider: Send + Sync {
    type Token: Send + Sync;

    /// Exchange the application credentials for a bearer token.
    /// Called once per pass, never retried within a pass.
    async fn get_token(&self, credentials: &Credentials) -> Result<Self::Token, AuthError>;

    /// Look up everything known about one channel.
    async fn fetch_channel_info(
        &self,
        channel: &ChannelName,
        token: &Self::Token,
    ) -> Result<ChannelInfo, FetchError>;
}
