use std::time::Duration;

use async_trait::async_trait;
use twitch_api2::{
    helix::{
        self,
        channels::{ChannelInformation, GetChannelInformationRequest},
        streams::{GetStreamsRequest, Stream},
        users::{get_users::GetUsersRequest, User},
    },
    twitch_oauth2::AppAccessToken,
    types::Nickname,
};
use watch_core::{
    channel::{ChannelInfo, ChannelName},
    config::Credentials,
    errors::{AuthError, FetchError},
    provider::Provider,
};

use crate::errors::TwitchError;
use crate::helix::{channel_info, same_login};

/// Upper bound for a single HTTP exchange with twitch, token included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct TwitchClient {
    /// used for the token exchange
    pub auth_client: reqwest::Client,
    pub client: helix::HelixClient<'static, reqwest::Client>,
}

impl std::fmt::Debug for TwitchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitchClient").finish_non_exhaustive()
    }
}

impl TwitchClient {
    /// Every request, token exchange included, gives up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, TwitchError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(TwitchClient::with_client(http))
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        TwitchClient {
            client: helix::HelixClient::with_client(http.clone()),
            auth_client: http,
        }
    }

    pub async fn app_token(&self, credentials: &Credentials) -> Result<AppAccessToken, AuthError> {
        let token = AppAccessToken::get_app_access_token(
            &self.auth_client,
            credentials.client_id.clone().into(),
            credentials.client_secret.0.clone().into(),
            vec![], // scopes
        )
        .await
        .map_err(|err| AuthError::Rejected(err.to_string()))?;

        log::debug!("Got a twitch app token");
        Ok(token)
    }

    pub async fn get_user(
        &self,
        login: &str,
        token: &AppAccessToken,
    ) -> Result<Option<User>, TwitchError> {
        let req = GetUsersRequest::builder()
            .login(vec![Nickname::from(login.to_string())])
            .build();
        let users = self.client.req_get(req, token).await?.data;
        Ok(users.into_iter().find(|user| same_login(&user.login, login)))
    }

    /// returning Ok(None) means the given login isn't live atm
    pub async fn get_live_stream(
        &self,
        login: &str,
        token: &AppAccessToken,
    ) -> Result<Option<Stream>, TwitchError> {
        let req = GetStreamsRequest::builder()
            .user_login(vec![Nickname::from(login.to_string())])
            .build();
        let streams = self.client.req_get(req, token).await?.data;
        Ok(streams
            .into_iter()
            .find(|stream| same_login(&stream.user_login, login)))
    }

    pub async fn get_channel(
        &self,
        user: &User,
        token: &AppAccessToken,
    ) -> Result<Option<ChannelInformation>, TwitchError> {
        let req = GetChannelInformationRequest::builder()
            .broadcaster_id(user.id.clone())
            .build();
        let channel = self.client.req_get(req, token).await?.data;
        Ok(channel.filter(|channel| same_login(&channel.broadcaster_login, user.login.as_str())))
    }

    async fn lookup(
        &self,
        channel: &ChannelName,
        token: &AppAccessToken,
    ) -> Result<ChannelInfo, TwitchError> {
        let login = channel.as_str();
        let (user, stream) = tokio::try_join!(
            self.get_user(login, token),
            self.get_live_stream(login, token)
        )?;
        let user = user.ok_or_else(|| TwitchError::UnknownChannel(login.to_string()))?;
        let metadata = self.get_channel(&user, token).await?;
        Ok(channel_info(user, stream, metadata))
    }
}

#[async_trait]
impl Provider for TwitchClient {
    type Token = AppAccessToken;

    async fn get_token(&self, credentials: &Credentials) -> Result<AppAccessToken, AuthError> {
        self.app_token(credentials).await
    }

    async fn fetch_channel_info(
        &self,
        channel: &ChannelName,
        token: &AppAccessToken,
    ) -> Result<ChannelInfo, FetchError> {
        self.lookup(channel, token)
            .await
            .map_err(|err| FetchError::new(channel.clone(), err))
    }
}
