use std::{path::PathBuf, time::Duration};

use crate::channel::ChannelName;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The token exchange failed. Fatal to the current pass, the user has to
/// go through the credentials setup again.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("No twitch credentials configured")]
    MissingCredentials,

    #[error("Token exchange rejected: {0}")]
    Rejected(String),

    #[error("Token exchange timed out after {0:?}")]
    TimedOut(Duration),
}

/// One channel could not be looked up. Recovered locally: the channel keeps
/// its last known state for this pass.
#[derive(Debug, thiserror::Error)]
#[error("Cannot fetch info for channel {channel}: {source}")]
pub struct FetchError {
    pub channel: ChannelName,
    #[source]
    pub source: BoxError,
}

impl FetchError {
    pub fn new<E>(channel: ChannelName, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        FetchError {
            channel,
            source: source.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot access config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot serialize configuration")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid channel name {0:?}")]
    InvalidChannel(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Generic error")]
    Generic(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
