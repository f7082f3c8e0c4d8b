use thiserror::Error;
use twitch_api2::helix::ClientRequestError;

#[derive(Error, Debug)]
pub enum TwitchError {
    #[error("HttpError {0}")]
    Http(#[from] reqwest::Error),

    #[error("Helix request failed: {0}")]
    Helix(#[from] ClientRequestError<reqwest::Error>),

    #[error("No twitch user with login {0}")]
    UnknownChannel(String),
}
