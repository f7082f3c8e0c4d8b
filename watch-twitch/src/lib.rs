pub mod client;
pub mod errors;
pub mod helix;

pub use client::{TwitchClient, REQUEST_TIMEOUT};
pub use errors::TwitchError;
