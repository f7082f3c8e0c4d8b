use std::{convert::TryFrom, fmt};

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Twitch login of a watched channel, as shown in the URL
/// at www.twitch.tv/<login>. Always lowercase so that two names
/// differing only by case are the same channel.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelName(String);

impl ChannelName {
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let name = raw.trim().to_lowercase();
        if name.is_empty() {
            return Err(Error::InvalidChannel(raw.to_string()));
        }
        Ok(ChannelName(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn stream_url(&self) -> String {
        format!("https://twitch.tv/{}", self.0)
    }
}

impl TryFrom<String> for ChannelName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ChannelName::parse(&value)
    }
}

impl From<ChannelName> for String {
    fn from(name: ChannelName) -> Self {
        name.0
    }
}

impl AsRef<str> for ChannelName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalized result of the lookups done for one channel during a pass.
/// `viewer_count`, `is_mature` and `started_at` only mean something while live.
/// `game_name` and `stream_title` are `None` when the provider had no
/// channel metadata at all, and `Some("")` when the broadcaster left them empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelInfo {
    pub display_name: String,
    pub is_live: bool,
    pub profile_image_url: Option<String>,
    pub viewer_count: u64,
    pub game_name: Option<String>,
    pub stream_title: Option<String>,
    pub is_mature: Option<bool>,
    pub started_at: Option<String>,
}

/// Last known state of a channel.
/// `is_live` is `None` until the first successful fetch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelState {
    pub display_name: String,
    pub is_live: Option<bool>,
    pub profile_image_url: Option<String>,
    pub viewer_count: u64,
    pub game_name: Option<String>,
    pub stream_title: Option<String>,
    pub is_mature: Option<bool>,
    pub started_at: Option<String>,
}

impl ChannelState {
    pub fn new(name: &ChannelName) -> Self {
        ChannelState {
            display_name: name.to_string(),
            ..ChannelState::default()
        }
    }

    pub fn is_live(&self) -> bool {
        self.is_live.unwrap_or(false)
    }

    /// Overwrite with freshly fetched data. Game and title carry forward when
    /// the provider returned nothing for them, and liveness is set last.
    pub(crate) fn merge(&mut self, info: ChannelInfo) {
        let is_live = info.is_live;
        self.display_name = info.display_name;
        if info.profile_image_url.is_some() {
            self.profile_image_url = info.profile_image_url;
        }
        self.viewer_count = if is_live { info.viewer_count } else { 0 };
        if info.game_name.is_some() {
            self.game_name = info.game_name;
        }
        if info.stream_title.is_some() {
            self.stream_title = info.stream_title;
        }
        if info.is_mature.is_some() {
            self.is_mature = info.is_mature;
        }
        self.started_at = info.started_at.filter(|_| is_live);
        self.is_live = Some(is_live);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_channel_name_is_canonical() {
        assert_eq!(ChannelName::parse("Bob").unwrap().as_str(), "bob");
        assert_eq!(ChannelName::parse("  EpicKittyXP ").unwrap().as_str(), "epickittyxp");
        assert_eq!(
            ChannelName::parse("Bob").unwrap(),
            ChannelName::parse("bOB").unwrap(),
            "identity ignores case"
        );
    }

    #[test]
    fn test_empty_channel_name() {
        assert!(matches!(
            ChannelName::parse("   "),
            Err(Error::InvalidChannel(_))
        ));
    }

    #[test]
    fn test_channel_name_from_json() {
        let names: Vec<ChannelName> = serde_json::from_str(r#"["Alice", "bob"]"#).unwrap();
        assert_eq!(
            names.iter().map(|n| n.as_str()).collect::<Vec<_>>(),
            vec!["alice", "bob"]
        );
        assert!(serde_json::from_str::<Vec<ChannelName>>(r#"[""]"#).is_err());
    }

    #[test]
    fn test_merge_offline_clears_live_only_fields() {
        let name = ChannelName::parse("alice").unwrap();
        let mut state = ChannelState::new(&name);
        state.merge(ChannelInfo {
            display_name: "Alice".to_string(),
            is_live: true,
            viewer_count: 120,
            game_name: Some("Just Chatting".to_string()),
            stream_title: Some("hello".to_string()),
            started_at: Some("2024-01-01T10:00:00Z".to_string()),
            ..ChannelInfo::default()
        });
        state.merge(ChannelInfo {
            display_name: "Alice".to_string(),
            is_live: false,
            viewer_count: 40,
            ..ChannelInfo::default()
        });

        assert_eq!(
            state,
            ChannelState {
                display_name: "Alice".to_string(),
                is_live: Some(false),
                viewer_count: 0,
                game_name: Some("Just Chatting".to_string()),
                stream_title: Some("hello".to_string()),
                ..ChannelState::default()
            }
        );
    }
}
