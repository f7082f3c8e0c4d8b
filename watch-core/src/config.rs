use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Deserializer, Serialize};

use crate::channel::ChannelName;
use crate::errors::ConfigError;

#[derive(Deserialize, Serialize, Clone, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct Obfuscated(pub String);

impl std::fmt::Debug for Obfuscated {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<Obfuscated string>")?;
        Ok(())
    }
}

/// Twitch application credentials, used for the client-credentials grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: Obfuscated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

/// The persisted configuration blob. Read wholesale at startup,
/// written wholesale after every change.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Configuration {
    pub client_id: Option<String>,
    pub client_secret: Option<Obfuscated>,
    #[serde(deserialize_with = "valid_channels")]
    pub channels: Vec<ChannelName>,
    pub debug_mode: bool,
    pub auto_open_streams: bool,
    pub theme: Theme,
    pub initialized: bool,
}

impl Configuration {
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.0.is_empty() => {
                Some(Credentials {
                    client_id: id.clone(),
                    client_secret: secret.clone(),
                })
            }
            _ => None,
        }
    }

    pub fn contains(&self, name: &ChannelName) -> bool {
        self.channels.contains(name)
    }

    /// Hand edited files may list the same channel twice with different cases.
    fn dedup_channels(&mut self) {
        let mut seen = Vec::with_capacity(self.channels.len());
        self.channels.retain(|c| {
            if seen.contains(c) {
                log::warn!("Channel {} listed more than once in config, ignoring duplicate", c);
                false
            } else {
                seen.push(c.clone());
                true
            }
        });
    }
}

/// Blank entries in a hand edited file are skipped, the rest of the
/// configuration still loads.
fn valid_channels<'de, D>(deserializer: D) -> Result<Vec<ChannelName>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<String>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|name| match ChannelName::parse(&name) {
            Ok(channel) => Some(channel),
            Err(err) => {
                log::warn!("{} in config, ignoring it", err);
                None
            }
        })
        .collect())
}

/// Where the configuration blob lives.
pub trait ConfigStore: Send + Sync {
    /// `Ok(None)` on first run, when nothing was ever saved.
    fn load(&self) -> Result<Option<Configuration>, ConfigError>;

    fn save(&self, config: &Configuration) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P>(path: P) -> Self
    where
        P: AsRef<Path>,
    {
        JsonFileStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> ConfigError {
        ConfigError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ConfigStore for JsonFileStore {
    fn load(&self) -> Result<Option<Configuration>, ConfigError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.io_error(err)),
        };
        let mut config: Configuration =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: self.path.clone(),
                source,
            })?;
        config.dedup_channels();
        Ok(Some(config))
    }

    fn save(&self, config: &Configuration) -> Result<(), ConfigError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        config.serialize(&mut ser)?;

        // write then rename, a crash mid-write must not lose the channel list
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &buf).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_legacy_config_file() {
        let raw = r#"{
            "clientId": null,
            "clientSecret": null,
            "debugMode": false,
            "channels": ["EpicKittyXP", "epickittyxp", "bob"]
        }"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, raw).unwrap();

        let config = JsonFileStore::new(&path).load().unwrap().unwrap();
        assert_eq!(
            config,
            Configuration {
                channels: vec![
                    ChannelName::parse("epickittyxp").unwrap(),
                    ChannelName::parse("bob").unwrap(),
                ],
                ..Configuration::default()
            }
        );
        assert_eq!(config.credentials(), None);
    }

    #[test]
    fn test_blank_channels_are_skipped() {
        let raw = r#"{
            "clientId": "abc",
            "clientSecret": "s3cr3t",
            "autoOpenStreams": true,
            "channels": ["", "Bob", "  ", "alice"]
        }"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, raw).unwrap();

        let config = JsonFileStore::new(&path).load().unwrap().unwrap();
        assert_eq!(
            config.channels,
            vec![
                ChannelName::parse("bob").unwrap(),
                ChannelName::parse("alice").unwrap(),
            ]
        );
        assert!(config.auto_open_streams);
        assert!(config.credentials().is_some());
    }

    #[test]
    fn test_missing_file_is_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nope.json"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("config.json"));
        let config = Configuration {
            client_id: Some("abc".to_string()),
            client_secret: Some(Obfuscated("s3cr3t".to_string())),
            channels: vec![ChannelName::parse("alice").unwrap()],
            auto_open_streams: true,
            theme: Theme::Light,
            initialized: true,
            ..Configuration::default()
        };
        store.save(&config).unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\n    \"clientId\": \"abc\""), "{}", raw);
        assert!(raw.contains("\"theme\": \"light\""), "{}", raw);
        assert_eq!(store.load().unwrap(), Some(config));
    }

    #[test]
    fn test_secret_not_in_debug_output() {
        let creds = Credentials {
            client_id: "abc".to_string(),
            client_secret: Obfuscated("s3cr3t".to_string()),
        };
        assert!(!format!("{:?}", creds).contains("s3cr3t"));
    }
}
