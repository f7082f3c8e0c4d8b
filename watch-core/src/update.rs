use async_trait::async_trait;
use parking_lot::Mutex;

use crate::event::{Event, EventBus};

/// Source of the latest released version.
#[async_trait]
pub trait UpdateChecker: Send + Sync {
    /// `Ok(None)` when nothing was released yet.
    async fn latest_version(&self) -> anyhow::Result<Option<String>>;
}

/// Announces each newer release once.
pub struct UpdateWatch {
    checker: Box<dyn UpdateChecker>,
    current: String,
    announced: Mutex<Option<String>>,
}

impl UpdateWatch {
    pub fn new(checker: Box<dyn UpdateChecker>, current: &str) -> Self {
        UpdateWatch {
            checker,
            current: strip_prefix(current).to_string(),
            announced: Mutex::new(None),
        }
    }

    pub async fn check(&self, events: &EventBus) {
        let latest = match self.checker.latest_version().await {
            Ok(Some(latest)) => strip_prefix(&latest).to_string(),
            Ok(None) => return,
            Err(err) => {
                log::warn!("Update check failed: {:#}", err);
                return;
            }
        };

        if !is_newer(&self.current, &latest) {
            log::debug!("Running version {} is up to date", self.current);
            return;
        }

        let mut announced = self.announced.lock();
        if announced.as_deref() == Some(latest.as_str()) {
            return;
        }
        log::info!("New version available: {}", latest);
        *announced = Some(latest.clone());
        events.publish(Event::UpdateAvailable(latest));
    }
}

fn strip_prefix(version: &str) -> &str {
    let version = version.trim();
    version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix('V'))
        .unwrap_or(version)
}

/// Numeric comparison of dotted versions, `1.10.0` is newer than `1.9.3`.
/// Pre-release suffixes (`-beta.1`) are ignored, missing components count as 0.
pub fn is_newer(current: &str, candidate: &str) -> bool {
    fn parts(version: &str) -> Vec<u64> {
        strip_prefix(version)
            .split(|c| c == '-' || c == '+')
            .next()
            .unwrap_or_default()
            .split('.')
            .map(|p| p.parse().unwrap_or(0))
            .collect()
    }

    let (current, candidate) = (parts(current), parts(candidate));
    let len = current.len().max(candidate.len());
    for i in 0..len {
        let a = current.get(i).copied().unwrap_or(0);
        let b = candidate.get(i).copied().unwrap_or(0);
        if a != b {
            return b > a;
        }
    }
    false
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_is_newer() {
        assert!(is_newer("1.0.0", "1.0.1"));
        assert!(is_newer("1.9.3", "1.10.0"), "components are numbers, not text");
        assert!(is_newer("v1.2", "1.2.1"));
        assert!(!is_newer("1.2.0", "1.2"), "missing components count as zero");
        assert!(!is_newer("2.0.0", "1.99.99"));
        assert!(!is_newer("1.2.0", "v1.2.0-beta.1"));
    }
}
