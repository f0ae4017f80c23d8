use serde::Deserialize;
use std::time::Duration;

fn default_concurrency() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_commit_depth() -> usize {
    30
}

/// Runtime settings for a collection run.
///
/// Every field has a default, so an empty document deserializes to
/// [`CollectorConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CollectorConfig {
    /// Collectors allowed to run at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Per-collector time limit in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Number of recent commits inspected by the commit based collectors.
    #[serde(default = "default_commit_depth")]
    pub commit_depth: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            timeout_secs: default_timeout_secs(),
            commit_depth: default_commit_depth(),
        }
    }
}

impl CollectorConfig {
    /// Sets how many collectors may run concurrently. Zero is raised to one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    pub fn with_commit_depth(mut self, depth: usize) -> Self {
        self.commit_depth = depth;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
