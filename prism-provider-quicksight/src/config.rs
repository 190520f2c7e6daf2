//! Provider configuration

use serde::{Deserialize, Serialize};

fn default_max_wait_attempts() -> u32 {
    120
}

fn default_poll_interval_secs() -> u64 {
    5
}

/// Settings for talking to QuickSight, read from the `provider` block of the
/// configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickSightConfig {
    /// AWS region (e.g., "us-east-1"); the SDK default chain is used when absent
    #[serde(default)]
    pub region: Option<String>,
    /// Account used when a resource does not set `aws_account_id`
    #[serde(default)]
    pub aws_account_id: Option<String>,
    /// Polls of a Cloud Control request before giving up
    #[serde(default = "default_max_wait_attempts")]
    pub max_wait_attempts: u32,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for QuickSightConfig {
    fn default() -> Self {
        Self {
            region: None,
            aws_account_id: None,
            max_wait_attempts: default_max_wait_attempts(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl QuickSightConfig {
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.aws_account_id = Some(account_id.into());
        self
    }
}
