//! Configuration for decoding and wake handling.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::crypto::NOTIFICATION_DOMAIN_LABEL;
use crate::errors::ConfigError;
use crate::secure_storage::DEFAULT_PRIVATE_KEY_ID;

/// Top-level configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Label mixed into the ECDH-derived key. Must match the push server.
    #[serde(default = "default_domain_label")]
    pub domain_label: String,

    /// Secure-store entry holding the device private key.
    #[serde(default = "default_private_key_id")]
    pub private_key_id: String,

    /// Wake job timing and fallback text.
    #[serde(default)]
    pub wake: WakeConfig,
}

fn default_domain_label() -> String {
    NOTIFICATION_DOMAIN_LABEL.to_string()
}

fn default_private_key_id() -> String {
    DEFAULT_PRIVATE_KEY_ID.to_string()
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            domain_label: default_domain_label(),
            private_key_id: default_private_key_id(),
            wake: WakeConfig::default(),
        }
    }
}

impl NotifyConfig {
    pub fn with_domain_label(mut self, label: impl Into<String>) -> Self {
        self.domain_label = label.into();
        self
    }

    pub fn with_private_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.private_key_id = key_id.into();
        self
    }

    pub fn with_wake(mut self, wake: WakeConfig) -> Self {
        self.wake = wake;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.domain_label.is_empty() {
            return Err(ConfigError::EmptyDomainLabel);
        }
        self.wake.validate()
    }
}

/// Timing for a single wake job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WakeConfig {
    /// Overall deadline for the whole job, node start included.
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,

    /// Bound on the node start call alone.
    #[serde(default = "default_node_start_timeout_secs")]
    pub node_start_timeout_secs: u64,

    /// Title of the fallback notification on failure paths.
    #[serde(default = "default_error_title")]
    pub error_title: String,
}

/// Upper bound for `deadline_secs`. A wake job that outlives a day is a misconfiguration.
pub const MAX_DEADLINE_SECS: u64 = 24 * 60 * 60;

fn default_deadline_secs() -> u64 {
    120
}

fn default_node_start_timeout_secs() -> u64 {
    60
}

fn default_error_title() -> String {
    "Lightning error".to_string()
}

impl Default for WakeConfig {
    fn default() -> Self {
        Self {
            deadline_secs: default_deadline_secs(),
            node_start_timeout_secs: default_node_start_timeout_secs(),
            error_title: default_error_title(),
        }
    }
}

impl WakeConfig {
    pub fn with_deadline(mut self, secs: u64) -> Self {
        self.deadline_secs = secs;
        self
    }

    pub fn with_node_start_timeout(mut self, secs: u64) -> Self {
        self.node_start_timeout_secs = secs;
        self
    }

    pub fn with_error_title(mut self, title: impl Into<String>) -> Self {
        self.error_title = title.into();
        self
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }

    pub fn node_start_timeout(&self) -> Duration {
        Duration::from_secs(self.node_start_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deadline_secs == 0 {
            return Err(ConfigError::Zero {
                field: "deadline_secs",
            });
        }
        if self.deadline_secs > MAX_DEADLINE_SECS {
            return Err(ConfigError::TooLarge {
                field: "deadline_secs",
                secs: self.deadline_secs,
                max_secs: MAX_DEADLINE_SECS,
            });
        }
        if self.node_start_timeout_secs == 0 {
            return Err(ConfigError::Zero {
                field: "node_start_timeout_secs",
            });
        }
        if self.node_start_timeout_secs > self.deadline_secs {
            return Err(ConfigError::StartExceedsDeadline {
                start_secs: self.node_start_timeout_secs,
                deadline_secs: self.deadline_secs,
            });
        }
        Ok(())
    }
}
