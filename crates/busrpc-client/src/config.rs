//! Configuration types for the client

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default time to wait for a reply
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Main client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Subject the server listens on
    pub subject: String,

    /// Reply timeout used when a call does not override it
    #[serde(with = "duration_serde", default = "default_timeout")]
    pub default_timeout: Duration,
}

/// Per-call options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Overrides [`ClientConfig::default_timeout`] for this call
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

impl ClientConfig {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            default_timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// The timeout a call with `options` will use
    pub fn timeout_for(&self, options: &RequestOptions) -> Duration {
        options.timeout.unwrap_or(self.default_timeout)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("rpc")
    }
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

// Helper module for Duration serialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
