//! Configuration types for the server

use serde::{Deserialize, Serialize};

/// Where the server listens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Subject requests are published on
    pub subject: String,

    /// Optional queue group, so several server instances share the load
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_group: Option<String>,
}

impl ServerConfig {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            queue_group: None,
        }
    }

    pub fn with_queue_group(mut self, group: impl Into<String>) -> Self {
        self.queue_group = Some(group.into());
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("rpc")
    }
}
