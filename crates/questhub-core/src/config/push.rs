//! Outbound push service configuration.

use serde::{Deserialize, Serialize};

/// Settings for the external real-time push service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    /// Whether completed runs signal the push service at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Endpoint receiving the "new notifications" signal.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_endpoint(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_endpoint() -> String {
    "http://localhost:8081/internal/notifications/new".to_string()
}

fn default_timeout() -> u64 {
    5
}
