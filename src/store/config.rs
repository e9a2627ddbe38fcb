//! Database client configuration
//!
//! Identifies the managed database environment the proxy talks to. Built
//! once at startup and handed to the store constructor by reference.

use serde::{Deserialize, Serialize};

/// Region used when none is configured
pub const DEFAULT_REGION: &str = "ap-shanghai";

/// Managed database environment settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Environment id of the managed database (required)
    pub env_id: String,

    /// Service region (default: "ap-shanghai")
    #[serde(default = "default_region")]
    pub region: String,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

impl DatabaseConfig {
    pub fn new(env_id: impl Into<String>) -> Self {
        Self {
            env_id: env_id.into(),
            region: default_region(),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }
}
