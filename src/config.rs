// =====================================================
// GATEWAY CONFIGURATION
// Timeouts, paging windows and row caps
// =====================================================

use crate::error::{GatewayError, GatewayResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Hard ceiling on rows per browse page.
pub const PAGE_SIZE_CEILING: u32 = 200;

fn default_connect_timeout_secs() -> u64 {
    8
}

fn default_query_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> u32 {
    25
}

fn default_max_page_size() -> u32 {
    PAGE_SIZE_CEILING
}

fn default_export_page_size() -> u32 {
    1000
}

fn default_export_max_pages() -> u32 {
    5000
}

fn default_query_row_cap() -> u64 {
    500
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
    #[serde(default = "default_export_page_size")]
    pub export_page_size: u32,
    /// Hard ceiling on export iterations, guards against pathological totals.
    #[serde(default = "default_export_max_pages")]
    pub export_max_pages: u32,
    #[serde(default = "default_query_row_cap")]
    pub query_row_cap: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            query_timeout_secs: default_query_timeout_secs(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            export_page_size: default_export_page_size(),
            export_max_pages: default_export_max_pages(),
            query_row_cap: default_query_row_cap(),
        }
    }
}

impl GatewayConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    pub fn validate(&self) -> GatewayResult<()> {
        if self.connect_timeout_secs == 0 {
            return Err(GatewayError::invalid_input("connectTimeoutSecs must be positive"));
        }
        if self.query_timeout_secs == 0 {
            return Err(GatewayError::invalid_input("queryTimeoutSecs must be positive"));
        }
        if self.max_page_size == 0 || self.max_page_size > PAGE_SIZE_CEILING {
            return Err(GatewayError::invalid_input(format!(
                "maxPageSize must be between 1 and {}",
                PAGE_SIZE_CEILING
            )));
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(GatewayError::invalid_input(format!(
                "defaultPageSize must be between 1 and maxPageSize ({})",
                self.max_page_size
            )));
        }
        if self.export_page_size == 0 || self.export_max_pages == 0 {
            return Err(GatewayError::invalid_input(
                "exportPageSize and exportMaxPages must be positive",
            ));
        }
        if self.query_row_cap == 0 {
            return Err(GatewayError::invalid_input("queryRowCap must be positive"));
        }
        Ok(())
    }

    pub fn from_json_str(content: &str) -> GatewayResult<Self> {
        let config: GatewayConfig = serde_json::from_str(content).map_err(|e| {
            GatewayError::invalid_input(format!("Failed to parse gateway config JSON: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Missing file means defaults.
    pub fn load_from_path(path: &Path) -> GatewayResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| {
            GatewayError::invalid_input(format!(
                "Failed to read gateway config at {:?}: {}",
                path, e
            ))
        })?;
        Self::from_json_str(&content)
    }
}

#[cfg(test)]
mod tests;
