use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tree configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeConfig {
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryConfig {
    /// Content edits on one node closer together than this share an undo step
    #[serde(default = "default_coalesce_window_ms")]
    pub coalesce_window_ms: u64,

    /// Maximum number of undo steps kept (0 = unlimited)
    #[serde(default = "default_max_levels")]
    pub max_levels: usize,
}

fn default_coalesce_window_ms() -> u64 {
    1000
}

fn default_max_levels() -> usize {
    100
}

impl HistoryConfig {
    pub fn coalesce_window(&self) -> Duration {
        Duration::from_millis(self.coalesce_window_ms)
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            coalesce_window_ms: default_coalesce_window_ms(),
            max_levels: default_max_levels(),
        }
    }
}
