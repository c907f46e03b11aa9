use crate::WorkspaceResult;
use folio_store::ThemeTokenRecord;
use folio_theme::{default_tokens, load_tokens, DEFAULT_STYLE_ID};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_NAME: &str = "folio.config.json";

/// Folio configuration file format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceConfig {
    /// Quiescence window before a preview compile starts
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Id of the style entry the theme overlay injects
    #[serde(default = "default_style_element_id")]
    pub style_element_id: String,

    /// JSON token file replacing the built-in baseline, relative to the config
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_defaults: Option<PathBuf>,
}

fn default_debounce_ms() -> u64 {
    350
}

fn default_style_element_id() -> String {
    DEFAULT_STYLE_ID.to_string()
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            style_element_id: default_style_element_id(),
            theme_defaults: None,
        }
    }
}

impl WorkspaceConfig {
    /// Load config from a directory, falling back to defaults when absent
    pub fn load(cwd: &Path) -> WorkspaceResult<Self> {
        let config_path = cwd.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Baseline theme tokens for a workspace rooted at `cwd`
    pub fn baseline(&self, cwd: &Path) -> WorkspaceResult<Vec<ThemeTokenRecord>> {
        match &self.theme_defaults {
            Some(path) => Ok(load_tokens(&cwd.join(path))?),
            None => Ok(default_tokens()),
        }
    }
}
