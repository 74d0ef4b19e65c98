use annotsync_diff::{DiffOptions, ListAlignment};
use annotsync_reconciler::ReconcileConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_NAME: &str = "annotsync.config.json";

/// annotsync configuration file format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Rendering rules for reconciliation
    #[serde(default)]
    pub reconcile: ReconcileConfig,

    /// How list entries are paired when diffing
    #[serde(default)]
    pub list_alignment: ListAlignment,
}

impl Config {
    /// Load config from an explicit path, or from the working directory
    pub fn load(explicit: Option<&Path>, cwd: &Path) -> anyhow::Result<Self> {
        let config_path = match explicit {
            Some(path) => path.to_path_buf(),
            None => cwd.join(DEFAULT_CONFIG_NAME),
        };

        if config_path.exists() {
            Self::from_file(&config_path)
        } else if explicit.is_some() {
            Err(anyhow::anyhow!(
                "Config file does not exist: {}",
                config_path.display()
            ))
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Diff options, with `--aligned` taking precedence over the file
    pub fn diff_options(&self, force_aligned: bool) -> DiffOptions {
        if force_aligned {
            DiffOptions::aligned()
        } else {
            DiffOptions {
                list_alignment: self.list_alignment,
            }
        }
    }
}
