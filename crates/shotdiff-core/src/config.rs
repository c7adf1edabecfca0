//! Configuration management for shotdiff
//!
//! This module provides the repository-level settings: where comparison images
//! live, which revisions use the legacy combination naming, where the
//! known-inconsistency rules are, and the default row visibility.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{Result, RevisionInfo, ShotdiffError};

/// Repository-level shotdiff configuration
///
/// Loaded from `.shotdiff/config.toml` in the root directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShotdiffConfig {
    /// Base URL of the comparison image archive
    #[serde(default = "default_comparison_base_url")]
    pub comparison_base_url: String,

    /// Interactive comparison page linked from change reports
    #[serde(default = "default_compare_page_url")]
    pub compare_page_url: String,

    /// Repository host serving push logs
    #[serde(default = "default_pushlog_base_url")]
    pub pushlog_base_url: String,

    /// Known-inconsistency rule file
    #[serde(default = "default_rules_path")]
    pub rules_path: PathBuf,

    /// Which revisions still use the prefixed combination names
    #[serde(default)]
    pub legacy_prefix: LegacyPrefixConfig,

    /// Default row visibility
    #[serde(default)]
    pub display: DisplayDefaults,
}

/// Revisions for which combination names carry a leading free-text segment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyPrefixConfig {
    /// Projects that always use the legacy naming
    #[serde(default = "default_legacy_projects")]
    pub projects: Vec<String>,

    /// Pushes older than this (seconds since epoch) use the legacy naming
    #[serde(default = "default_cutoff_timestamp")]
    pub cutoff_timestamp: i64,
}

/// Default row visibility flags
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayDefaults {
    #[serde(default)]
    pub hide_similar: bool,

    #[serde(default)]
    pub hide_missing: bool,

    #[serde(default)]
    pub hide_known_inconsistencies: bool,
}

// Default value providers
fn default_comparison_base_url() -> String {
    "https://screenshots.mattn.ca/comparisons".to_string()
}

fn default_compare_page_url() -> String {
    "https://screenshots.mattn.ca/compare/".to_string()
}

fn default_pushlog_base_url() -> String {
    "https://hg.mozilla.org".to_string()
}

fn default_rules_path() -> PathBuf {
    PathBuf::from("known_inconsistencies.json")
}

fn default_legacy_projects() -> Vec<String> {
    vec!["try".to_string()]
}

fn default_cutoff_timestamp() -> i64 {
    1464438021
}

impl LegacyPrefixConfig {
    /// Whether one revision falls under the legacy naming
    pub fn applies_to(&self, revision: &RevisionInfo) -> bool {
        self.projects.iter().any(|p| p == &revision.project)
            || revision
                .push_timestamp
                .is_some_and(|ts| ts < self.cutoff_timestamp)
    }
}

impl ShotdiffConfig {
    /// Load configuration from `.shotdiff/config.toml` or use defaults
    pub fn load_or_default(root: &Path) -> Result<Self> {
        let config_path = root.join(".shotdiff/config.toml");

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Ok(toml::from_str(&content).map_err(|e| {
                ShotdiffError::Config(format!("Failed to parse config file: {}", e))
            })?)
        } else {
            Ok(Self::default())
        }
    }

    /// Write default configuration to `.shotdiff/config.toml`
    pub fn write_default(root: &Path) -> Result<PathBuf> {
        let config_dir = root.join(".shotdiff");
        std::fs::create_dir_all(&config_dir)?;

        let config_path = config_dir.join("config.toml");
        let config = Self::default();
        let content = toml::to_string_pretty(&config).map_err(|e| {
            ShotdiffError::Config(format!("Failed to serialize config: {}", e))
        })?;
        std::fs::write(&config_path, content)?;
        Ok(config_path)
    }
}

impl Default for ShotdiffConfig {
    fn default() -> Self {
        Self {
            comparison_base_url: default_comparison_base_url(),
            compare_page_url: default_compare_page_url(),
            pushlog_base_url: default_pushlog_base_url(),
            rules_path: default_rules_path(),
            legacy_prefix: LegacyPrefixConfig::default(),
            display: DisplayDefaults::default(),
        }
    }
}

impl Default for LegacyPrefixConfig {
    fn default() -> Self {
        Self {
            projects: default_legacy_projects(),
            cutoff_timestamp: default_cutoff_timestamp(),
        }
    }
}
