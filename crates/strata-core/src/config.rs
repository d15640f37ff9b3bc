use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StrataError;

/// Top-level configuration loaded from `.strata.toml`.
///
/// Every section and field has a default, so an absent or empty file yields
/// a usable configuration.
///
/// # Examples
///
/// ```
/// use strata_core::StrataConfig;
///
/// let config = StrataConfig::default();
/// assert_eq!(config.history.source_extension, "py");
/// assert_eq!(config.analytics.min_pair_commits, 2);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrataConfig {
    /// History mining and classification settings.
    #[serde(default)]
    pub history: HistoryConfig,
    /// Coupling / hotspot analysis settings.
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    /// Repository layout conventions for traceability.
    #[serde(default)]
    pub layout: LayoutConfig,
}

impl StrataConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Io`] if the file cannot be read, or
    /// [`StrataError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::path::Path;
    /// use strata_core::StrataConfig;
    ///
    /// let config = StrataConfig::from_file(Path::new(".strata.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, StrataError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata_core::StrataConfig;
    ///
    /// let toml = r#"
    /// [analytics]
    /// min_pair_commits = 3
    /// "#;
    /// let config = StrataConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.analytics.min_pair_commits, 3);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, StrataError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// History mining and defect classification settings.
///
/// # Examples
///
/// ```
/// use strata_core::HistoryConfig;
///
/// let config = HistoryConfig::default();
/// assert_eq!(config.defect_keywords, vec!["bug", "fix", "error", "issue"]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Keywords marking a commit message as defect-related, matched as
    /// whole words, case-insensitively.
    #[serde(default = "default_defect_keywords")]
    pub defect_keywords: Vec<String>,
    /// File extension (without the dot) identifying source files.
    #[serde(default = "default_source_extension")]
    pub source_extension: String,
}

fn default_defect_keywords() -> Vec<String> {
    vec!["bug".into(), "fix".into(), "error".into(), "issue".into()]
}

fn default_source_extension() -> String {
    "py".into()
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            defect_keywords: default_defect_keywords(),
            source_extension: default_source_extension(),
        }
    }
}

/// Coupling and hotspot analysis settings.
///
/// # Examples
///
/// ```
/// use strata_core::AnalyticsConfig;
///
/// let config = AnalyticsConfig::default();
/// assert_eq!(config.hotspot_percentile, 0.90);
/// assert_eq!(config.excluded_dirs, vec!["templates"]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Minimum co-change count for a pair to be reported (default: 2).
    /// Pairs below this are noise and excluded.
    #[serde(default = "default_min_pair_commits")]
    pub min_pair_commits: u32,
    /// Percentile used for hotspot thresholds, in `(0, 1]` (default: 0.90).
    #[serde(default = "default_hotspot_percentile")]
    pub hotspot_percentile: f64,
    /// Directory names excluded from metric collection (default: `templates`).
    #[serde(default = "default_excluded_dirs")]
    pub excluded_dirs: Vec<String>,
}

fn default_min_pair_commits() -> u32 {
    2
}

fn default_hotspot_percentile() -> f64 {
    0.90
}

fn default_excluded_dirs() -> Vec<String> {
    vec!["templates".into()]
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            min_pair_commits: default_min_pair_commits(),
            hotspot_percentile: default_hotspot_percentile(),
            excluded_dirs: default_excluded_dirs(),
        }
    }
}

/// Repository layout conventions used for structural mirroring and module
/// name computation.
///
/// # Examples
///
/// ```
/// use strata_core::LayoutConfig;
///
/// let layout = LayoutConfig::default();
/// assert_eq!(layout.source_root, "src");
/// assert_eq!(layout.test_root, "tests");
/// assert_eq!(layout.test_prefix, "test_");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Top-level directory containing source modules.
    #[serde(default = "default_source_root")]
    pub source_root: String,
    /// Top-level directory containing test files.
    #[serde(default = "default_test_root")]
    pub test_root: String,
    /// Filename prefix marking a test file.
    #[serde(default = "default_test_prefix")]
    pub test_prefix: String,
}

fn default_source_root() -> String {
    "src".into()
}

fn default_test_root() -> String {
    "tests".into()
}

fn default_test_prefix() -> String {
    "test_".into()
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            source_root: default_source_root(),
            test_root: default_test_root(),
            test_prefix: default_test_prefix(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = StrataConfig::default();
        assert_eq!(
            config.history.defect_keywords,
            vec!["bug", "fix", "error", "issue"]
        );
        assert_eq!(config.history.source_extension, "py");
        assert_eq!(config.analytics.min_pair_commits, 2);
        assert_eq!(config.analytics.hotspot_percentile, 0.90);
        assert_eq!(config.analytics.excluded_dirs, vec!["templates"]);
        assert_eq!(config.layout.source_root, "src");
        assert_eq!(config.layout.test_root, "tests");
        assert_eq!(config.layout.test_prefix, "test_");
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = StrataConfig::from_toml("").unwrap();
        assert_eq!(config.analytics.min_pair_commits, 2);
        assert_eq!(config.layout.source_root, "src");
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[history]
defect_keywords = ["defect", "hotfix"]
source_extension = "rs"

[analytics]
min_pair_commits = 5
hotspot_percentile = 0.95
excluded_dirs = ["generated", "vendor"]

[layout]
source_root = "lib"
test_root = "spec"
test_prefix = "spec_"
"#;
        let config = StrataConfig::from_toml(toml).unwrap();
        assert_eq!(config.history.defect_keywords, vec!["defect", "hotfix"]);
        assert_eq!(config.history.source_extension, "rs");
        assert_eq!(config.analytics.min_pair_commits, 5);
        assert_eq!(config.analytics.hotspot_percentile, 0.95);
        assert_eq!(config.analytics.excluded_dirs, vec!["generated", "vendor"]);
        assert_eq!(config.layout.source_root, "lib");
        assert_eq!(config.layout.test_root, "spec");
        assert_eq!(config.layout.test_prefix, "spec_");
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let toml = r#"
[analytics]
min_pair_commits = 4
"#;
        let config = StrataConfig::from_toml(toml).unwrap();
        assert_eq!(config.analytics.min_pair_commits, 4);
        assert_eq!(config.analytics.hotspot_percentile, 0.90);
        assert_eq!(config.history.source_extension, "py");
    }

    #[test]
    fn invalid_toml_returns_error() {
        let result = StrataConfig::from_toml("{{invalid}}");
        assert!(result.is_err());
    }
}
