//! Configuration management for `xcresult_triage`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (`XCTRIAGE_*`)
//! 3. Project config (`./.xctriage.yaml`)
//! 4. User config (`~/.config/xctriage/config.yaml`)
//! 5. Defaults
//!
//! Scalar keys are flattened and normalized (`query_timeout` and
//! `Query-Timeout` are the same key). `suite-hints` is structured and is
//! appended across layers rather than overridden.

use crate::diagnostics::SuiteHint;
use crate::error::{Result, TriageError};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

pub const PROJECT_CONFIG_FILE: &str = ".xctriage.yaml";
pub const ENV_PREFIX: &str = "XCTRIAGE_";
pub const DEFAULT_XCRUN: &str = "xcrun";
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_TIMEOUT_SECS: u64 = 60;

const SUITE_HINTS_KEY: &str = "suite-hints";

/// One configuration source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub values: HashMap<String, String>,
    pub suite_hints: Vec<SuiteHint>,
}

impl ConfigLayer {
    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
        self.suite_hints.extend(other.suite_hints.iter().cloned());
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        debug!(path = %path.display(), "Loading config file");
        let contents = fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Build a layer from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or `suite-hints` is malformed.
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let mut value: serde_yaml::Value = serde_yaml::from_str(contents)?;
        let mut layer = Self::default();

        if let serde_yaml::Value::Mapping(map) = &mut value {
            let hints_key = map
                .keys()
                .find(|key| key.as_str().map(normalize_key).as_deref() == Some(SUITE_HINTS_KEY))
                .cloned();
            if let Some(key) = hints_key {
                if let Some(hints) = map.remove(&key) {
                    layer.suite_hints = serde_yaml::from_value(hints)
                        .map_err(|e| TriageError::Config(format!("invalid suite-hints: {e}")))?;
                }
            }
        }

        let mut flat = HashMap::new();
        flatten_yaml(&value, "", &mut flat);
        for (key, value) in flat {
            layer.insert(&key, value);
        }
        Ok(layer)
    }

    /// Build a layer from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_vars(env::vars())
    }

    /// Build a layer from `XCTRIAGE_*` pairs; other names are ignored.
    #[must_use]
    pub fn from_env_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut layer = Self::default();
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layer.insert(stripped, value);
            }
        }
        layer
    }

    fn insert(&mut self, key: &str, value: String) {
        self.values.insert(normalize_key(key), value);
    }

    /// Look up a key by any spelling.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&normalize_key(key)).map(String::as_str)
    }
}

/// CLI overrides for config loading (optional).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub xcrun: Option<String>,
    pub timeout: Option<u64>,
    pub no_color: Option<bool>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();

        if let Some(xcrun) = &self.xcrun {
            layer.insert("xcrun", xcrun.clone());
        }
        if let Some(timeout) = self.timeout {
            layer.insert("query-timeout", timeout.to_string());
            layer.insert("log-timeout", timeout.to_string());
        }
        if let Some(no_color) = self.no_color {
            layer.insert("no-color", no_color.to_string());
        }

        layer
    }
}

/// Default config layer (lowest precedence).
#[must_use]
pub fn default_config_layer() -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    layer.insert("xcrun", DEFAULT_XCRUN.to_string());
    layer.insert("query-timeout", DEFAULT_QUERY_TIMEOUT_SECS.to_string());
    layer.insert("log-timeout", DEFAULT_LOG_TIMEOUT_SECS.to_string());
    layer.insert("no-color", "false".to_string());
    layer
}

/// Load user config (`~/.config/xctriage/config.yaml`).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<ConfigLayer> {
    let Ok(home) = env::var("HOME") else {
        return Ok(ConfigLayer::default());
    };
    let path = Path::new(&home)
        .join(".config")
        .join("xctriage")
        .join("config.yaml");
    ConfigLayer::from_yaml(&path)
}

/// Load project config (`<dir>/.xctriage.yaml`).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(dir: &Path) -> Result<ConfigLayer> {
    ConfigLayer::from_yaml(&dir.join(PROJECT_CONFIG_FILE))
}

/// Load configuration with full precedence order.
///
/// # Errors
///
/// Returns an error if any config file cannot be read or parsed.
pub fn load_config(project_dir: &Path, cli: &CliOverrides) -> Result<ConfigLayer> {
    Ok(ConfigLayer::merge_layers(&[
        default_config_layer(),
        load_user_config()?,
        load_project_config(project_dir)?,
        ConfigLayer::from_env(),
        cli.as_layer(),
    ]))
}

/// Typed settings resolved from a merged layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriageConfig {
    /// Program used to reach the result-store tool.
    pub xcrun: String,
    /// Budget for summary and tests queries.
    pub query_timeout: Duration,
    /// Budget for activity, attachment, console and legacy queries.
    pub log_timeout: Duration,
    pub no_color: bool,
    pub suite_hints: Vec<SuiteHint>,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            xcrun: DEFAULT_XCRUN.to_string(),
            query_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
            log_timeout: Duration::from_secs(DEFAULT_LOG_TIMEOUT_SECS),
            no_color: false,
            suite_hints: Vec::new(),
        }
    }
}

impl TriageConfig {
    /// Resolve typed settings; absent keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `Config` for unparseable numbers or booleans.
    pub fn from_layer(layer: &ConfigLayer) -> Result<Self> {
        let defaults = Self::default();
        let xcrun = layer
            .get("xcrun")
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map_or(defaults.xcrun, str::to_string);
        let query_timeout =
            parse_secs(layer, "query-timeout")?.unwrap_or(defaults.query_timeout);
        let log_timeout = parse_secs(layer, "log-timeout")?.unwrap_or(defaults.log_timeout);
        let no_color = match layer.get("no-color") {
            Some(raw) => parse_bool(raw)
                .ok_or_else(|| TriageError::Config(format!("no-color: invalid boolean '{raw}'")))?,
            None => defaults.no_color,
        };

        Ok(Self {
            xcrun,
            query_timeout,
            log_timeout,
            no_color,
            suite_hints: layer.suite_hints.clone(),
        })
    }
}

fn parse_secs(layer: &ConfigLayer, key: &str) -> Result<Option<Duration>> {
    layer
        .get(key)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or_else(|| {
                    TriageError::Config(format!("{key}: expected positive seconds, got '{raw}'"))
                })
        })
        .transpose()
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace('_', "-")
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key_str) = key.as_str() else {
                    continue;
                };
                let next_prefix = if prefix.is_empty() {
                    key_str.to_string()
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(value, &next_prefix, out);
            }
        }
        serde_yaml::Value::Sequence(values) => {
            let joined = values
                .iter()
                .filter_map(yaml_scalar_to_string)
                .collect::<Vec<_>>()
                .join(",");
            out.insert(prefix.to_string(), joined);
        }
        _ => {
            if let Some(value) = yaml_scalar_to_string(value) {
                out.insert(prefix.to_string(), value);
            }
        }
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Bool(v) => Some(v.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Null
        | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Tagged(tagged) => yaml_scalar_to_string(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test_logging;
    use tempfile::TempDir;
    use tracing::info;

    fn layer(pairs: &[(&str, &str)]) -> ConfigLayer {
        let mut layer = ConfigLayer::default();
        for (key, value) in pairs {
            layer.insert(key, (*value).to_string());
        }
        layer
    }

    #[test]
    fn defaults_resolve() {
        let config = TriageConfig::from_layer(&default_config_layer()).expect("config");
        assert_eq!(config, TriageConfig::default());
        assert_eq!(config.query_timeout, Duration::from_secs(30));
        assert_eq!(config.log_timeout, Duration::from_secs(60));
    }

    #[test]
    fn merge_precedence_order() {
        init_test_logging();
        info!("merge_precedence_order: starting");
        let user = layer(&[("xcrun", "/usr/bin/xcrun"), ("query_timeout", "10")]);
        let project = layer(&[("Query-Timeout", "20")]);
        let env_layer = ConfigLayer::from_env_vars(vec![
            ("XCTRIAGE_LOG_TIMEOUT".to_string(), "90".to_string()),
            ("UNRELATED".to_string(), "x".to_string()),
        ]);
        let cli = CliOverrides {
            no_color: Some(true),
            ..Default::default()
        };

        let merged = ConfigLayer::merge_layers(&[
            default_config_layer(),
            user,
            project,
            env_layer,
            cli.as_layer(),
        ]);
        let config = TriageConfig::from_layer(&merged).expect("config");

        assert_eq!(config.xcrun, "/usr/bin/xcrun");
        assert_eq!(config.query_timeout, Duration::from_secs(20));
        assert_eq!(config.log_timeout, Duration::from_secs(90));
        assert!(config.no_color);
        assert!(merged.get("unrelated").is_none());
        info!("merge_precedence_order: assertions passed");
    }

    #[test]
    fn cli_timeout_sets_both_budgets() {
        let cli = CliOverrides {
            timeout: Some(5),
            ..Default::default()
        };
        let merged = ConfigLayer::merge_layers(&[default_config_layer(), cli.as_layer()]);
        let config = TriageConfig::from_layer(&merged).expect("config");
        assert_eq!(config.query_timeout, Duration::from_secs(5));
        assert_eq!(config.log_timeout, Duration::from_secs(5));
    }

    #[test]
    fn invalid_numbers_are_config_errors() {
        let bad = layer(&[("query-timeout", "soon")]);
        let err = TriageConfig::from_layer(&bad).unwrap_err();
        assert!(matches!(err, TriageError::Config(_)));

        let zero = layer(&[("log-timeout", "0")]);
        assert!(TriageConfig::from_layer(&zero).is_err());

        let bool_err = layer(&[("no-color", "maybe")]);
        assert!(TriageConfig::from_layer(&bool_err).is_err());
    }

    #[test]
    fn yaml_file_flattens_and_extracts_suite_hints() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join(PROJECT_CONFIG_FILE);
        fs::write(
            &path,
            "xcrun: /opt/xcrun\nquery_timeout: 45\nsuite_hints:\n  - match: LedgerTests\n    suggestions:\n      - Review ledger fixtures\n",
        )
        .expect("write config");

        let loaded = load_project_config(temp.path()).expect("project config");
        assert_eq!(loaded.get("xcrun"), Some("/opt/xcrun"));
        assert_eq!(loaded.get("query-timeout"), Some("45"));
        assert!(loaded.get("suite-hints").is_none());
        assert_eq!(loaded.suite_hints.len(), 1);
        assert_eq!(loaded.suite_hints[0].pattern, "LedgerTests");
    }

    #[test]
    fn suite_hints_append_across_layers() {
        let user = ConfigLayer::from_yaml_str("suite-hints:\n  - match: A\n").expect("user");
        let project = ConfigLayer::from_yaml_str("suite-hints:\n  - match: B\n").expect("project");
        let merged = ConfigLayer::merge_layers(&[user, project]);
        let patterns: Vec<&str> = merged.suite_hints.iter().map(|h| h.pattern.as_str()).collect();
        assert_eq!(patterns, vec!["A", "B"]);
    }

    #[test]
    fn malformed_suite_hints_are_rejected() {
        let err = ConfigLayer::from_yaml_str("suite-hints: 42\n").unwrap_err();
        assert!(matches!(err, TriageError::Config(_)));
    }

    #[test]
    fn missing_yaml_file_is_empty() {
        let temp = TempDir::new().expect("tempdir");
        let loaded = ConfigLayer::from_yaml(&temp.path().join("absent.yaml")).expect("empty");
        assert_eq!(loaded, ConfigLayer::default());
    }
}
