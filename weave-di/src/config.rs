//! Engine configuration

#[cfg(feature = "config")]
use crate::error::{DiError, DiResult};
#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct EngineConfig {
    /// Suffix of the service invoked once when a module is loaded
    pub run_hook_suffix: String,
    /// Suffix of the service invoked for every loaded module by `execute`
    pub exec_hook_suffix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            run_hook_suffix: "_run".to_string(),
            exec_hook_suffix: "_exec".to_string(),
        }
    }
}

impl EngineConfig {
    /// Name of the run hook of `module`
    pub fn run_hook(&self, module: &str) -> String {
        format!("{}{}", module, self.run_hook_suffix)
    }

    /// Name of the exec hook of `module`
    pub fn exec_hook(&self, module: &str) -> String {
        format!("{}{}", module, self.exec_hook_suffix)
    }
}

#[cfg(feature = "config")]
impl EngineConfig {
    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> DiResult<Self> {
        toml::from_str(toml_str)
            .map_err(|e| DiError::ConfigError(format!("Failed to parse TOML: {}", e)))
    }

    /// Load configuration from JSON string
    pub fn from_json(json_str: &str) -> DiResult<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| DiError::ConfigError(format!("Failed to parse JSON: {}", e)))
    }
}

#[cfg(all(test, feature = "config"))]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.run_hook("app"), "app_run");
        assert_eq!(config.exec_hook("app"), "app_exec");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml(r#"run_hook_suffix = ".start""#).unwrap();
        assert_eq!(config.run_hook("app"), "app.start");
        assert_eq!(config.exec_hook_suffix, "_exec");
    }

    #[test]
    fn test_json_and_errors() {
        let config = EngineConfig::from_json(r#"{"exec_hook_suffix": "_main"}"#).unwrap();
        assert_eq!(config.exec_hook("cli"), "cli_main");
        assert!(matches!(
            EngineConfig::from_json("[1, 2]"),
            Err(DiError::ConfigError(_))
        ));
    }
}
