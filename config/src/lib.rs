//! lsc Configuration System
//!
//! Layered YAML configuration for the line script console.
//!
//! # Configuration Loading Priority
//!
//! 1. Compiled-in defaults
//! 2. `/etc/lsc/lsc.yaml` (system-wide)
//! 3. `~/.config/lsc/lsc.yaml` (user)
//! 4. `./lsc.yaml` (project-local)
//! 5. `LSC_CONFIG=/path/to/config.yaml` or an explicit file (replaces 2-4)
//! 6. Environment variables (highest priority)
//!
//! # Example Configuration
//!
//! ```yaml
//! console:
//!   prompt: "lsc> "
//!   case_sensitive: false
//!   variables: true
//!   vt_input: false
//!
//! history:
//!   file: "${HOME}/.lsc_history"
//!   max_entries: 500
//!
//! logging:
//!   level: debug
//! ```

#![allow(missing_docs)]

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use types::*;

/// Load configuration from default locations.
///
/// Searches for config files in order and merges them.
/// Environment variables override file values.
pub fn load() -> Result<LscConfig, ConfigError> {
    ConfigLoader::new().load()
}

/// Load configuration from a specific file.
pub fn load_from_file(path: &str) -> Result<LscConfig, ConfigError> {
    ConfigLoader::new().with_file(path).load()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = LscConfig::default();
        assert_eq!(config.console.prompt, "> ");
        assert!(config.console.variables);
        assert!(!config.console.case_sensitive);
        assert_eq!(config.console.script_extension, "lsf");
        assert_eq!(config.history.max_entries, 1000);
    }

    #[test]
    fn parse_minimal_yaml() {
        let yaml = r#"
console:
  prompt: "lsc> "
"#;
        let config: LscConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.console.prompt, "lsc> ");
        assert!(config.console.variables); // default
    }

    #[test]
    fn parse_full_config() {
        let yaml = r#"
console:
  prompt: "$ "
  case_sensitive: true
  variables: false
  vt_input: true
  script_extension: "script"

history:
  enabled: false
  file: "/tmp/lsc_history"
  max_entries: 50

logging:
  level: debug
  format: json
  filter: "lsc=trace"
"#;
        let config: LscConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.console.prompt, "$ ");
        assert!(config.console.case_sensitive);
        assert!(!config.console.variables);
        assert!(config.console.vt_input);
        assert_eq!(config.console.script_extension, "script");
        assert!(!config.history.enabled);
        assert_eq!(config.history.max_entries, 50);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.directives(), "debug,lsc=trace");
    }

    #[test]
    fn history_path_expands_tilde() {
        let history = HistoryConfig::default();
        let path = history.file_path();
        assert!(!path.to_string_lossy().starts_with('~'));
        assert!(path.to_string_lossy().ends_with(".lsc_history"));
    }
}
