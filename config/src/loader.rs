use crate::{ConfigError, LogLevel, LscConfig};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct ConfigLoader {
    explicit_file: Option<PathBuf>,
    search_paths: Vec<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        let mut search_paths = Vec::new();

        if let Some(home) = dirs::home_dir() {
            search_paths.push(home.join(".config/lsc/lsc.yaml"));
        }
        search_paths.push(PathBuf::from("./lsc.yaml"));

        #[cfg(unix)]
        search_paths.insert(0, PathBuf::from("/etc/lsc/lsc.yaml"));

        Self {
            explicit_file: None,
            search_paths,
        }
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_file = Some(path.into());
        self
    }

    /// Replace the search path list. An empty list means only defaults and env.
    pub fn with_search_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.search_paths = paths;
        self
    }

    pub fn load(&self) -> Result<LscConfig, ConfigError> {
        let mut config = LscConfig::default();

        if let Ok(env_path) = std::env::var("LSC_CONFIG") {
            config = self.parse_file(Path::new(&env_path))?;
        } else if let Some(ref explicit) = self.explicit_file {
            config = self.parse_file(explicit)?;
        } else {
            for path in &self.search_paths {
                if path.exists() {
                    if let Ok(content) = std::fs::read_to_string(path) {
                        debug!(path = ?path, "Merging config file");
                        let overlay = self.parse_content(path, &content)?;
                        config = merge_configs(&config, &overlay);
                    }
                }
            }
        }

        apply_env_overrides(&mut config)?;
        Ok(config)
    }

    fn parse_file(&self, path: &Path) -> Result<LscConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        debug!(path = ?path, "Loading config file");
        self.parse_content(path, &content)
    }

    fn parse_content(&self, path: &Path, content: &str) -> Result<LscConfig, ConfigError> {
        let expanded = expand_env_vars(content);
        if path.extension().is_some_and(|ext| ext == "json") {
            Ok(serde_json::from_str(&expanded)?)
        } else {
            Ok(serde_yaml::from_str(&expanded)?)
        }
    }
}

fn merge_configs(base: &LscConfig, overlay: &LscConfig) -> LscConfig {
    let defaults = LscConfig::default();
    let mut result = base.clone();

    if overlay.console.prompt != defaults.console.prompt {
        result.console.prompt = overlay.console.prompt.clone();
    }
    if overlay.console.case_sensitive != defaults.console.case_sensitive {
        result.console.case_sensitive = overlay.console.case_sensitive;
    }
    if overlay.console.variables != defaults.console.variables {
        result.console.variables = overlay.console.variables;
    }
    if overlay.console.vt_input != defaults.console.vt_input {
        result.console.vt_input = overlay.console.vt_input;
    }
    if overlay.console.script_extension != defaults.console.script_extension {
        result.console.script_extension = overlay.console.script_extension.clone();
    }
    if overlay.history != defaults.history {
        result.history = overlay.history.clone();
    }
    if overlay.logging != defaults.logging {
        result.logging = overlay.logging.clone();
    }

    result
}

fn expand_env_vars(content: &str) -> String {
    let Ok(re) = Regex::new(r"\$\{([^}]+)\}") else {
        return content.to_string();
    };
    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_default()
    })
    .to_string()
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn apply_env_overrides(config: &mut LscConfig) -> Result<(), ConfigError> {
    if let Ok(prompt) = std::env::var("LSC_PROMPT") {
        config.console.prompt = prompt;
    }
    if let Ok(value) = std::env::var("LSC_CASE_SENSITIVE") {
        config.console.case_sensitive = parse_bool("LSC_CASE_SENSITIVE", &value)?;
    }
    if let Ok(value) = std::env::var("LSC_VARIABLES") {
        config.console.variables = parse_bool("LSC_VARIABLES", &value)?;
    }
    if let Ok(value) = std::env::var("LSC_VT_INPUT") {
        config.console.vt_input = parse_bool("LSC_VT_INPUT", &value)?;
    }
    if let Ok(file) = std::env::var("LSC_HISTORY_FILE") {
        config.history.file = file;
    }
    if let Ok(level) = std::env::var("LSC_LOG_LEVEL") {
        let parsed: LogLevel =
            serde_yaml::from_str(&level).map_err(|_| ConfigError::InvalidValue {
                key: "LSC_LOG_LEVEL".to_string(),
                value: level.clone(),
            })?;
        config.logging.level = parsed;
    }
    Ok(())
}
