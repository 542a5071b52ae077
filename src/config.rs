use std::{env, fs, path::PathBuf};

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

/// Embedded default configuration, written to the home directory on first run
const CONFIG: &str = include_str!("../.config/assistant.json5");

/// Environment variable consulted when the config file carries no api key
pub const API_KEY_ENV: &str = "GRIDASSIST_API_KEY";

lazy_static! {
    pub static ref PROJECT_NAME: String = env!("CARGO_CRATE_NAME").to_uppercase().to_string();
    pub static ref CONFIG_FOLDER: Option<PathBuf> =
        env::var(format!("{}_CONFIG", PROJECT_NAME.clone()))
            .ok()
            .map(PathBuf::from);
}

/// Everything the assistant pipeline needs to run one instruction turn.
///
/// The enabled toggle, endpoint, credential, token budget, timeout and
/// sampling parameters are all plain values passed to the components that
/// need them; nothing here is process-global.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_completion_tokens")]
    pub max_completion_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default = "default_locales")]
    pub locales: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_model() -> String {
    "gpt-5-mini".to_string()
}

fn default_max_completion_tokens() -> u32 {
    10_000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_locales() -> Vec<String> {
    vec!["en".to_string(), "nb".to_string()]
}

impl Default for AssistantConfig {
    fn default() -> Self {
        json5::from_str(CONFIG).expect("embedded default config must parse")
    }
}

impl AssistantConfig {
    /// Load configuration from the given path, or from the default home
    /// location (creating it from the embedded defaults if missing).
    pub fn from_path(config_path: Option<&PathBuf>) -> Result<Self, config::ConfigError> {
        let selected_path = if let Some(p) = config_path {
            expand_tilde(p)
        } else {
            // Ensure the default file exists at ~/.gridassist.json5
            let home_cfg = default_home_config_path();
            if !home_cfg.exists() {
                if let Some(parent) = home_cfg.parent() {
                    let _ = fs::create_dir_all(parent);
                }
                let _ = fs::write(&home_cfg, CONFIG);
            }
            home_cfg
        };

        let builder = config::Config::builder().add_source(
            config::File::from(selected_path)
                .format(config::FileFormat::Json5)
                .required(true),
        );

        let mut cfg: Self = builder.build()?.try_deserialize()?;

        if cfg.api_key.is_empty() {
            if let Ok(key) = env::var(API_KEY_ENV) {
                cfg.api_key = key;
            }
        }

        Ok(cfg)
    }

    /// Wall-clock budget for a single chat call
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

/// Default config file location: explicit override folder, else home
pub fn default_home_config_path() -> PathBuf {
    if let Some(folder) = CONFIG_FOLDER.clone() {
        return folder.join(".gridassist.json5");
    }
    if let Some(base_dirs) = directories::BaseDirs::new() {
        return base_dirs.home_dir().join(".gridassist.json5");
    }
    PathBuf::from(".gridassist.json5")
}

fn expand_tilde(p: &PathBuf) -> PathBuf {
    if let Some(s) = p.to_str() {
        if let Some(stripped) = s.strip_prefix("~/") {
            if let Some(base_dirs) = directories::BaseDirs::new() {
                return base_dirs.home_dir().join(stripped);
            }
        }
    }
    p.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_defaults_parse() {
        let cfg = AssistantConfig::default();
        assert!(cfg.enabled);
        assert_eq!(cfg.model, "gpt-5-mini");
        assert_eq!(cfg.max_completion_tokens, 10_000);
        assert_eq!(cfg.timeout_secs, 30);
        assert_eq!(cfg.locales, vec!["en".to_string(), "nb".to_string()]);
        assert!(cfg.temperature.is_none());
    }

    #[test]
    fn test_from_path_merges_file_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assistant.json5");
        fs::write(
            &path,
            r#"{ endpoint: "https://example.test/chat", model: "gpt-4o-mini", enabled: false }"#,
        )
        .unwrap();

        let cfg = AssistantConfig::from_path(Some(&path)).unwrap();
        assert!(!cfg.enabled);
        assert_eq!(cfg.endpoint, "https://example.test/chat");
        assert_eq!(cfg.model, "gpt-4o-mini");
        // Untouched keys keep their defaults
        assert_eq!(cfg.timeout_secs, 30);
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json5");
        assert!(AssistantConfig::from_path(Some(&path)).is_err());
    }
}
