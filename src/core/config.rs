use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::core::constants::{
    DEFAULT_BASE_URL, DEFAULT_HISTORY_WINDOW, DEFAULT_MODEL, HISTORY_WINDOW_MAX,
    HISTORY_WINDOW_MIN,
};

/// Startup configuration. Read once when the process starts and never
/// written back; the streaming and history-window fields only provide the
/// initial values for the session-adjustable settings.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// API key; the `GEMINI_API_KEY` environment variable takes precedence.
    pub api_key: Option<String>,
    pub model: String,
    /// Persona text sent with every request as the system instruction.
    pub system_instruction: Option<String>,
    /// Whether replies stream incrementally by default.
    pub streaming: bool,
    /// How many transcript messages seed the model's context.
    pub history_window: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            system_instruction: None,
            streaming: true,
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }
}

impl Config {
    pub fn load() -> Result<Config, Box<dyn std::error::Error>> {
        let config_path = Self::get_config_path();
        Self::load_from_path(&config_path)
    }

    pub fn load_from_path(config_path: &PathBuf) -> Result<Config, Box<dyn std::error::Error>> {
        let mut config = if config_path.exists() {
            let contents = fs::read_to_string(config_path)?;
            toml::from_str::<Config>(&contents)?
        } else {
            Config::default()
        };
        config.history_window = config
            .history_window
            .clamp(HISTORY_WINDOW_MIN, HISTORY_WINDOW_MAX);
        Ok(config)
    }

    fn get_config_path() -> PathBuf {
        let proj_dirs = ProjectDirs::from("org", "permacommons", "kombot")
            .expect("Failed to determine config directory");
        proj_dirs.config_dir().join("config.toml")
    }

    /// Environment wins over the config file. A missing key is a startup
    /// error; nothing in the session can recover from it later.
    pub fn resolve_api_key(&self) -> Result<String, Box<dyn std::error::Error>> {
        match pick_api_key(env::var("GEMINI_API_KEY").ok(), self.api_key.as_deref()) {
            Some(key) => Ok(key),
            None => Err("No API key configured.\n\n\
                Set the GEMINI_API_KEY environment variable:\n\
                export GEMINI_API_KEY=\"your-api-key-here\"\n\n\
                or add `api_key = \"...\"` to the config file."
                .into()),
        }
    }

    pub fn resolve_base_url(&self) -> String {
        env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
    }
}

fn pick_api_key(env_key: Option<String>, config_key: Option<&str>) -> Option<String> {
    env_key
        .filter(|key| !key.trim().is_empty())
        .or_else(|| config_key.map(str::to_string))
        .filter(|key| !key.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_config_file_yields_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config_path = temp_dir.path().join("nonexistent_config.toml");

        let config = Config::load_from_path(&config_path).expect("Failed to load config");

        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.api_key, None);
        assert_eq!(config.system_instruction, None);
        assert!(config.streaming);
        assert_eq!(config.history_window, DEFAULT_HISTORY_WINDOW);
    }

    #[test]
    fn config_file_fields_are_read() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config_path = temp_dir.path().join("config.toml");
        fs::write(
            &config_path,
            r#"
api_key = "k-123"
model = "gemini-2.5-pro"
system_instruction = "You are a cycling assistant."
streaming = false
history_window = 30
"#,
        )
        .expect("Failed to write config");

        let config = Config::load_from_path(&config_path).expect("Failed to load config");

        assert_eq!(config.api_key.as_deref(), Some("k-123"));
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(
            config.system_instruction.as_deref(),
            Some("You are a cycling assistant.")
        );
        assert!(!config.streaming);
        assert_eq!(config.history_window, 30);
    }

    #[test]
    fn partial_config_keeps_remaining_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "model = \"gemini-2.0-flash\"\n").expect("Failed to write config");

        let config = Config::load_from_path(&config_path).expect("Failed to load config");

        assert_eq!(config.model, "gemini-2.0-flash");
        assert!(config.streaming);
        assert_eq!(config.history_window, DEFAULT_HISTORY_WINDOW);
    }

    #[test]
    fn history_window_is_clamped_into_range() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config_path = temp_dir.path().join("config.toml");

        fs::write(&config_path, "history_window = 5\n").expect("Failed to write config");
        let config = Config::load_from_path(&config_path).expect("Failed to load config");
        assert_eq!(config.history_window, HISTORY_WINDOW_MIN);

        fs::write(&config_path, "history_window = 500\n").expect("Failed to write config");
        let config = Config::load_from_path(&config_path).expect("Failed to load config");
        assert_eq!(config.history_window, HISTORY_WINDOW_MAX);
    }

    #[test]
    fn env_key_wins_over_config_key() {
        assert_eq!(
            pick_api_key(Some("from-env".into()), Some("from-config")),
            Some("from-env".to_string())
        );
    }

    #[test]
    fn config_key_used_when_env_is_absent_or_blank() {
        assert_eq!(
            pick_api_key(None, Some("from-config")),
            Some("from-config".to_string())
        );
        assert_eq!(
            pick_api_key(Some("  ".into()), Some("from-config")),
            Some("from-config".to_string())
        );
    }

    #[test]
    fn missing_key_everywhere_resolves_to_none() {
        assert_eq!(pick_api_key(None, None), None);
        assert_eq!(pick_api_key(Some(String::new()), None), None);
    }
}
