use crate::backend::together;
use crate::cli::Args;
use crate::core::error::RelayError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Optional config file, merged with environment variables and CLI flags.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Config {
    pub telegram_token: Option<String>,
    pub together_api_key: Option<String>,
    pub together_base_url: Option<String>,
}

/// Fully-resolved settings after merging args > env > file > default.
#[derive(Debug, Clone)]
pub struct Settings {
    pub telegram_token: String,
    pub together_api_key: String,
    pub together_base_url: String,
}

impl Config {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chatrelay")
    }

    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    /// Load the config file. A missing file is not an error; a present but
    /// unparseable file is.
    pub fn load(path: Option<&PathBuf>) -> Result<Self, RelayError> {
        let path = path.cloned().unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path).map_err(|err| {
            RelayError::Config(format!("Failed to read {}: {}", path.display(), err))
        })?;
        let config = serde_yml::from_str(&contents)?;
        Ok(config)
    }

    pub fn resolve(self, args: &Args) -> Result<Settings, RelayError> {
        let telegram_token = args
            .telegram_token
            .clone()
            .or_else(|| std::env::var("TELEGRAM_BOT_TOKEN").ok())
            .or(self.telegram_token)
            .ok_or_else(|| {
                RelayError::Config(
                    "Telegram bot token missing (set TELEGRAM_BOT_TOKEN or telegram_token in the config file)"
                        .to_string(),
                )
            })?;

        let together_api_key = args
            .api_key
            .clone()
            .or_else(|| std::env::var("TOGETHER_API_KEY").ok())
            .or(self.together_api_key)
            .ok_or_else(|| {
                RelayError::Config(
                    "Together API key missing (set TOGETHER_API_KEY or together_api_key in the config file)"
                        .to_string(),
                )
            })?;

        let together_base_url = args
            .base_url
            .clone()
            .or(self.together_base_url)
            .unwrap_or_else(|| together::DEFAULT_BASE_URL.to_string());

        Ok(Settings {
            telegram_token,
            together_api_key,
            together_base_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::sync::Mutex;

    // Environment variables are process-global; tests that set or depend on
    // their absence serialize on this lock.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn args(argv: &[&str]) -> Args {
        let mut full = vec!["chatrelay"];
        full.extend_from_slice(argv);
        Args::parse_from(full)
    }

    fn clear_env() {
        unsafe {
            std::env::remove_var("TELEGRAM_BOT_TOKEN");
            std::env::remove_var("TOGETHER_API_KEY");
        }
    }

    #[test]
    fn args_override_file_values() {
        let config = Config {
            telegram_token: Some("file-token".to_string()),
            together_api_key: Some("file-key".to_string()),
            together_base_url: Some("https://example.test/v1".to_string()),
        };

        let settings = config
            .resolve(&args(&["--telegram-token", "arg-token", "--api-key", "arg-key"]))
            .unwrap();

        assert_eq!(settings.telegram_token, "arg-token");
        assert_eq!(settings.together_api_key, "arg-key");
        assert_eq!(settings.together_base_url, "https://example.test/v1");
    }

    #[test]
    fn env_overrides_file_and_args_override_env() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("TELEGRAM_BOT_TOKEN", "env-token");
            std::env::set_var("TOGETHER_API_KEY", "env-key");
        }

        let config = Config {
            telegram_token: Some("file-token".to_string()),
            together_api_key: Some("file-key".to_string()),
            together_base_url: None,
        };

        let settings = config.clone().resolve(&args(&[])).unwrap();
        assert_eq!(settings.telegram_token, "env-token");
        assert_eq!(settings.together_api_key, "env-key");

        let settings = config
            .resolve(&args(&[
                "--telegram-token",
                "arg-token",
                "--api-key",
                "arg-key",
            ]))
            .unwrap();
        assert_eq!(settings.telegram_token, "arg-token");
        assert_eq!(settings.together_api_key, "arg-key");

        clear_env();
    }

    #[test]
    fn base_url_defaults_to_together() {
        let config = Config {
            telegram_token: Some("t".to_string()),
            together_api_key: Some("k".to_string()),
            together_base_url: None,
        };

        let settings = config.resolve(&args(&[])).unwrap();
        assert_eq!(settings.together_base_url, together::DEFAULT_BASE_URL);
    }

    #[test]
    fn missing_token_is_a_config_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        let config = Config::default();
        let result = config.resolve(&args(&["--api-key", "k"]));
        match result {
            Err(RelayError::Config(message)) => assert!(message.contains("token")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn yaml_round_trip() {
        let yaml = "telegram_token: abc\ntogether_api_key: def\n";
        let config: Config = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.telegram_token.as_deref(), Some("abc"));
        assert_eq!(config.together_api_key.as_deref(), Some("def"));
        assert!(config.together_base_url.is_none());
    }
}
