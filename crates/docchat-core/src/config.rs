use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{DocchatError, Result};

/// Top-level configuration for the docchat application.
///
/// Loaded from `~/.docchat/config.toml` by default. Each section corresponds
/// to one concern: general settings, the retrieval backend, and the
/// conversation pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocchatConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub conversation: ConversationConfig,
}

impl Default for DocchatConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            backend: BackendConfig::default(),
            conversation: ConversationConfig::default(),
        }
    }
}

impl DocchatConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DocchatConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| DocchatError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Retrieval backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the retrieval backend (no trailing slash required).
    pub base_url: String,
    /// Transport-level request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Number of supporting excerpts requested per question.
    pub top_k: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 30,
            top_k: 5,
        }
    }
}

/// Conversation pacing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Delay in milliseconds between dispatching a question and calling the
    /// backend.
    pub reply_delay_ms: u64,
    /// Milliseconds between reveal ticks.
    pub reveal_interval_ms: u64,
    /// Characters revealed per tick.
    pub reveal_chunk_chars: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            reply_delay_ms: 1200,
            reveal_interval_ms: 10,
            reveal_chunk_chars: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = DocchatConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert_eq!(config.backend.request_timeout_secs, 30);
        assert_eq!(config.backend.top_k, 5);
        assert_eq!(config.conversation.reply_delay_ms, 1200);
        assert_eq!(config.conversation.reveal_interval_ms, 10);
        assert_eq!(config.conversation.reveal_chunk_chars, 1);
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
log_level = "debug"

[backend]
base_url = "http://10.0.0.5:9000"
request_timeout_secs = 10
top_k = 3

[conversation]
reply_delay_ms = 0
reveal_interval_ms = 5
reveal_chunk_chars = 4
"#;
        let file = create_temp_config(content);
        let config = DocchatConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.backend.base_url, "http://10.0.0.5:9000");
        assert_eq!(config.backend.request_timeout_secs, 10);
        assert_eq!(config.backend.top_k, 3);
        assert_eq!(config.conversation.reply_delay_ms, 0);
        assert_eq!(config.conversation.reveal_interval_ms, 5);
        assert_eq!(config.conversation.reveal_chunk_chars, 4);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[backend]
base_url = "http://localhost:8080"
"#;
        let file = create_temp_config(content);
        let config = DocchatConfig::load(file.path()).unwrap();
        assert_eq!(config.backend.base_url, "http://localhost:8080");
        // Remaining fields use defaults
        assert_eq!(config.backend.top_k, 5);
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.conversation.reply_delay_ms, 1200);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = DocchatConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.backend.base_url, "http://localhost:8000");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = DocchatConfig::default();
        config.save(&path).unwrap();

        let reloaded = DocchatConfig::load(&path).unwrap();
        assert_eq!(reloaded.general.log_level, config.general.log_level);
        assert_eq!(reloaded.backend.base_url, config.backend.base_url);
        assert_eq!(
            reloaded.conversation.reveal_interval_ms,
            config.conversation.reveal_interval_ms
        );
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = DocchatConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let deserialized: DocchatConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(deserialized.general.log_level, config.general.log_level);
        assert_eq!(deserialized.backend.top_k, config.backend.top_k);
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let content = "this is {{ not valid TOML";
        let file = create_temp_config(content);
        let result = DocchatConfig::load(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_config_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("dir").join("config.toml");

        let config = DocchatConfig::default();
        config.save(&path).unwrap();

        assert!(path.exists());
        let reloaded = DocchatConfig::load(&path).unwrap();
        assert_eq!(reloaded.general.log_level, "info");
    }

    #[test]
    fn test_config_empty_toml_uses_all_defaults() {
        let content = "";
        let file = create_temp_config(content);
        let config = DocchatConfig::load(file.path()).unwrap();

        // All defaults should apply
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.backend.top_k, 5);
        assert_eq!(config.conversation.reveal_chunk_chars, 1);
    }

    #[test]
    fn test_sub_config_defaults() {
        // Test each sub-config Default impl independently
        let general = GeneralConfig::default();
        assert_eq!(general.log_level, "info");

        let backend = BackendConfig::default();
        assert_eq!(backend.base_url, "http://localhost:8000");
        assert_eq!(backend.request_timeout_secs, 30);
        assert_eq!(backend.top_k, 5);

        let conversation = ConversationConfig::default();
        assert_eq!(conversation.reply_delay_ms, 1200);
        assert_eq!(conversation.reveal_interval_ms, 10);
        assert_eq!(conversation.reveal_chunk_chars, 1);
    }
}
