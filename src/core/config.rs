//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.chatterbox/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ChatConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub username: Option<String>,
    pub default_room: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    pub base_url: Option<String>,
    pub ws_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UiConfig {
    pub follow_threshold: Option<u16>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_USERNAME: &str = "anonymous";
/// Rows from the bottom that still count as "at the bottom" in the terminal.
pub const DEFAULT_FOLLOW_THRESHOLD_ROWS: u16 = 3;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub server_url: String,
    pub ws_url: Option<String>,
    pub request_timeout: Duration,
    pub username: String,
    pub default_room: Option<String>,
    pub follow_threshold: u16,
}

/// Values given on the command line. `None` means the flag was not passed.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub server: Option<String>,
    pub username: Option<String>,
    pub room: Option<String>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.chatterbox/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".chatterbox").join("config.toml"))
}

/// Load config from `~/.chatterbox/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `ChatConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<ChatConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(ChatConfig::default());
        }
    };
    load_config_from(&path)
}

fn load_config_from(path: &Path) -> Result<ChatConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(ChatConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: ChatConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Chatterbox Configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# username = "ann"                   # Or CHATTERBOX_USERNAME / --username
# default_room = "general"           # Or --room; omit to pick from a list

# [server]
# base_url = "http://localhost:8000" # Or CHATTERBOX_SERVER_URL / --server
# ws_url = "ws://localhost:8000"     # Or CHATTERBOX_WS_URL; derived from base_url if unset
# request_timeout_secs = 10

# [ui]
# follow_threshold = 3               # Rows from the bottom that still auto-scroll
"#;

fn generate_default_config(path: &Path) {
    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, DEFAULT_CONFIG_TEMPLATE) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &ChatConfig, cli: &CliOverrides) -> ResolvedConfig {
    resolve_with_env(config, cli, |key| std::env::var(key).ok())
}

fn resolve_with_env(
    config: &ChatConfig,
    cli: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

    // Server URL: CLI → env → config → default
    let server_url = non_empty(cli.server.clone())
        .or_else(|| non_empty(env("CHATTERBOX_SERVER_URL")))
        .or_else(|| non_empty(config.server.base_url.clone()))
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

    // Streaming override: env → config
    let ws_url = non_empty(env("CHATTERBOX_WS_URL"))
        .or_else(|| non_empty(config.server.ws_url.clone()));

    // Username: CLI → env → config → login name → default
    let username = non_empty(cli.username.clone())
        .or_else(|| non_empty(env("CHATTERBOX_USERNAME")))
        .or_else(|| non_empty(config.general.username.clone()))
        .or_else(|| non_empty(env("USER")))
        .map(|name| name.trim().to_string())
        .unwrap_or_else(|| DEFAULT_USERNAME.to_string());

    let default_room = non_empty(cli.room.clone())
        .or_else(|| non_empty(config.general.default_room.clone()));

    ResolvedConfig {
        server_url,
        ws_url,
        request_timeout: Duration::from_secs(
            config
                .server
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        ),
        username,
        default_room,
        follow_threshold: config
            .ui
            .follow_threshold
            .unwrap_or(DEFAULT_FOLLOW_THRESHOLD_ROWS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let resolved = resolve_with_env(&ChatConfig::default(), &CliOverrides::default(), env_of(&[]));
        assert_eq!(resolved.server_url, DEFAULT_SERVER_URL);
        assert_eq!(resolved.ws_url, None);
        assert_eq!(resolved.request_timeout, Duration::from_secs(10));
        assert_eq!(resolved.username, DEFAULT_USERNAME);
        assert_eq!(resolved.default_room, None);
        assert_eq!(resolved.follow_threshold, DEFAULT_FOLLOW_THRESHOLD_ROWS);
    }

    #[test]
    fn test_resolve_config_values_override_defaults() {
        let config = ChatConfig {
            general: GeneralConfig {
                username: Some("ann".to_string()),
                default_room: Some("general".to_string()),
            },
            server: ServerConfig {
                base_url: Some("https://chat.example.com".to_string()),
                ws_url: Some("wss://ws.example.com".to_string()),
                request_timeout_secs: Some(3),
            },
            ui: UiConfig {
                follow_threshold: Some(5),
            },
        };
        let resolved = resolve_with_env(&config, &CliOverrides::default(), env_of(&[("USER", "root")]));
        assert_eq!(resolved.server_url, "https://chat.example.com");
        assert_eq!(resolved.ws_url.as_deref(), Some("wss://ws.example.com"));
        assert_eq!(resolved.request_timeout, Duration::from_secs(3));
        assert_eq!(resolved.username, "ann");
        assert_eq!(resolved.default_room.as_deref(), Some("general"));
        assert_eq!(resolved.follow_threshold, 5);
    }

    #[test]
    fn test_env_beats_config_and_cli_beats_env() {
        let config = ChatConfig {
            general: GeneralConfig {
                username: Some("from-config".to_string()),
                ..Default::default()
            },
            server: ServerConfig {
                base_url: Some("http://config:8000".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let env = env_of(&[
            ("CHATTERBOX_SERVER_URL", "http://env:8000"),
            ("CHATTERBOX_USERNAME", "from-env"),
        ]);

        let resolved = resolve_with_env(&config, &CliOverrides::default(), &env);
        assert_eq!(resolved.server_url, "http://env:8000");
        assert_eq!(resolved.username, "from-env");

        let cli = CliOverrides {
            server: Some("http://cli:8000".to_string()),
            username: Some("from-cli".to_string()),
            room: Some("ops".to_string()),
        };
        let resolved = resolve_with_env(&config, &cli, &env);
        assert_eq!(resolved.server_url, "http://cli:8000");
        assert_eq!(resolved.username, "from-cli");
        assert_eq!(resolved.default_room.as_deref(), Some("ops"));
    }

    #[test]
    fn test_login_name_is_last_resort_for_username() {
        let resolved = resolve_with_env(
            &ChatConfig::default(),
            &CliOverrides::default(),
            env_of(&[("USER", "sam")]),
        );
        assert_eq!(resolved.username, "sam");
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let cli = CliOverrides {
            username: Some("   ".to_string()),
            ..Default::default()
        };
        let resolved = resolve_with_env(
            &ChatConfig::default(),
            &cli,
            env_of(&[("CHATTERBOX_SERVER_URL", "")]),
        );
        assert_eq!(resolved.username, DEFAULT_USERNAME);
        assert_eq!(resolved.server_url, DEFAULT_SERVER_URL);
    }

    #[test]
    fn test_toml_round_trip() {
        let toml_str = r#"
[general]
username = "ann"
default_room = "general"

[server]
base_url = "http://192.168.1.100:8000"
request_timeout_secs = 30

[ui]
follow_threshold = 2
"#;
        let config: ChatConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.username.as_deref(), Some("ann"));
        assert_eq!(config.general.default_room.as_deref(), Some("general"));
        assert_eq!(
            config.server.base_url.as_deref(),
            Some("http://192.168.1.100:8000")
        );
        assert_eq!(config.server.ws_url, None);
        assert_eq!(config.server.request_timeout_secs, Some(30));
        assert_eq!(config.ui.follow_threshold, Some(2));
    }

    #[test]
    fn test_sparse_toml_parses() {
        // Only override one thing; everything else stays default
        let toml_str = r#"
[server]
base_url = "http://chat:8000"
"#;
        let config: ChatConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.base_url.as_deref(), Some("http://chat:8000"));
        assert!(config.general.username.is_none());
        assert!(config.ui.follow_threshold.is_none());
    }

    #[test]
    fn test_generated_template_is_valid_toml() {
        let config: ChatConfig = toml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert!(config.general.username.is_none());
        assert!(config.server.base_url.is_none());
    }

    #[test]
    fn test_missing_file_generates_template() {
        let dir = std::env::temp_dir().join(format!(
            "chatterbox-config-test-{}",
            std::process::id()
        ));
        let path = dir.join("config.toml");
        let _ = fs::remove_file(&path);

        let config = load_config_from(&path).unwrap();
        assert!(config.general.username.is_none());
        assert_eq!(fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG_TEMPLATE);

        fs::write(&path, "[general\nusername = ").unwrap();
        assert!(matches!(load_config_from(&path), Err(ConfigError::Parse(_))));

        let _ = fs::remove_dir_all(&dir);
    }
}
