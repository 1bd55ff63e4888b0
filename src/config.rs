//! Application-level configuration loading: host secret, board location and game rules.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::game::GameRules;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BUZZBOARD_CONFIG_PATH";
const HOST_SECRET_ENV: &str = "HOST_SECRET";
const BOARDS_DIR_ENV: &str = "BOARDS_DIR";
const ALLOWED_ORIGINS_ENV: &str = "ALLOWED_ORIGINS";
const PORT_ENVS: [&str; 2] = ["PORT", "SERVER_PORT"];

const DEFAULT_HOST_SECRET: &str = "buzzboard-host";
const DEFAULT_BOARDS_DIR: &str = "boards";
const DEFAULT_BOARD: &str = "default";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Secret a connection must present to act as host.
    pub host_secret: String,
    /// Directory holding the `<id>.json` board files.
    pub boards_dir: PathBuf,
    /// Board started when the host does not name one.
    pub default_board: String,
    /// Session tunables.
    pub rules: GameRules,
    /// Fixed seed for Daily Double placement; random when absent.
    pub daily_double_seed: Option<u64>,
    /// TCP port the server listens on.
    pub port: u16,
    /// Origins accepted by CORS. Any origin is accepted when `None`.
    pub allowed_origins: Option<Vec<String>>,
}

impl AppConfig {
    /// Load the configuration from disk and the environment, falling back to built-in defaults.
    pub fn load() -> Self {
        Self::load_from_path(resolve_config_path()).with_env_overrides(|key| env::var(key).ok())
    }

    fn load_from_path(path: PathBuf) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json_str(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        boards_dir = %app_config.boards_dir.display(),
                        default_board = %app_config.default_board,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse the JSON configuration document. Absent keys take their default value.
    pub fn from_json_str(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Apply `HOST_SECRET`, `BOARDS_DIR`, `ALLOWED_ORIGINS` and `PORT`/`SERVER_PORT` overrides
    /// read through `lookup`.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(secret) = lookup(HOST_SECRET_ENV) {
            self.host_secret = secret;
        }
        if let Some(dir) = lookup(BOARDS_DIR_ENV) {
            self.boards_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup(ALLOWED_ORIGINS_ENV) {
            self.allowed_origins = normalize_origins(raw.split(','));
        }
        if let Some(raw) = PORT_ENVS.iter().find_map(|key| lookup(*key)) {
            match raw.parse::<u16>() {
                Ok(port) => self.port = port,
                Err(err) => warn!(value = %raw, error = %err, "ignoring invalid port override"),
            }
        }
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    host_secret: Option<String>,
    boards_dir: Option<PathBuf>,
    default_board: Option<String>,
    rules: RawRules,
    daily_double_seed: Option<u64>,
    port: Option<u16>,
    allowed_origins: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the `rules` object.
struct RawRules {
    max_players: Option<usize>,
    buzz_window_ms: Option<u64>,
    answer_seconds: Option<u64>,
    second_chance_seconds: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            host_secret: value
                .host_secret
                .unwrap_or_else(|| DEFAULT_HOST_SECRET.to_string()),
            boards_dir: value
                .boards_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_BOARDS_DIR)),
            default_board: value
                .default_board
                .unwrap_or_else(|| DEFAULT_BOARD.to_string()),
            rules: value.rules.into(),
            daily_double_seed: value.daily_double_seed,
            port: value.port.unwrap_or(DEFAULT_PORT),
            allowed_origins: value
                .allowed_origins
                .and_then(|origins| normalize_origins(origins.iter().map(String::as_str))),
        }
    }
}

impl From<RawRules> for GameRules {
    fn from(value: RawRules) -> Self {
        let defaults = GameRules::default();

        Self {
            max_players: value
                .max_players
                .filter(|max| *max > 0)
                .unwrap_or(defaults.max_players),
            buzz_window: value
                .buzz_window_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.buzz_window),
            answer_time: value
                .answer_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.answer_time),
            second_chance_time: value
                .second_chance_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.second_chance_time),
            daily_doubles: defaults.daily_doubles,
        }
    }
}

/// Trim the entries and drop blank ones; an empty list means no restriction.
fn normalize_origins<'a>(origins: impl Iterator<Item = &'a str>) -> Option<Vec<String>> {
    let origins: Vec<String> = origins
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect();
    (!origins.is_empty()).then_some(origins)
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_match_house_rules() {
        let config = AppConfig::default();
        assert_eq!(config.host_secret, "buzzboard-host");
        assert_eq!(config.boards_dir, PathBuf::from("boards"));
        assert_eq!(config.default_board, "default");
        assert_eq!(config.port, 8080);
        assert_eq!(config.daily_double_seed, None);
        assert_eq!(config.allowed_origins, None);
        assert_eq!(config.rules, GameRules::default());
        assert_eq!(config.rules.max_players, 20);
        assert_eq!(config.rules.buzz_window, Duration::from_millis(100));
    }

    #[test]
    fn partial_documents_keep_defaults() {
        let config = AppConfig::from_json_str(
            r#"{ "host_secret": "s3cret", "rules": { "answer_seconds": 20 }, "daily_double_seed": 7 }"#,
        )
        .unwrap();

        assert_eq!(config.host_secret, "s3cret");
        assert_eq!(config.rules.answer_time, Duration::from_secs(20));
        assert_eq!(config.rules.second_chance_time, Duration::from_secs(15));
        assert_eq!(config.daily_double_seed, Some(7));
        assert_eq!(config.default_board, "default");
    }

    #[test]
    fn out_of_range_rules_are_corrected() {
        let config = AppConfig::from_json_str(r#"{ "rules": { "max_players": 0 } }"#).unwrap();
        assert_eq!(config.rules.max_players, 20);
    }

    #[test]
    fn daily_double_count_is_not_configurable() {
        let config =
            AppConfig::from_json_str(r#"{ "rules": { "daily_doubles": 7, "answer_seconds": 10 } }"#)
                .unwrap();
        assert_eq!(config.rules.daily_doubles, 2);
        assert_eq!(config.rules.answer_time, Duration::from_secs(10));
    }

    #[test]
    fn allowed_origins_from_file_and_environment() {
        let config = AppConfig::from_json_str(
            r#"{ "allowed_origins": ["https://play.example.com", "  "] }"#,
        )
        .unwrap();
        assert_eq!(
            config.allowed_origins.as_deref(),
            Some(&["https://play.example.com".to_string()][..])
        );

        let env: HashMap<&str, &str> = HashMap::from([(
            "ALLOWED_ORIGINS",
            "https://a.example.com, https://b.example.com,",
        )]);
        let config = config.with_env_overrides(|key| env.get(key).map(|value| value.to_string()));
        assert_eq!(
            config.allowed_origins,
            Some(vec![
                "https://a.example.com".to_string(),
                "https://b.example.com".to_string(),
            ])
        );

        let env: HashMap<&str, &str> = HashMap::from([("ALLOWED_ORIGINS", " , ")]);
        let config = AppConfig::default()
            .with_env_overrides(|key| env.get(key).map(|value| value.to_string()));
        assert_eq!(config.allowed_origins, None);
    }

    #[test]
    fn malformed_documents_fail_to_parse() {
        assert!(AppConfig::from_json_str(r#"{ "port": "eighty" }"#).is_err());
    }

    #[test]
    fn environment_overrides_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("HOST_SECRET", "from-env"),
            ("BOARDS_DIR", "/srv/boards"),
            ("SERVER_PORT", "9000"),
        ]);
        let config = AppConfig::default()
            .with_env_overrides(|key| env.get(key).map(|value| value.to_string()));

        assert_eq!(config.host_secret, "from-env");
        assert_eq!(config.boards_dir, PathBuf::from("/srv/boards"));
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn blank_or_invalid_overrides_are_ignored() {
        let env: HashMap<&str, &str> = HashMap::from([("HOST_SECRET", "  "), ("PORT", "http")]);
        let config = AppConfig::default()
            .with_env_overrides(|key| env.get(key).map(|value| value.to_string()));

        assert_eq!(config.host_secret, "buzzboard-host");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from_path(dir.path().join("absent.json"));
        assert_eq!(config.host_secret, "buzzboard-host");
    }
}
