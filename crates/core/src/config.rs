use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
    /// SQLite busy handler timeout applied to every connection.
    pub busy_timeout_ms: u64,
    /// Seed demo customers and remittances at bootstrap.
    pub seed_fixtures: bool,
}

impl DatabaseConfig {
    /// Single-connection settings for `url`, with the default pragmas. Used
    /// by tests and one-off tooling that bypass full config loading.
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 1,
            timeout_secs: 30,
            busy_timeout_ms: 5_000,
            seed_fixtures: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<SecretString>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub signing_secret: SecretString,
    pub session_ttl_secs: u64,
    pub lockout_threshold: u32,
    pub lockout_cooldown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub seed_fixtures: Option<bool>,
    pub llm_base_url: Option<String>,
    pub llm_model: Option<String>,
    pub llm_api_key: Option<String>,
    pub signing_secret: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://teller.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
                busy_timeout_ms: 5_000,
                seed_fixtures: false,
            },
            llm: LlmConfig {
                base_url: "https://api.openai.com".to_string(),
                model: "gpt-4o-mini".to_string(),
                api_key: None,
                timeout_secs: 15,
            },
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), port: 8000 },
            auth: AuthConfig {
                signing_secret: String::new().into(),
                session_ttl_secs: 24 * 60 * 60,
                lockout_threshold: 3,
                lockout_cooldown_secs: 15 * 60,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("teller.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
            if let Some(busy_timeout_ms) = database.busy_timeout_ms {
                self.database.busy_timeout_ms = busy_timeout_ms;
            }
            if let Some(seed_fixtures) = database.seed_fixtures {
                self.database.seed_fixtures = seed_fixtures;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(auth) = patch.auth {
            if let Some(signing_secret_value) = auth.signing_secret {
                self.auth.signing_secret = secret_value(signing_secret_value);
            }
            if let Some(session_ttl_secs) = auth.session_ttl_secs {
                self.auth.session_ttl_secs = session_ttl_secs;
            }
            if let Some(lockout_threshold) = auth.lockout_threshold {
                self.auth.lockout_threshold = lockout_threshold;
            }
            if let Some(lockout_cooldown_secs) = auth.lockout_cooldown_secs {
                self.auth.lockout_cooldown_secs = lockout_cooldown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(url) = env::var("TELLER_DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(raw) = env::var("TELLER_SEED_FIXTURES") {
            self.database.seed_fixtures = parse_bool("TELLER_SEED_FIXTURES", &raw)?;
        }
        if let Ok(base_url) = env::var("TELLER_LLM_BASE_URL") {
            self.llm.base_url = base_url;
        }
        if let Ok(model) = env::var("TELLER_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Ok(api_key) = env::var("TELLER_LLM_API_KEY") {
            self.llm.api_key = Some(secret_value(api_key));
        }
        if let Ok(secret) = env::var("TELLER_SESSION_SECRET") {
            self.auth.signing_secret = secret_value(secret);
        }
        if let Ok(bind_address) = env::var("TELLER_BIND_ADDRESS") {
            self.server.bind_address = bind_address;
        }
        if let Ok(raw) = env::var("TELLER_PORT") {
            self.server.port = raw.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: "TELLER_PORT".to_string(),
                value: raw,
            })?;
        }
        if let Ok(level) = env::var("TELLER_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(raw) = env::var("TELLER_LOG_FORMAT") {
            self.logging.format = raw.parse()?;
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(seed_fixtures) = overrides.seed_fixtures {
            self.database.seed_fixtures = seed_fixtures;
        }
        if let Some(base_url) = overrides.llm_base_url {
            self.llm.base_url = base_url;
        }
        if let Some(model) = overrides.llm_model {
            self.llm.model = model;
        }
        if let Some(api_key_value) = overrides.llm_api_key {
            self.llm.api_key = Some(secret_value(api_key_value));
        }
        if let Some(signing_secret_value) = overrides.signing_secret {
            self.auth.signing_secret = secret_value(signing_secret_value);
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Validation("database.url must not be empty".to_string()));
        }
        if self.llm.base_url.trim().is_empty() {
            return Err(ConfigError::Validation("llm.base_url must not be empty".to_string()));
        }
        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::Validation("llm.timeout_secs must be positive".to_string()));
        }
        if self.auth.signing_secret.expose_secret().len() < 16 {
            return Err(ConfigError::Validation(
                "auth.signing_secret must be set and at least 16 bytes".to_string(),
            ));
        }
        if self.auth.lockout_threshold == 0 {
            return Err(ConfigError::Validation(
                "auth.lockout_threshold must be at least 1".to_string(),
            ));
        }
        if self.auth.session_ttl_secs < 60 {
            return Err(ConfigError::Validation(
                "auth.session_ttl_secs must be at least 60".to_string(),
            ));
        }
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level `{}` is not one of trace|debug|info|warn|error",
                self.logging.level
            )));
        }
        Ok(())
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnvOverride {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) if path.exists() => Some(path.to_path_buf()),
        Some(_) => None,
        None => {
            let default = PathBuf::from("teller.toml");
            default.exists().then_some(default)
        }
    }
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    llm: Option<LlmPatch>,
    server: Option<ServerPatch>,
    auth: Option<AuthPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
    busy_timeout_ms: Option<u64>,
    seed_fixtures: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    base_url: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthPatch {
    signing_secret: Option<String>,
    session_ttl_secs: Option<u64>,
    lockout_threshold: Option<u32>,
    lockout_cooldown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use secrecy::ExposeSecret;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};

    fn valid_options() -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                signing_secret: Some("a-test-signing-secret".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[test]
    fn defaults_load_once_a_signing_secret_is_provided() {
        let config = AppConfig::load(valid_options()).expect("defaults should validate");
        assert_eq!(config.database.url, "sqlite://teller.db");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.auth.lockout_threshold, 3);
        assert_eq!(config.auth.session_ttl_secs, 86_400);
    }

    #[test]
    fn missing_signing_secret_fails_validation() {
        let result = AppConfig::load(LoadOptions::default());
        assert!(matches!(result, Err(ConfigError::Validation(message)) if message.contains("signing_secret")));
    }

    #[test]
    fn toml_patch_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            r#"
[database]
url = "sqlite::memory:"
seed_fixtures = true

[llm]
model = "llama3.1"

[auth]
signing_secret = "patched-signing-secret"
lockout_cooldown_secs = 60

[logging]
level = "debug"
format = "json"
"#
        )
        .expect("write config");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            ..LoadOptions::default()
        })
        .expect("patched config should load");

        assert_eq!(config.database.url, "sqlite::memory:");
        assert!(config.database.seed_fixtures);
        assert_eq!(config.llm.model, "llama3.1");
        assert_eq!(config.auth.signing_secret.expose_secret(), "patched-signing-secret");
        assert_eq!(config.auth.lockout_cooldown_secs, 60);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, super::LogFormat::Json);
    }

    #[test]
    fn programmatic_overrides_win_over_file_values() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[database]\nurl = \"sqlite://from-file.db\"").expect("write config");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                signing_secret: Some("override-signing-secret".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("config should load");

        assert_eq!(config.database.url, "sqlite::memory:");
    }

    #[test]
    fn require_file_fails_when_path_is_absent() {
        let result = AppConfig::load(LoadOptions {
            config_path: Some(PathBuf::from("/definitely/not/here/teller.toml")),
            require_file: true,
            ..LoadOptions::default()
        });
        assert!(matches!(result, Err(ConfigError::MissingConfigFile(_))));
    }

    #[test]
    fn bad_log_level_is_rejected() {
        let result = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                signing_secret: Some("a-test-signing-secret".to_string()),
                log_level: Some("loud".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });
        assert!(matches!(result, Err(ConfigError::Validation(message)) if message.contains("logging.level")));
    }
}
