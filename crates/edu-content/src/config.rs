//! Configuration for the educational center site.
//!
//! Settings come from `edu-site.json` in the working directory (or a path
//! given on the command line). Every field has a default, unknown fields are
//! ignored, and secrets may be supplied through environment variables
//! instead of the file.

use std::path::Path;
use std::time::Duration;

use edu_remote::RestConfig;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SiteError};
use crate::outline::GeminiConfig;

/// The default config file name.
pub const CONFIG_FILE_NAME: &str = "edu-site.json";

/// Environment variable holding the remote store API key.
pub const ENV_REMOTE_KEY: &str = "EDU_REMOTE_KEY";

/// Environment variable holding the AI service API key.
pub const ENV_AI_KEY: &str = "EDU_AI_KEY";

/// Environment variable holding the admin password.
pub const ENV_ADMIN_PASSWORD: &str = "EDU_ADMIN_PASSWORD";

/// Longest accepted artificial login delay.
const MAX_LOGIN_DELAY_MS: u64 = 10_000;

const fn default_remote_timeout() -> u64 {
    30
}

const fn default_ai_timeout() -> u64 {
    60
}

fn default_ai_model() -> String {
    GeminiConfig::default().model
}

fn default_ai_endpoint() -> String {
    GeminiConfig::default().endpoint
}

const fn default_temperature() -> f32 {
    0.7
}

fn default_admin_username() -> String {
    "admin".to_string()
}

/// Default artificial delay before answering a login attempt.
const fn default_login_delay_ms() -> u64 {
    800
}

fn default_preferences_file() -> String {
    ".edu-site/preferences.json".to_string()
}

/// Default port for the HTTP API.
const fn default_port() -> u16 {
    3000
}

/// Main configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Remote table service.
    #[serde(default)]
    pub remote: RemoteConfig,

    /// AI outline service.
    #[serde(default)]
    pub ai: AiConfig,

    /// Admin console account.
    #[serde(default)]
    pub admin: AdminConfig,

    /// Path of the local preference file.
    #[serde(default = "default_preferences_file")]
    pub preferences_file: String,

    /// Port the HTTP API listens on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote: RemoteConfig::default(),
            ai: AiConfig::default(),
            admin: AdminConfig::default(),
            preferences_file: default_preferences_file(),
            port: default_port(),
        }
    }
}

/// Remote table service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConfig {
    /// Project URL. Empty runs against the in-process store.
    #[serde(default)]
    pub url: String,

    /// API key sent with every request.
    #[serde(default)]
    pub api_key: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_remote_timeout")]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            timeout_secs: default_remote_timeout(),
        }
    }
}

impl RemoteConfig {
    /// Returns `true` if no remote URL is configured.
    #[must_use]
    pub fn is_offline(&self) -> bool {
        self.url.trim().is_empty()
    }

    /// Builds the client settings.
    #[must_use]
    pub fn rest_config(&self) -> RestConfig {
        RestConfig {
            base_url: self.url.clone(),
            api_key: self.api_key.clone(),
            timeout_secs: self.timeout_secs,
        }
    }
}

/// AI outline service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiConfig {
    /// API key. Without one, outline requests fail.
    #[serde(default)]
    pub api_key: String,

    /// Model name.
    #[serde(default = "default_ai_model")]
    pub model: String,

    /// Base endpoint URL.
    #[serde(default = "default_ai_endpoint")]
    pub endpoint: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_ai_timeout")]
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_ai_model(),
            endpoint: default_ai_endpoint(),
            temperature: default_temperature(),
            timeout_secs: default_ai_timeout(),
        }
    }
}

impl AiConfig {
    /// Builds the client settings.
    #[must_use]
    pub fn gemini_config(&self) -> GeminiConfig {
        GeminiConfig {
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            endpoint: self.endpoint.clone(),
            temperature: self.temperature,
            timeout_secs: self.timeout_secs,
        }
    }
}

/// Admin console account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminConfig {
    /// Login name.
    #[serde(default = "default_admin_username")]
    pub username: String,

    /// Password. Empty disables the admin console.
    #[serde(default)]
    pub password: String,

    /// Delay before answering a login attempt, in milliseconds.
    #[serde(default = "default_login_delay_ms")]
    pub login_delay_ms: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
            password: String::new(),
            login_delay_ms: default_login_delay_ms(),
        }
    }
}

impl AdminConfig {
    /// Returns the login delay.
    #[must_use]
    pub const fn login_delay(&self) -> Duration {
        Duration::from_millis(self.login_delay_ms)
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if `edu-site.json` exists but is invalid.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            SiteError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads `edu-site.json` from `dir`, or defaults if it is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is invalid.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns `SiteError::ConfigParseError` if the file cannot be read or
    /// parsed, and `SiteError::ConfigValidationError` if a value is out of
    /// range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(SiteError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| SiteError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Fills secrets from `lookup`, which maps variable names to values.
    ///
    /// Non-empty values win over the file.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(key) = get(ENV_REMOTE_KEY) {
            self.remote.api_key = key;
        }
        if let Some(key) = get(ENV_AI_KEY) {
            self.ai.api_key = key;
        }
        if let Some(password) = get(ENV_ADMIN_PASSWORD) {
            self.admin.password = password;
        }
    }

    /// Fills secrets from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `SiteError::ConfigValidationError` if any check fails.
    pub fn validate(&self) -> Result<()> {
        if self.remote.timeout_secs == 0 {
            return Err(SiteError::config_validation(
                "remote.timeoutSecs must be greater than 0",
                "Set remote.timeoutSecs to at least 1 second in your edu-site.json",
            ));
        }

        if self.ai.timeout_secs == 0 {
            return Err(SiteError::config_validation(
                "ai.timeoutSecs must be greater than 0",
                "Set ai.timeoutSecs to at least 1 second in your edu-site.json",
            ));
        }

        if !(0.0..=2.0).contains(&self.ai.temperature) {
            return Err(SiteError::config_validation(
                format!("ai.temperature must be between 0 and 2, got {}", self.ai.temperature),
                "Use a temperature such as 0.7 in your edu-site.json",
            ));
        }

        if self.admin.username.trim().is_empty() {
            return Err(SiteError::config_validation(
                "admin.username must not be empty",
                "Provide an admin username in your edu-site.json",
            ));
        }

        if self.admin.login_delay_ms > MAX_LOGIN_DELAY_MS {
            return Err(SiteError::config_validation(
                format!("admin.loginDelayMs must be at most {MAX_LOGIN_DELAY_MS}"),
                "Use a delay of a few hundred milliseconds in your edu-site.json",
            ));
        }

        if self.preferences_file.trim().is_empty() {
            return Err(SiteError::config_validation(
                "preferencesFile must not be empty",
                "Provide a path for the preference file in your edu-site.json",
            ));
        }

        Ok(())
    }
}
