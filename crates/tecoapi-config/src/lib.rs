//! Configuration for TecoApi tools.
//!
//! One TOML file describes one device and the objects to expose on it.
//! Scalar settings can be overridden from `TECOAPI_*` environment
//! variables. [`Config::to_hub_config`] validates the result and resolves
//! the password into a `tecoapi_core::HubConfig`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use tecoapi_core::{HubConfig, ObjectConfig};

/// Prefix of the environment overrides (`TECOAPI_USERNAME`, ...).
pub const ENV_PREFIX: &str = "TECOAPI_";

/// Keys that may be overridden from the environment.
const ENV_KEYS: [&str; 9] = [
    "resource",
    "username",
    "password",
    "password_env",
    "verify_ssl",
    "timeout",
    "setup_timeout",
    "getinfo",
    "getlist",
];

const REDACTED: &str = "********";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured (set `password` or `password_env`)")]
    NoCredentials,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Service root, e.g. "https://plc.local/TecoApi/".
    #[serde(default)]
    pub resource: String,

    #[serde(default)]
    pub username: String,

    /// Password (plaintext; prefer `password_env`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Environment variable holding the password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,

    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,

    /// Poll deadline in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: f64,

    /// Discovery and service deadline in seconds.
    #[serde(default = "default_setup_timeout")]
    pub setup_timeout: f64,

    #[serde(default)]
    pub getinfo: bool,

    #[serde(default)]
    pub getlist: bool,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sensors: Vec<ObjectConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub switches: Vec<ObjectConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub binary_sensors: Vec<ObjectConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resource: String::new(),
            username: String::new(),
            password: None,
            password_env: None,
            verify_ssl: default_verify_ssl(),
            timeout: default_timeout(),
            setup_timeout: default_setup_timeout(),
            getinfo: false,
            getlist: false,
            headers: HashMap::new(),
            sensors: Vec::new(),
            switches: Vec::new(),
            binary_sensors: Vec::new(),
        }
    }
}

fn default_verify_ssl() -> bool {
    true
}
fn default_timeout() -> f64 {
    tecoapi_core::config::DEFAULT_POLL_TIMEOUT.as_secs_f64()
}
fn default_setup_timeout() -> f64 {
    tecoapi_core::config::DEFAULT_SETUP_TIMEOUT.as_secs_f64()
}

impl Config {
    /// Copy safe to print: the plaintext password is masked.
    pub fn redacted(&self) -> Self {
        Self {
            password: self.password.as_ref().map(|_| REDACTED.to_owned()),
            ..self.clone()
        }
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate and translate into the runtime `HubConfig`, reading
    /// `password_env` from the process environment.
    pub fn to_hub_config(&self) -> Result<HubConfig, ConfigError> {
        self.to_hub_config_with(|name| std::env::var(name).ok())
    }

    /// Like [`to_hub_config`](Self::to_hub_config) with an explicit
    /// environment lookup.
    pub fn to_hub_config_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<HubConfig, ConfigError> {
        let resource = parse_resource(&self.resource)?;
        if self.username.is_empty() {
            return Err(invalid("username", "must not be empty"));
        }
        let password = self.resolve_password(lookup)?;

        let mut hub = HubConfig::new(resource, self.username.clone(), password);
        hub.verify_ssl = self.verify_ssl;
        hub.timeout = seconds("timeout", self.timeout)?;
        hub.setup_timeout = seconds("setup_timeout", self.setup_timeout)?;
        hub.headers = self.headers.clone();
        hub.get_info = self.getinfo;
        hub.get_list = self.getlist;

        for (field, objects) in [
            ("sensors", &self.sensors),
            ("switches", &self.switches),
            ("binary_sensors", &self.binary_sensors),
        ] {
            for object in objects {
                validate_object(field, object)?;
            }
        }
        hub.sensors = self.sensors.clone();
        hub.switches = self.switches.clone();
        hub.binary_sensors = self.binary_sensors.clone();

        Ok(hub)
    }

    /// `password_env` wins over a plaintext `password` when the variable
    /// is set.
    fn resolve_password(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<SecretString, ConfigError> {
        if let Some(value) = self.password_env.as_deref().and_then(lookup) {
            return Ok(SecretString::from(value));
        }
        self.password
            .clone()
            .map(SecretString::from)
            .ok_or(ConfigError::NoCredentials)
    }
}

// ── Validation ──────────────────────────────────────────────────────

/// Parse the service root, making sure it ends with `/` so service names
/// join beneath it.
fn parse_resource(raw: &str) -> Result<Url, ConfigError> {
    if raw.is_empty() {
        return Err(invalid("resource", "must not be empty"));
    }
    let mut url = Url::parse(raw).map_err(|e| invalid("resource", format!("{raw}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(
            "resource",
            format!("expected http or https, got '{}'", url.scheme()),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn seconds(field: &str, value: f64) -> Result<Duration, ConfigError> {
    if value <= 0.0 {
        return Err(invalid(field, format!("must be positive, got {value}")));
    }
    Duration::try_from_secs_f64(value).map_err(|e| invalid(field, e.to_string()))
}

fn validate_object(field: &str, object: &ObjectConfig) -> Result<(), ConfigError> {
    let path = object.object.as_str();
    if path.is_empty() {
        return Err(invalid(field, "object must not be empty"));
    }
    if path.starts_with('.') || path.ends_with('.') || path.contains("..") {
        return Err(invalid(field, format!("malformed object path '{path}'")));
    }
    for child in &object.subobjects {
        if child.object.contains('.') {
            return Err(invalid(
                field,
                format!("subobject '{}' of '{path}' must be a single key", child.object),
            ));
        }
        validate_object(field, child)?;
    }
    Ok(())
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "tecoapi", "tecoapi").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("tecoapi");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from `path` + environment.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).only(&ENV_KEYS));

    let config: Config = figment.extract()?;
    Ok(config)
}
