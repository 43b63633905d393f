use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize, Serializer};

use crate::connection::{ConnectionParams, DEFAULT_TEST_SUFFIX};

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "DBCHECK_ENV";
const CONFIG_DIR_ENV: &str = "DBCHECK_CONFIG_DIR";
const ENV_PREFIX: &str = "DBCHECK";
const REDACTED: &str = "***";

/// Deployment environment the checker is pointed at.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, environment overlay, and
    /// `DBCHECK__*` variables. The environment comes from `DBCHECK_ENV`.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_for(None)
    }

    /// Like [`Settings::load`], with an explicit environment taking precedence over
    /// `DBCHECK_ENV`.
    pub fn load_for(environment: Option<&str>) -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = match environment {
            Some(name) => name.to_string(),
            None => std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string()),
        };
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .with_context(|| "unable to resolve current directory")?
                .join("config"),
        };

        Self::load_from(&config_dir, &environment)
    }

    /// Load `base.toml` and `<environment>.toml` from `config_dir`, then apply
    /// environment variables. Both files are optional.
    pub fn load_from(config_dir: &Path, environment: &str) -> anyhow::Result<Self> {
        Self::layered(config_dir, environment, true)
    }

    fn layered(config_dir: &Path, environment: &str, with_env_vars: bool) -> anyhow::Result<Self> {
        let parsed: Environment = environment.parse()?;

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", parsed.as_str()));

        tracing::debug!(
            config_dir = %config_dir.display(),
            env = parsed.as_str(),
            "loading settings"
        );

        let mut builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false));
        if with_env_vars {
            builder =
                builder.add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"));
        }

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        settings.environment = parsed;
        Ok(settings)
    }
}

#[derive(Clone, Deserialize, Serialize)]
pub struct DatabaseSettings {
    #[serde(default = "DatabaseSettings::default_host")]
    pub host: String,
    #[serde(default = "DatabaseSettings::default_port")]
    pub port: u16,
    /// Primary database; the test database name is derived from it.
    #[serde(default = "DatabaseSettings::default_name")]
    pub name: String,
    #[serde(default = "DatabaseSettings::default_username")]
    pub username: String,
    #[serde(default, serialize_with = "redact")]
    pub password: Option<String>,
    #[serde(default = "DatabaseSettings::default_test_suffix")]
    pub test_suffix: String,
    #[serde(default = "DatabaseSettings::default_autocommit")]
    pub autocommit: bool,
    /// Zero disables the connect timeout.
    #[serde(default = "DatabaseSettings::default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl DatabaseSettings {
    fn default_host() -> String {
        "127.0.0.1".to_string()
    }

    fn default_port() -> u16 {
        3306
    }

    fn default_name() -> String {
        "dbcheck".to_string()
    }

    fn default_username() -> String {
        "root".to_string()
    }

    fn default_test_suffix() -> String {
        DEFAULT_TEST_SUFFIX.to_string()
    }

    fn default_autocommit() -> bool {
        true
    }

    fn default_connect_timeout_secs() -> u64 {
        10
    }

    /// Connection parameters for the configured server.
    pub fn connection_params(&self) -> ConnectionParams {
        ConnectionParams {
            host: self.host.clone(),
            port: self.port,
            database: self.name.clone(),
            test_suffix: self.test_suffix.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            autocommit: self.autocommit,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            name: Self::default_name(),
            username: Self::default_username(),
            password: None,
            test_suffix: Self::default_test_suffix(),
            autocommit: Self::default_autocommit(),
            connect_timeout_secs: Self::default_connect_timeout_secs(),
        }
    }
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| REDACTED))
            .field("test_suffix", &self.test_suffix)
            .field("autocommit", &self.autocommit)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

fn redact<S: Serializer>(password: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    match password {
        Some(_) => serializer.serialize_some(REDACTED),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    /// Default `EnvFilter` directive; `RUST_LOG` overrides it.
    #[serde(default = "TelemetrySettings::default_filter")]
    pub filter: String,
}

impl TelemetrySettings {
    fn default_filter() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            filter: Self::default_filter(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}
