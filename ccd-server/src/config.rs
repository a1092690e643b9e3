use std::{env, fmt, net::SocketAddr, path::PathBuf};

pub const DEFAULT_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

/// Process-wide configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub saves_root: PathBuf,
    pub settings_path: PathBuf,
    pub log_file: Option<PathBuf>,
    pub deploy: DeployConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeployConfig {
    Local,
    Sftp(RemoteConfig),
}

#[derive(Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub base_path: String,
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("base_path", &self.base_path)
            .finish()
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    UnknownDeployTarget(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{key} environment variable is not set"),
            ConfigError::Invalid { key, value, reason } => {
                write!(f, "invalid {key}={value:?}: {reason}")
            }
            ConfigError::UnknownDeployTarget(value) => {
                write!(f, "unknown DEPLOY_TARGET {value:?} (expected \"local\" or \"sftp\")")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let saves_root = get("MINECRAFT_BASE_PATH")
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing("MINECRAFT_BASE_PATH"))?;
        let settings_path = PathBuf::from(
            get("SETTINGS_FILE").unwrap_or_else(|| DEFAULT_SETTINGS_FILE.to_string()),
        );
        let addr_value = get("CCD_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr_value
            .parse::<SocketAddr>()
            .map_err(|err| ConfigError::Invalid {
                key: "CCD_ADDR",
                value: addr_value.clone(),
                reason: err.to_string(),
            })?;
        let log_file = get("CCD_LOG_FILE").map(PathBuf::from);

        let deploy = match get("DEPLOY_TARGET").as_deref() {
            None | Some("local") => DeployConfig::Local,
            Some("sftp") => DeployConfig::Sftp(RemoteConfig::from_lookup(&get)?),
            Some(other) => return Err(ConfigError::UnknownDeployTarget(other.to_string())),
        };

        Ok(Self {
            addr,
            saves_root,
            settings_path,
            log_file,
            deploy,
        })
    }
}

impl RemoteConfig {
    fn from_lookup<F>(get: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));
        let host = require("REMOTE_HOST")?;
        let port_value = require("REMOTE_PORT")?;
        let port = port_value
            .parse::<u16>()
            .map_err(|err| ConfigError::Invalid {
                key: "REMOTE_PORT",
                value: port_value.clone(),
                reason: err.to_string(),
            })?;
        Ok(Self {
            host,
            port,
            username: require("REMOTE_USERNAME")?,
            password: require("REMOTE_PASSWORD")?,
            base_path: require("REMOTE_BASE_PATH")?,
        })
    }
}
