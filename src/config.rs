use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_READINESS_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_MAX_CONCURRENT_PROBES: usize = 64;

const APP_DIR: &str = "tfctl";
const AMI_USERS_FILE: &str = "ami_users.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid AMI username table {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// AMI id to default login user, e.g. `{"ami-0abcdef": "ubuntu"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct AmiUsernames(HashMap<String, String>);

impl AmiUsernames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, ami: impl Into<String>, username: impl Into<String>) -> Self {
        self.0.insert(ami.into(), username.into());
        self
    }

    pub fn get(&self, ami: &str) -> Option<&str> {
        self.0.get(ami).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the table from `path`, or from the default location when that file exists.
    /// Without either, the table is empty and every AWS lookup fails.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match default_ami_users_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }
}

/// `<config_dir>/tfctl/ami_users.json`
pub fn default_ami_users_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(AMI_USERS_FILE))
}

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Raw cloud identifier; validated when instances are first requested.
    pub cloud: String,
    pub ami_usernames: AmiUsernames,
    pub readiness_timeout: Duration,
    pub max_concurrent_probes: usize,
}

impl ControllerConfig {
    pub fn new(cloud: impl Into<String>) -> Self {
        Self {
            cloud: cloud.into(),
            ami_usernames: AmiUsernames::default(),
            readiness_timeout: DEFAULT_READINESS_TIMEOUT,
            max_concurrent_probes: DEFAULT_MAX_CONCURRENT_PROBES,
        }
    }

    pub fn with_ami_usernames(mut self, ami_usernames: AmiUsernames) -> Self {
        self.ami_usernames = ami_usernames;
        self
    }

    pub fn with_readiness_timeout(mut self, timeout: Duration) -> Self {
        self.readiness_timeout = timeout;
        self
    }

    pub fn with_max_concurrent_probes(mut self, max: usize) -> Self {
        self.max_concurrent_probes = max.max(1);
        self
    }
}
