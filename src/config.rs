use std::{env, io, path::PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DB_FILE: &str = "activities.db";
pub const TOKEN_FILE: &str = "current_activity.txt";
pub const ORACLE_CONFIG_FILE: &str = "oracle.json";

/// Everything the components need to know about where state lives and how to
/// reach the oracle. Built once at startup and passed down, so tests can
/// point components at temporary locations.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub data_dir: PathBuf,
    pub oracle: OracleConfig,
}

impl AppContext {
    pub fn new(dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = match dir {
            Some(dir) => {
                std::fs::create_dir_all(&dir)?;
                dir
            }
            None => create_application_default_path()?,
        };
        let oracle = OracleConfig::load(&data_dir.join(ORACLE_CONFIG_FILE));
        Ok(Self { data_dir, oracle })
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE)
    }

    pub fn token_path(&self) -> PathBuf {
        self.data_dir.join(TOKEN_FILE)
    }
}

/// Connection settings for the local text-generation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub endpoint: String,
    pub model: String,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".into(),
            model: "llama3.1".into(),
        }
    }
}

impl OracleConfig {
    /// Missing or malformed config falls back to defaults. A broken config
    /// file should never make the tool unusable.
    fn load(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Ignoring malformed oracle config at {path:?}: {e}");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}

pub fn create_application_default_path() -> Result<PathBuf> {
    let path = {
        #[cfg(windows)]
        {
            let mut path =
                PathBuf::from(env::var("APPDATA").expect("APPDATA should be present on Windows"));
            path.push("whatidid");
            path
        }
        #[cfg(not(windows))]
        {
            let mut path = env::var("XDG_STATE_HOME")
                .map(PathBuf::from)
                .or_else(|_| {
                    env::var("HOME").map(|home| {
                        let mut path = PathBuf::from(home);
                        path.push(".local/state");
                        path
                    })
                })
                .expect("Couldn't find neither XDG_STATE_HOME nor HOME");
            path.push("whatidid");
            path
        }
    };

    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn context_uses_explicit_dir() -> Result<()> {
        let dir = tempdir()?;
        let context = AppContext::new(Some(dir.path().join("state")))?;
        assert!(context.data_dir.exists());
        assert_eq!(context.db_path().file_name().unwrap(), DB_FILE);
        assert_eq!(context.token_path().file_name().unwrap(), TOKEN_FILE);
        Ok(())
    }

    #[test]
    fn oracle_config_defaults_when_missing() {
        let config = OracleConfig::load(std::path::Path::new("/nonexistent/oracle.json"));
        assert_eq!(config.endpoint, "http://localhost:11434");
        assert_eq!(config.model, "llama3.1");
    }

    #[test]
    fn oracle_config_defaults_when_malformed() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(ORACLE_CONFIG_FILE);
        std::fs::write(&path, "{ not json")?;
        let config = OracleConfig::load(&path);
        assert_eq!(config.model, "llama3.1");
        Ok(())
    }

    #[test]
    fn oracle_config_reads_overrides() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(ORACLE_CONFIG_FILE);
        std::fs::write(&path, r#"{"model": "mistral"}"#)?;
        let config = OracleConfig::load(&path);
        assert_eq!(config.model, "mistral");
        assert_eq!(config.endpoint, "http://localhost:11434");
        Ok(())
    }
}
