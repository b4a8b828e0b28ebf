use std::collections::HashMap;
use std::path::Path;

use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::catalog::is_valid_id;

#[derive(Debug, Error)]
pub enum SecretStoreError {
    #[error("secret path {0} exists but is not a directory")]
    NotADirectory(String),
    #[error("failed to read secret directory {path}: {source}")]
    ReadDir {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to read secret key file {path}: {source}")]
    ReadKey {
        path: String,
        source: std::io::Error,
    },
}

/// Robot credentials, one `<robot_id>.key` file per robot. Read-only after
/// startup; used exclusively for constant-time verification.
#[derive(Debug, Default, Clone)]
pub struct SecretStore {
    secrets: HashMap<String, String>,
}

impl SecretStore {
    pub fn load(dir: &Path) -> Result<Self, SecretStoreError> {
        if !dir.exists() {
            warn!(
                dir = %dir.display(),
                "robot secrets directory not found; no robots will be able to authenticate"
            );
            return Ok(Self::default());
        }
        if !dir.is_dir() {
            return Err(SecretStoreError::NotADirectory(dir.display().to_string()));
        }

        let entries = std::fs::read_dir(dir).map_err(|source| SecretStoreError::ReadDir {
            path: dir.display().to_string(),
            source,
        })?;

        let mut secrets = HashMap::new();
        for entry in entries {
            let entry = entry.map_err(|source| SecretStoreError::ReadDir {
                path: dir.display().to_string(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(robot_id) = name.strip_suffix(".key") else {
                continue;
            };
            if !is_valid_id(robot_id) {
                warn!(file = name, "skipping secret key with invalid robot id");
                continue;
            }
            let contents =
                std::fs::read_to_string(&path).map_err(|source| SecretStoreError::ReadKey {
                    path: path.display().to_string(),
                    source,
                })?;
            let secret = contents.trim();
            if secret.is_empty() {
                warn!(file = name, "skipping empty secret key file");
                continue;
            }
            secrets.insert(robot_id.to_string(), secret.to_string());
        }

        info!(count = secrets.len(), "loaded robot secret keys");
        Ok(Self { secrets })
    }

    /// Build a store from in-memory pairs. Test rigs and embedded setups
    /// use this instead of a key directory.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            secrets: entries.into_iter().collect(),
        }
    }

    /// Constant-time credential check. An unknown robot id fails the same
    /// way a wrong key does.
    pub fn verify(&self, robot_id: &str, secret_key: &str) -> bool {
        let Some(stored) = self.secrets.get(robot_id) else {
            return false;
        };
        stored.as_bytes().ct_eq(secret_key.as_bytes()).into()
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}
