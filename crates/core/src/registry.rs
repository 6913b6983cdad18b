use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::node::DatabaseId;

const REGISTRY_FILE: &str = "connections.toml";

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TlsMode {
    Disabled,
    #[default]
    Prefer,
    Require,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PasswordSource {
    #[default]
    EnvVar,
    Keyring,
}

/// One configured connection. The profile name doubles as the stable
/// [`DatabaseId`] of its tree node.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ConnectionProfile {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub database: Option<String>,
    #[serde(default)]
    pub tls_mode: TlsMode,
    #[serde(default)]
    pub tls_ca_cert_path: Option<String>,
    #[serde(default)]
    pub tls_accept_invalid_certs: bool,
    #[serde(default)]
    pub password_source: PasswordSource,
    #[serde(default)]
    pub keyring_service: Option<String>,
    #[serde(default)]
    pub keyring_account: Option<String>,
}

impl ConnectionProfile {
    #[must_use]
    pub fn new(name: impl Into<String>, host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port: 3306,
            user: user.into(),
            database: None,
            tls_mode: TlsMode::Prefer,
            tls_ca_cert_path: None,
            tls_accept_invalid_certs: false,
            password_source: PasswordSource::EnvVar,
            keyring_service: None,
            keyring_account: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> DatabaseId {
        DatabaseId::new(self.name.clone())
    }

    #[must_use]
    pub fn entry(&self) -> RegistryEntry {
        RegistryEntry {
            id: self.id(),
            host: format!("{}:{}", self.host, self.port),
            database_name: self
                .database
                .clone()
                .unwrap_or_else(|| self.name.clone()),
            connected: false,
        }
    }
}

/// What the tree needs to seed a database node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub id: DatabaseId,
    pub host: String,
    pub database_name: String,
    pub connected: bool,
}

impl RegistryEntry {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        host: impl Into<String>,
        database_name: impl Into<String>,
    ) -> Self {
        Self {
            id: DatabaseId::new(id),
            host: host.into(),
            database_name: database_name.into(),
            connected: false,
        }
    }
}

pub trait ConnectionRegistry {
    fn get_all(&self) -> Vec<RegistryEntry>;
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read connections file at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse connections file at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Default, Deserialize)]
struct RegistryDocument {
    #[serde(default)]
    connections: Vec<ConnectionProfile>,
}

impl RegistryDocument {
    // Later entries win when a name is repeated.
    fn dedupe(&mut self) {
        let mut by_name = BTreeMap::new();
        for profile in self.connections.drain(..) {
            by_name.insert(profile.name.clone(), profile);
        }
        self.connections = by_name.into_values().collect();
    }
}

/// Connection profiles read from a hand-edited TOML file, kept sorted by name.
#[derive(Debug, Clone)]
pub struct FileRegistry {
    path: PathBuf,
    profiles: Vec<ConnectionProfile>,
}

impl FileRegistry {
    pub fn load_from_dir(dir: &Path) -> Result<Self, RegistryError> {
        Self::load_from_path(dir.join(REGISTRY_FILE))
    }

    pub fn load_from_path(path: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self {
                path,
                profiles: Vec::new(),
            });
        }

        let raw = fs::read_to_string(&path).map_err(|source| RegistryError::Read {
            path: path.clone(),
            source,
        })?;
        if raw.trim().is_empty() {
            return Ok(Self {
                path,
                profiles: Vec::new(),
            });
        }

        let mut doc: RegistryDocument =
            toml::from_str(&raw).map_err(|source| RegistryError::Parse {
                path: path.clone(),
                source,
            })?;
        doc.dedupe();
        log::debug!(
            "loaded {} connection(s) from {}",
            doc.connections.len(),
            path.display()
        );

        Ok(Self {
            path,
            profiles: doc.connections,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn profiles(&self) -> &[ConnectionProfile] {
        &self.profiles
    }
}

impl ConnectionRegistry for FileRegistry {
    fn get_all(&self) -> Vec<RegistryEntry> {
        self.profiles.iter().map(ConnectionProfile::entry).collect()
    }
}
