use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use abook_snapshot::SnapshotConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

pub const DEFAULT_PRINCIPAL_HEADER: &str = "x-principal";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Directory holding `data.json` and `seed.json`.
    pub data_dir: PathBuf,
    /// When `false`, mutations are never written to disk.
    pub persistent: bool,
    /// Request header carrying the caller identity.
    pub principal_header: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            data_dir: PathBuf::from("."),
            persistent: true,
            principal_header: DEFAULT_PRINCIPAL_HEADER.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn snapshot_config(&self) -> SnapshotConfig {
        let config = SnapshotConfig::in_dir(&self.data_dir);
        if self.persistent {
            config
        } else {
            config.transient()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert!(c.persistent);
        assert_eq!(c.principal_header, "x-principal");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = ServerConfig::from_toml_str(
            r#"
            data_dir = "/var/lib/abook"
            persistent = false
            "#,
        )
        .unwrap();
        assert_eq!(c.data_dir, PathBuf::from("/var/lib/abook"));
        assert!(!c.persistent);
        assert_eq!(c.bind_addr, ServerConfig::default().bind_addr);
        assert!(!c.snapshot_config().persistent);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abook.toml");
        fs::write(&path, "bind_addr = \"0.0.0.0:9000\"\n").unwrap();
        let c = ServerConfig::load(&path).unwrap();
        assert_eq!(c.bind_addr.port(), 9000);
    }

    #[test]
    fn bad_toml_is_config_error() {
        let err = ServerConfig::from_toml_str("bind_addr = 12").unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
        assert!(ServerConfig::load(Path::new("/nonexistent/abook.toml")).is_err());
    }
}
