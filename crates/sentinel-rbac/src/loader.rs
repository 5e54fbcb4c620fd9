//! # Loader
//!
//! Reads RBAC configuration documents from bytes, strings or files and
//! turns them into validated [`Host`]s and [`Schema`]s.
//!
//! ## Usage
//!
//! ```no_run
//! use sentinel_rbac::{load_host_with, LoaderConfig};
//!
//! // SENTINEL_RBAC_PATH=/etc/app/rbac.json
//! // SENTINEL_RBAC_REQUIRE_SCHEMA=users-service
//! let host = load_host_with(&LoaderConfig::from_env()).unwrap();
//! let schema = host.get_schema("users-service").unwrap();
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult, RefKind};
use crate::host::Host;
use crate::raw::{RawHost, RawSchema};
use crate::schema::Schema;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "RBAC.json";

/// Where to load the host from and what it must contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Path to the host document.
    pub path: PathBuf,
    /// Schema id that must be present in the loaded host.
    pub require_schema: Option<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_CONFIG_PATH),
            require_schema: None,
        }
    }
}

impl LoaderConfig {
    /// Create a config for the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            require_schema: None,
        }
    }

    /// Require a schema to be present in the loaded host.
    pub fn require_schema(mut self, id: impl Into<String>) -> Self {
        self.require_schema = Some(id.into());
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SENTINEL_RBAC_PATH`: Host document path (default: RBAC.json)
    /// - `SENTINEL_RBAC_REQUIRE_SCHEMA`: Schema id the host must define
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            path: std::env::var("SENTINEL_RBAC_PATH")
                .map(PathBuf::from)
                .unwrap_or(default.path),
            require_schema: std::env::var("SENTINEL_RBAC_REQUIRE_SCHEMA")
                .ok()
                .filter(|id| !id.is_empty()),
        }
    }
}

/// Build a host from a JSON document.
pub fn host_from_slice(bytes: &[u8]) -> ConfigResult<Host> {
    let raw: RawHost = serde_json::from_slice(bytes)?;
    Host::from_raw(&raw)
}

/// Build a host from a JSON string.
pub fn host_from_str(s: &str) -> ConfigResult<Host> {
    host_from_slice(s.as_bytes())
}

/// Build a standalone schema from a JSON document.
pub fn schema_from_slice(bytes: &[u8]) -> ConfigResult<Schema> {
    let raw: RawSchema = serde_json::from_slice(bytes)?;
    Schema::from_raw(&raw)
}

/// Build a standalone schema from a JSON string.
pub fn schema_from_str(s: &str) -> ConfigResult<Schema> {
    schema_from_slice(s.as_bytes())
}

fn read(path: &Path) -> ConfigResult<Vec<u8>> {
    debug!(path = %path.display(), "Reading RBAC configuration");

    std::fs::read(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => {
            ConfigError::Io(format!("configuration file {} not found", path.display()))
        }
        _ => ConfigError::Io(format!("{}: {}", path.display(), err)),
    })
}

/// Load a host document from a file.
pub fn load_host(path: impl AsRef<Path>) -> ConfigResult<Host> {
    let path = path.as_ref();
    let host = host_from_slice(&read(path)?)?;

    info!(
        path = %path.display(),
        schemas = host.schemas().len(),
        "RBAC host loaded"
    );

    Ok(host)
}

/// Load a standalone schema document from a file.
pub fn load_schema(path: impl AsRef<Path>) -> ConfigResult<Schema> {
    let path = path.as_ref();
    let schema = schema_from_slice(&read(path)?)?;

    info!(path = %path.display(), schema = %schema.id(), "RBAC schema loaded");

    Ok(schema)
}

/// Load a host as described by `config`.
///
/// # Errors
///
/// Anything [`load_host`] returns, or [`ConfigError::UnresolvedReference`]
/// if the required schema is missing from the host.
pub fn load_host_with(config: &LoaderConfig) -> ConfigResult<Host> {
    let host = load_host(&config.path)?;

    if let Some(id) = &config.require_schema {
        if host.get_schema(id).is_err() {
            return Err(ConfigError::UnresolvedReference {
                kind: RefKind::Schema,
                name: id.clone(),
                scope: "host".to_string(),
            });
        }
    }

    Ok(host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn host_document() -> serde_json::Value {
        json!({
            "default-roles": ["user"],
            "roles": [{ "name": "user", "permissions": { "self-read": true } }],
            "schemas": [{
                "id": "users-service",
                "entities": [{ "name": "user", "actions": [{ "name": "read", "permissions": { "read": true } }] }],
                "resources": ["cache"]
            }]
        })
    }

    #[test]
    fn test_host_from_str() {
        let host = host_from_str(&host_document().to_string()).unwrap();
        assert_eq!(host.schemas().len(), 1);
        assert_eq!(host.default_roles()[0].name, "user");
    }

    #[test]
    fn test_schema_from_str() {
        let schema = schema_from_str(
            &json!({
                "id": "billing",
                "roles": [{ "name": "accountant", "permissions": { "read": true } }],
                "default-roles": ["accountant"]
            })
            .to_string(),
        )
        .unwrap();

        assert_eq!(schema.id(), "billing");
        assert_eq!(schema.default_roles()[0].name, "accountant");
    }

    #[test]
    fn test_malformed_document() {
        let err = host_from_str("{ \"schemas\": ").unwrap_err();
        assert_eq!(err.error_code(), "PARSE_ERROR");

        let err = host_from_str(r#"{ "schemas": [], "rolez": [] }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_host_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("RBAC.json");
        fs::write(&path, host_document().to_string()).unwrap();

        let host = load_host(&path).unwrap();
        assert!(host.get_schema("users-service").is_ok());
    }

    #[test]
    fn test_load_schema_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("schema.json");
        fs::write(&path, host_document()["schemas"][0].to_string()).unwrap();

        let schema = load_schema(&path).unwrap();
        assert_eq!(schema.id(), "users-service");
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = load_host(temp_dir.path().join("RBAC.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(ref msg) if msg.contains("not found")));
    }

    #[test]
    fn test_required_schema() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("RBAC.json");
        fs::write(&path, host_document().to_string()).unwrap();

        let config = LoaderConfig::new(&path).require_schema("users-service");
        assert!(load_host_with(&config).is_ok());

        let config = LoaderConfig::new(&path).require_schema("billing");
        let err = load_host_with(&config).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnresolvedReference { kind: RefKind::Schema, ref name, .. } if name == "billing"
        ));
    }

    #[test]
    fn test_config_from_env() {
        std::env::set_var("SENTINEL_RBAC_PATH", "/etc/app/rbac.json");
        std::env::set_var("SENTINEL_RBAC_REQUIRE_SCHEMA", "users-service");

        let config = LoaderConfig::from_env();
        assert_eq!(config.path, PathBuf::from("/etc/app/rbac.json"));
        assert_eq!(config.require_schema.as_deref(), Some("users-service"));

        std::env::remove_var("SENTINEL_RBAC_PATH");
        std::env::remove_var("SENTINEL_RBAC_REQUIRE_SCHEMA");

        assert_eq!(LoaderConfig::from_env(), LoaderConfig::default());
    }
}
