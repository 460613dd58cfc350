//! Database connection config artifact.
//!
//! A JSON object at `<user config dir>/zinspector/database.json`. The file
//! holds a plaintext credential, so it is written with owner-only (0600)
//! permissions.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Database connection parameters.
///
/// Host, database, user and password are mandatory; schema and port are
/// optional. The serialized key names are the on-disk artifact format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DbConfig {
    #[serde(rename = "DBHost")]
    pub host: String,

    #[serde(rename = "DBName")]
    pub database: String,

    #[serde(rename = "DBSchema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(rename = "DBUser")]
    pub user: String,

    #[serde(rename = "DBPassword")]
    pub password: String,

    #[serde(rename = "DBPort", default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl DbConfig {
    /// Default location of the config artifact.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(base.join("zinspector").join("database.json"))
    }

    /// Loads the config from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let data = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        tracing::info!("Database config loaded from {}", path.display());
        Ok(config)
    }

    /// Saves the config with owner-only permissions.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }

        tracing::info!("Database config saved to {}", path.display());
        Ok(())
    }

    /// Validates that every mandatory parameter is non-empty.
    ///
    /// Must hold before any connection attempt.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::MissingParameter("DBHost"));
        }
        if self.database.is_empty() {
            return Err(ConfigError::MissingParameter("DBName"));
        }
        if self.user.is_empty() {
            return Err(ConfigError::MissingParameter("DBUser"));
        }
        if self.password.is_empty() {
            return Err(ConfigError::MissingParameter("DBPassword"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> DbConfig {
        DbConfig {
            host: "db.example.net".into(),
            database: "zabbix".into(),
            schema: Some("zabbix".into()),
            user: "monitor".into(),
            password: "secret".into(),
            port: Some(5433),
        }
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("database.json");

        sample().save(&path).unwrap();
        let loaded = DbConfig::load(&path).unwrap();

        assert_eq!(loaded.host, "db.example.net");
        assert_eq!(loaded.schema.as_deref(), Some("zabbix"));
        assert_eq!(loaded.port, Some(5433));
    }

    #[test]
    fn test_artifact_key_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["DBHost"], "db.example.net");
        assert_eq!(json["DBName"], "zabbix");
        assert_eq!(json["DBUser"], "monitor");
        assert_eq!(json["DBPassword"], "secret");
        assert_eq!(json["DBPort"], 5433);
    }

    #[test]
    fn test_optional_fields_omitted() {
        let config = DbConfig {
            schema: None,
            port: None,
            ..sample()
        };
        let json = serde_json::to_value(config).unwrap();
        assert!(json.get("DBSchema").is_none());
        assert!(json.get("DBPort").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("database.json");
        sample().save(&path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_validate_rejects_empty_mandatory() {
        let mut config = sample();
        config.password = String::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingParameter("DBPassword"))
        ));

        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = DbConfig::load(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }
}
