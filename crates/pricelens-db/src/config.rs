use std::path::PathBuf;

use pricelens_core::AppError;

/// Configuration for the local storage file.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub path: PathBuf,
    pub max_connections: u32,
}

impl StorageConfig {
    /// Read configuration from environment variables.
    ///
    /// - `PRICELENS_DB` (optional, defaults to `pricelens.db` in the
    ///   current directory)
    /// - `PRICELENS_DB_MAX_CONNECTIONS` (optional, defaults to 5)
    pub fn from_env() -> Result<Self, AppError> {
        let path = std::env::var("PRICELENS_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("pricelens.db"));

        let max_connections = match std::env::var("PRICELENS_DB_MAX_CONNECTIONS") {
            Err(_) => 5,
            Ok(raw) => {
                let parsed: u32 = raw.parse().map_err(|_| {
                    AppError::ConfigError(format!(
                        "Invalid PRICELENS_DB_MAX_CONNECTIONS '{raw}': must be a positive integer"
                    ))
                })?;
                if parsed == 0 {
                    return Err(AppError::ConfigError(
                        "PRICELENS_DB_MAX_CONNECTIONS must be at least 1".into(),
                    ));
                }
                parsed
            }
        };

        Ok(Self {
            path,
            max_connections,
        })
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("pricelens.db"),
            max_connections: 5,
        }
    }
}
