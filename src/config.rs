use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub storage: StorageBackend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    DynamoDb,
    Memory,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            port: 4000,
            storage: StorageBackend::Memory,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {variable}: {value}")]
    Invalid { variable: String, value: String },
}

impl StorageBackend {
    fn parse(value: &str) -> Option<StorageBackend> {
        match value {
            "dynamodb" => Some(StorageBackend::DynamoDb),
            "memory" => Some(StorageBackend::Memory),
            _ => None,
        }
    }
}

impl AppConfig {
    /// Environment knobs: `PORT` and `REPORTER_STORAGE` (`memory` or
    /// `dynamodb`). Unknown values fail startup instead of silently
    /// falling back.
    pub fn from_env() -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::default();
        if let Ok(port) = std::env::var("PORT") {
            config.port = port.parse().map_err(|_| ConfigError::Invalid {
                variable: "PORT".to_string(),
                value: port.clone(),
            })?;
        }
        if let Ok(storage) = std::env::var("REPORTER_STORAGE") {
            config.storage =
                StorageBackend::parse(&storage).ok_or_else(|| ConfigError::Invalid {
                    variable: "REPORTER_STORAGE".to_string(),
                    value: storage.clone(),
                })?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_memory_on_port_4000() {
        let config = AppConfig::default();
        assert_eq!(config.port, 4000);
        assert_eq!(config.storage, StorageBackend::Memory);
    }

    #[test]
    fn storage_names_parse_exactly() {
        assert_eq!(
            StorageBackend::parse("dynamodb"),
            Some(StorageBackend::DynamoDb)
        );
        assert_eq!(StorageBackend::parse("memory"), Some(StorageBackend::Memory));
        assert_eq!(StorageBackend::parse("firestore"), None);
        assert_eq!(StorageBackend::parse("Memory"), None);
    }
}
