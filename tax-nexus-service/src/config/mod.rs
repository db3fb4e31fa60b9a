use nexus_core::config::{self as core_config, get_env};
use nexus_core::error::AppError;
use secrecy::Secret;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub storage: StorageBackend,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: Secret<String>,
    pub database: String,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Mongo,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Memory => "memory",
            StorageBackend::Mongo => "mongo",
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "mongo" | "mongodb" => Ok(StorageBackend::Mongo),
            _ => Err(format!("Invalid storage backend: {}", s)),
        }
    }
}

impl ServiceConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let is_prod = common.is_prod();

        Ok(ServiceConfig {
            mongodb: MongoConfig {
                uri: Secret::new(get_env(
                    "MONGODB_URI",
                    Some("mongodb://localhost:27017"),
                    is_prod,
                )?),
                database: get_env("MONGODB_DATABASE", Some("tax_nexus"), is_prod)?,
            },
            storage: get_env("STORAGE_BACKEND", Some("mongo"), is_prod)?
                .parse()
                .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
            common,
        })
    }
}
