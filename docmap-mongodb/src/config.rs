//! Environment-driven connection configuration.

use std::env;

/// Connection settings resolved from the process environment.
///
/// | Variable                 | Default                |
/// |--------------------------|------------------------|
/// | `DOCMAP_MONGO_HOST`      | `localhost`            |
/// | `DOCMAP_MONGO_PORT`      | `27017`                |
/// | `DOCMAP_MONGO_DATABASE`  | `docmap_<environment>` |
/// | `DOCMAP_ENV`             | `development`          |
#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub host: String,
    pub port: String,
    pub database: String,
    pub environment: String,
}

impl MongoConfig {
    /// Reads the configuration from the environment, filling defaults for
    /// anything unset.
    pub fn from_env() -> Self {
        let environment =
            env::var("DOCMAP_ENV").unwrap_or_else(|_| "development".to_string());
        let database = env::var("DOCMAP_MONGO_DATABASE")
            .unwrap_or_else(|_| format!("docmap_{environment}"));

        Self {
            host: env::var("DOCMAP_MONGO_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("DOCMAP_MONGO_PORT").unwrap_or_else(|_| "27017".to_string()),
            database,
            environment,
        }
    }

    /// The driver connection string for these settings.
    pub fn connection_string(&self) -> String {
        format!("mongodb://{}:{}", self.host, self.port)
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_string_joins_host_and_port() {
        let config = MongoConfig {
            host: "db.internal".to_string(),
            port: "28018".to_string(),
            database: "docmap_test".to_string(),
            environment: "test".to_string(),
        };

        assert_eq!(config.connection_string(), "mongodb://db.internal:28018");
    }
}
