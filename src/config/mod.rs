use serde::Deserialize;
use thiserror::Error;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
}

// Настройки приложения
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
}

// Настройки базы данных
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

// Origins allowed to call the API from a browser dashboard
#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Source(#[from] config::ConfigError),
}

/// Flat view of the process environment, one field per variable.
#[derive(Debug, Deserialize)]
struct EnvSettings {
    host: String,
    port: u16,
    environment: String,
    rust_log: String,
    database_url: String,
    db_pool_size: u32,
    cors_allowed_origins: Vec<String>,
}

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_RUST_LOG: &str = "ticket_booking=debug,tower_http=debug";
const DEFAULT_DATABASE_URL: &str = "sqlite://ticket_booking.db";
const DEFAULT_POOL_SIZE: u32 = 5;
const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:8501", "http://127.0.0.1:8501"];

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .set_default("host", DEFAULT_HOST)?
            .set_default("port", i64::from(DEFAULT_PORT))?
            .set_default("environment", DEFAULT_ENVIRONMENT)?
            .set_default("rust_log", DEFAULT_RUST_LOG)?
            .set_default("database_url", DEFAULT_DATABASE_URL)?
            .set_default("db_pool_size", i64::from(DEFAULT_POOL_SIZE))?
            .set_default("cors_allowed_origins", DEFAULT_CORS_ORIGINS.to_vec())?
            .add_source(
                config::Environment::default()
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_allowed_origins"),
            )
            .build()?
            .try_deserialize::<EnvSettings>()?;

        Ok(settings.into())
    }

    pub fn is_production(&self) -> bool {
        self.app.environment == "production"
    }
}

impl From<EnvSettings> for Config {
    fn from(env: EnvSettings) -> Self {
        Config {
            app: AppConfig {
                host: env.host,
                port: env.port,
                environment: env.environment,
                rust_log: env.rust_log,
            },
            database: DatabaseConfig {
                url: env.database_url,
                pool_size: env.db_pool_size.max(1),
            },
            cors: CorsConfig {
                allowed_origins: env
                    .cors_allowed_origins
                    .into_iter()
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect(),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            app: AppConfig {
                host: DEFAULT_HOST.to_string(),
                port: DEFAULT_PORT,
                environment: DEFAULT_ENVIRONMENT.to_string(),
                rust_log: DEFAULT_RUST_LOG.to_string(),
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                pool_size: DEFAULT_POOL_SIZE,
            },
            cors: CorsConfig {
                allowed_origins: DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_sqlite_file() {
        let config = Config::default();
        assert_eq!(config.app.port, 8000);
        assert_eq!(config.database.url, "sqlite://ticket_booking.db");
        assert!(!config.is_production());
        assert_eq!(config.cors.allowed_origins.len(), 2);
    }

    #[test]
    fn env_settings_are_normalised() {
        let config: Config = EnvSettings {
            host: "127.0.0.1".into(),
            port: 9000,
            environment: "production".into(),
            rust_log: "info".into(),
            database_url: "sqlite::memory:".into(),
            db_pool_size: 0,
            cors_allowed_origins: vec![" http://a.test ".into(), "".into()],
        }
        .into();

        assert!(config.is_production());
        assert_eq!(config.database.pool_size, 1);
        assert_eq!(config.cors.allowed_origins, vec!["http://a.test".to_string()]);
    }
}
