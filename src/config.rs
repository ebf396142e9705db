// config.rs
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    /// Token lifetime in minutes.
    pub jwt_maxage: i64,
    /// Refresh token lifetime in minutes.
    pub jwt_refresh_maxage: i64,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub run_migrations: bool,
    pub app_debug: bool,
    pub log_level: String,
}

impl Config {
    pub fn init() -> Result<Config, String> {
        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET_KEY")?;

        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Config {
            database_url,
            database_max_connections: parsed("DATABASE_MAX_CONNECTIONS", 10)?,
            jwt_secret,
            jwt_maxage: parsed("JWT_MAXAGE", 60)?,
            jwt_refresh_maxage: parsed("JWT_REFRESH_MAXAGE", 60 * 24 * 7)?,
            port: parsed("PORT", 8000)?,
            allowed_origins,
            run_migrations: parsed("RUN_MIGRATIONS", true)?,
            app_debug: parsed("APP_DEBUG", false)?,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "debug".to_string()),
        })
    }
}

fn required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("{} must be set", key))
}

fn parsed<T: FromStr>(key: &str, default: T) -> Result<T, String> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| format!("{} has an invalid value: {}", key, value)),
        Err(_) => Ok(default),
    }
}
