use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

use crate::import::ReconcileOptions;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub api_prefix: String,

    // Rate limiting
    pub rate_import_per_min: u32,

    // Attendance import
    pub import_concurrency: usize,
    pub import_work_type: String,
    pub max_upload_bytes: usize,

    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            rate_import_per_min: parse_var("RATE_IMPORT_PER_MIN", 30)?,

            import_concurrency: parse_var("IMPORT_CONCURRENCY", 4)?,
            import_work_type: env::var("IMPORT_WORK_TYPE").unwrap_or_else(|_| "office".to_string()),
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?, // 10 MiB

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
        })
    }

    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            concurrency: self.import_concurrency,
            default_work_type: self.import_work_type.clone(),
        }
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self {
            database_url: "mysql://localhost/hrm_test".to_string(),
            jwt_secret: "test-secret".to_string(),
            server_addr: "127.0.0.1:0".to_string(),
            api_prefix: "/api".to_string(),
            rate_import_per_min: 30,
            import_concurrency: 4,
            import_work_type: "office".to_string(),
            max_upload_bytes: 1024 * 1024,
            log_dir: "logs".to_string(),
        }
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{key} must be a number, got '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_numbers_are_errors() {
        let err = parse_value::<u32>("RATE_IMPORT_PER_MIN", "lots").unwrap_err();
        assert!(err.to_string().contains("RATE_IMPORT_PER_MIN"));
        assert_eq!(parse_value::<usize>("IMPORT_CONCURRENCY", " 8 ").unwrap(), 8);
    }

    #[test]
    fn reconcile_options_follow_config() {
        let config = Config {
            import_concurrency: 2,
            import_work_type: "remote".to_string(),
            ..Config::for_tests()
        };
        let options = config.reconcile_options();
        assert_eq!(options.concurrency, 2);
        assert_eq!(options.default_work_type, "remote");
    }
}
