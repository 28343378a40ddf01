use anyhow::{Context, Result, anyhow};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    MySql,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mysql" => Ok(StorageBackend::MySql),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow!("unknown storage backend '{other}', expected mysql or memory")),
        }
    }
}

/// Administrator created at startup when no account with this username exists.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
    pub email: String,
    pub id_administrator: String,
    pub phone_number: u64,
}

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_attendance_per_min: u32,
    pub rate_protected_per_min: u32,

    pub document_cache_ttl: u64,

    pub log_dir: String,
    pub log_level: tracing::Level,

    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).with_context(|| format!("{key} must be set"));

        let storage_backend = match lookup("STORAGE_BACKEND") {
            Some(v) => v.parse()?,
            None => StorageBackend::MySql,
        };

        let database_url = lookup("DATABASE_URL");
        if storage_backend == StorageBackend::MySql && database_url.is_none() {
            return Err(anyhow!("DATABASE_URL must be set when STORAGE_BACKEND is mysql"));
        }

        let bootstrap_admin = match (lookup("ADMIN_USERNAME"), lookup("ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some(BootstrapAdmin {
                email: required("ADMIN_EMAIL")?,
                id_administrator: required("ADMIN_ID")?,
                phone_number: parse_number(&lookup, "ADMIN_PHONE", None)?,
                username,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            storage_backend,
            database_url,
            db_max_connections: parse_number(&lookup, "DB_MAX_CONNECTIONS", Some(10))?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: parse_number(&lookup, "ACCESS_TOKEN_TTL", Some(900))?, // 15 min
            refresh_token_ttl: parse_number(&lookup, "REFRESH_TOKEN_TTL", Some(86_400))?, // 1 day

            rate_login_per_min: parse_number(&lookup, "RATE_LOGIN_PER_MIN", Some(60))?,
            rate_refresh_per_min: parse_number(&lookup, "RATE_REFRESH_PER_MIN", Some(30))?,
            rate_attendance_per_min: parse_number(&lookup, "RATE_ATTENDANCE_PER_MIN", Some(120))?,
            rate_protected_per_min: parse_number(&lookup, "RATE_PROTECTED_PER_MIN", Some(1000))?,

            document_cache_ttl: parse_number(&lookup, "DOCUMENT_CACHE_TTL", Some(600))?,

            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            log_level: match lookup("LOG_LEVEL") {
                Some(v) => v
                    .parse()
                    .map_err(|_| anyhow!("LOG_LEVEL '{v}' is not a valid level"))?,
                None => tracing::Level::DEBUG,
            },

            bootstrap_admin,
        })
    }
}

fn parse_number<F, T>(lookup: &F, key: &str, default: Option<T>) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match (lookup(key), default) {
        (Some(raw), _) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a number, got '{raw}'")),
        (None, Some(default)) => Ok(default),
        (None, None) => Err(anyhow!("{key} must be set")),
    }
}
