use crate::error::{Error, Result};
use crate::models::course::Category;
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

pub const DEFAULT_MAX_IMPORT_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 120;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub public_rps: u32,
    pub course_api_url: Option<String>,
    pub course_api_token: Option<String>,
    pub uploads_dir: String,
    pub max_import_bytes: usize,
    pub session_ttl_minutes: i64,
    pub categories: Vec<Category>,
    pub cors_allowed_origins: Vec<String>,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            public_rps: get_env_parse("PUBLIC_RPS")?,
            course_api_url: get_env_optional("COURSE_API_URL"),
            course_api_token: get_env_optional("COURSE_API_TOKEN"),
            uploads_dir: get_env_optional("UPLOADS_DIR").unwrap_or_else(|| "./uploads".to_string()),
            max_import_bytes: get_env_parse_or("MAX_IMPORT_BYTES", DEFAULT_MAX_IMPORT_BYTES)?,
            session_ttl_minutes: get_env_parse_or(
                "SESSION_TTL_MINUTES",
                DEFAULT_SESSION_TTL_MINUTES,
            )?,
            categories: get_env_optional("COURSE_CATEGORIES")
                .map(|raw| parse_categories(&raw))
                .transpose()?
                .unwrap_or_default(),
            cors_allowed_origins: get_env_optional("CORS_ALLOWED_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

/// Parses `id=name;id=name`.
pub fn parse_categories(raw: &str) -> Result<Vec<Category>> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (id, name) = entry.split_once('=').ok_or_else(|| {
                Error::Config(format!(
                    "Invalid COURSE_CATEGORIES entry '{}', expected id=name",
                    entry
                ))
            })?;
            Ok(Category {
                id: id.trim().to_string(),
                name: name.trim().to_string(),
            })
        })
        .collect()
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_parse<T>(name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_env(name)?;
    raw.trim()
        .parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get_env_optional(name) {
        Some(_) => get_env_parse(name),
        None => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
