use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Without it attempt lists are cached in process memory.
    pub redis_url: Option<String>,
    /// Exposes storage failure details in error responses.
    pub debug: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: std::env::var("HOST").context("Cannot load HOST env variable")?,
            port: std::env::var("PORT")
                .context("PORT must be a number")?
                .parse()?,
            database_url: std::env::var("DATABASE_URL")
                .context("Cannot load DATABASE_URL env variable")?,
            redis_url: std::env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            debug: std::env::var("DEBUG")
                .map(|value| parse_flag(&value))
                .unwrap_or(false),
        })
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}
