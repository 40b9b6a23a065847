use secrecy::Secret;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Public URL of this console; printed into sticker QR codes
    pub base_url: String,
    pub host: String,
    pub port: u16,

    // Levy backend REST API
    pub backend_api_url: String,
    pub backend_api_token: Option<Secret<String>>,
    pub backend_timeout: Duration,

    // Local scan history
    pub history_dir: PathBuf,

    // Session cookies
    pub secure_cookies: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for local development)
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 3000)?
            .set_default("history_dir", "./data")?
            .set_default("backend_timeout_secs", 30)?
            .set_default("secure_cookies", true)?
            .add_source(config::Environment::default().separator("__"))
            .build()?;

        Ok(Self {
            base_url: config.get("base_url")?,
            host: config.get("host")?,
            port: config.get("port")?,

            backend_api_url: config.get("backend_api_url")?,
            backend_api_token: config
                .get::<String>("backend_api_token")
                .ok()
                .map(Secret::new),
            backend_timeout: Duration::from_secs(config.get("backend_timeout_secs")?),

            history_dir: PathBuf::from(config.get::<String>("history_dir")?),

            secure_cookies: config.get("secure_cookies")?,
        })
    }
}
