use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_LOGIN_PATH: &str = "/login";
pub const DEFAULT_CREDENTIALS_PATH: &str = ".coursedesk/credentials.json";
/// Upper bound for the access cookie lifetime, one year
pub const MAX_ACCESS_TOKEN_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api_url: String,
    pub log_format: LogFormat,
    pub access_token_ttl_hours: i64,
    /// Zero disables GET response caching
    pub cache_ttl_secs: u64,
    pub request_timeout_secs: Option<u64>,
    pub credentials_path: PathBuf,
    pub login_path: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let config = Config {
            api_url: env::var("API_URL")
                .or_else(|_| env::var("VITE_API_URL"))
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "json" => LogFormat::Json,
                    _ => LogFormat::Pretty,
                })?,
            access_token_ttl_hours: env::var("ACCESS_TOKEN_TTL_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()?,
            cache_ttl_secs: env::var("CACHE_TTL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()?,
            request_timeout_secs: match env::var("REQUEST_TIMEOUT_SECS") {
                Ok(value) => Some(value.parse()?),
                Err(_) => None,
            },
            credentials_path: env::var("CREDENTIALS_PATH")
                .unwrap_or_else(|_| DEFAULT_CREDENTIALS_PATH.to_string())
                .into(),
            login_path: env::var("LOGIN_PATH").unwrap_or_else(|_| DEFAULT_LOGIN_PATH.to_string()),
        };

        config.validate()?;

        Ok(config)
    }

    /// Defaults for everything except the backend location
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            log_format: LogFormat::Pretty,
            access_token_ttl_hours: 24,
            cache_ttl_secs: 60,
            request_timeout_secs: None,
            credentials_path: DEFAULT_CREDENTIALS_PATH.into(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(format!("API_URL must be an http(s) URL, got '{}'", self.api_url));
        }
        if !(1..=MAX_ACCESS_TOKEN_TTL_HOURS).contains(&self.access_token_ttl_hours) {
            return Err(format!(
                "ACCESS_TOKEN_TTL_HOURS must be between 1 and {}",
                MAX_ACCESS_TOKEN_TTL_HOURS
            ));
        }
        if !self.login_path.starts_with('/') {
            return Err("LOGIN_PATH must be an absolute path".to_string());
        }
        Ok(())
    }

    /// Cookies written by the client carry `secure` when the backend is served over TLS
    pub fn uses_tls(&self) -> bool {
        self.api_url.starts_with("https://")
    }

    pub fn access_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.access_token_ttl_hours)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
