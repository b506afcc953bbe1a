use dotenvy::dotenv;
use std::env;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    // Supabase
    pub supabase_url:              String,
    pub supabase_anon_key:         String,
    pub supabase_service_role_key: String,
    pub supabase_timeout_secs:     u64,

    // Backend
    pub backend_host:     String,
    pub backend_port:     u16,

    // Email
    pub smtp_host:        String,
    pub smtp_port:        u16,
    pub smtp_user:        String,
    pub smtp_password:    String,
    pub smtp_from:        String,

    // App
    pub app_env:          String,
    pub app_base_url:     String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let require = |key: &str| {
            get(key).ok_or_else(|| ConfigError::MissingVar(key.to_string()))
        };

        fn parse_or<T: std::str::FromStr>(
            key: &str,
            raw: Option<String>,
            default: T,
        ) -> Result<T, ConfigError> {
            match raw {
                Some(raw) => raw
                    .parse::<T>()
                    .map_err(|_| ConfigError::InvalidValue(key.to_string(), raw)),
                None => Ok(default),
            }
        }

        let supabase_url = require("SUPABASE_URL")?;
        url::Url::parse(&supabase_url)
            .map_err(|_| ConfigError::InvalidValue("SUPABASE_URL".into(), supabase_url.clone()))?;

        Ok(Self {
            supabase_url:              supabase_url.trim_end_matches('/').to_owned(),
            supabase_anon_key:         require("SUPABASE_ANON_KEY")?,
            supabase_service_role_key: require("SUPABASE_SERVICE_ROLE_KEY")?,
            supabase_timeout_secs:     parse_or("SUPABASE_TIMEOUT_SECS", get("SUPABASE_TIMEOUT_SECS"), 10)?,

            backend_host: get("BACKEND_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            backend_port: parse_or("BACKEND_PORT", get("BACKEND_PORT"), 8080)?,

            smtp_host:     get("SMTP_HOST").unwrap_or_default(),
            smtp_port:     parse_or("SMTP_PORT", get("SMTP_PORT"), 587)?,
            smtp_user:     get("SMTP_USER").unwrap_or_default(),
            smtp_password: get("SMTP_PASSWORD").unwrap_or_default(),
            smtp_from:     get("SMTP_FROM").unwrap_or_default(),

            app_env:      get("APP_ENV").unwrap_or_else(|| "development".into()),
            app_base_url: get("APP_BASE_URL")
                .unwrap_or_else(|| "http://localhost:3000".into())
                .trim_end_matches('/')
                .to_owned(),
        })
    }

    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }

    /// Where magic links (login and invite) send the browser back to.
    pub fn callback_url(&self) -> String {
        format!("{}/auth/callback", self.app_base_url)
    }
}
