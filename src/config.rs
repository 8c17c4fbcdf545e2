use secrecy::{ExposeSecret, SecretString};
use std::env;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn is_development(self) -> bool {
        self == AppEnv::Development
    }
}

#[derive(Clone)]
pub struct Config {
    /// Absent in dev mode: the in-memory store takes over
    pub database_url: Option<SecretString>,
    pub jwt_secret: SecretString,
    pub jwt_access_expiry_seconds: i64,
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
    pub app_env: AppEnv,
    /// Absent: the deterministic mock OCR provider takes over
    pub ocr_api_key: Option<SecretString>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let app_env = match env::var("APP_ENV").as_deref() {
            Ok("production") => AppEnv::Production,
            _ => AppEnv::Development,
        };

        let database_url = env::var("DATABASE_URL").ok();
        if database_url.is_none() && app_env == AppEnv::Production {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| ConfigError::Missing("JWT_SECRET"))?;

        // Validate JWT secret length (minimum 256 bits = 32 bytes)
        if jwt_secret.len() < 32 {
            return Err(ConfigError::InvalidValue(
                "JWT_SECRET must be at least 32 characters (256 bits)",
            ));
        }

        let jwt_access_expiry_seconds: i64 = env::var("JWT_ACCESS_EXPIRY_SECONDS")
            .unwrap_or_else(|_| "900".to_string()) // 15 minutes default
            .parse()
            .map_err(|_| ConfigError::InvalidValue("JWT_ACCESS_EXPIRY_SECONDS must be a number"))?;

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT must be a valid port number"))?;

        let cors_origin = env::var("CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        // Never committed; absence selects the mock provider
        let ocr_api_key = env::var("OCR_API_KEY").ok().map(SecretString::from);

        Ok(Self {
            database_url: database_url.map(SecretString::from),
            jwt_secret: SecretString::from(jwt_secret),
            jwt_access_expiry_seconds,
            host,
            port,
            cors_origin,
            app_env,
            ocr_api_key,
        })
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_ref().map(|url| url.expose_secret())
    }

    pub fn jwt_secret(&self) -> &str {
        self.jwt_secret.expose_secret()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    InvalidValue(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(var) => write!(f, "Missing environment variable: {}", var),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
