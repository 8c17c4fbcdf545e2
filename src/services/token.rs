//! Token service for JWT validation and household-key derivation
//!
//! Issuance lives outside this service (the household onboarding flow signs
//! tokens elsewhere); here we only validate and derive. Security notes:
//! - Algorithm explicitly HS256 (prevents algorithm confusion attacks)
//! - exp, iat, sub required; sub carries the household key
//! - Access tokens only — a refresh token is never accepted as access

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::errors::AppError;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject: the household key
    pub sub: String,
    /// Token type: "access" or "refresh"
    pub token_type: TokenType,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_expiry_seconds: i64,
}

impl TokenService {
    pub fn new(config: &Config) -> Self {
        let secret = config.jwt_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_expiry_seconds: config.jwt_access_expiry_seconds,
        }
    }

    /// Generate an access token for a household (dev tooling and tests)
    pub fn generate_access_token(&self, household_key: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.access_expiry_seconds);

        let claims = Claims {
            sub: household_key.to_string(),
            token_type: TokenType::Access,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: generate_jti(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    /// Validate and decode a token
    pub fn validate_token(&self, token: &str) -> Result<TokenData<Claims>, AppError> {
        let mut validation = Validation::default();
        // Explicitly set required claims; default algorithm is HS256 only
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken,
        })
    }

    /// Validate an access token and derive the household key from it
    pub fn household_key_from_token(&self, token: &str) -> Result<String, AppError> {
        let token_data = self.validate_token(token)?;

        if token_data.claims.token_type != TokenType::Access {
            return Err(AppError::InvalidToken);
        }
        if token_data.claims.sub.is_empty() {
            return Err(AppError::InvalidToken);
        }

        Ok(token_data.claims.sub)
    }
}

/// Generate a unique JWT ID
fn generate_jti() -> String {
    let mut rng = rand::thread_rng();
    let random_bytes: [u8; 16] = rng.gen();
    hex::encode(random_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn config() -> Config {
        Config {
            database_url: None,
            jwt_secret: SecretString::from("a-test-secret-at-least-32-bytes!".to_string()),
            jwt_access_expiry_seconds: 900,
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_origin: "http://localhost:3000".to_string(),
            app_env: crate::config::AppEnv::Development,
            ocr_api_key: None,
        }
    }

    #[test]
    fn round_trip_derives_household_key() {
        let service = TokenService::new(&config());
        let token = service.generate_access_token("hh-42").unwrap();
        assert_eq!(service.household_key_from_token(&token).unwrap(), "hh-42");
    }

    #[test]
    fn garbage_tokens_are_invalid() {
        let service = TokenService::new(&config());
        assert!(matches!(
            service.household_key_from_token("not-a-jwt"),
            Err(AppError::InvalidToken)
        ));
    }
}
