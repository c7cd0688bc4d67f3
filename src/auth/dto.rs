use jsonwebtoken::{DecodingKey, EncodingKey};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::{extract::Validate, store::types::User};

use super::services::is_valid_email;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Token type used to distinguish Access and Refresh JWTs.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    #[serde(alias = "Access")]
    Access,
    #[serde(alias = "Refresh")]
    Refresh,
}

/// Standard JWT claims used in the app.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,       // user ID
    pub email: String,   // identity used by debate operations
    pub exp: usize,      // expiration time
    pub iat: usize,      // issued at
    pub iss: String,     // issuer
    pub aud: String,     // audience
    pub kind: TokenKind, // access or refresh
}

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

/// Request body for registration. `provider` marks federated sign-in,
/// which carries no password.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub password: Option<String>,
    pub provider: Option<String>,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), String> {
        if !is_valid_email(self.email.trim()) {
            return Err("Invalid email".into());
        }
        if self.provider.is_none() {
            let long_enough = self
                .password
                .as_deref()
                .is_some_and(|p| p.trim().chars().count() >= MIN_PASSWORD_LEN);
            if !long_enough {
                return Err(format!(
                    "Password must be minimum {MIN_PASSWORD_LEN} characters long."
                ));
            }
        }
        Ok(())
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), String> {
        if !is_valid_email(self.email.trim()) {
            return Err("Invalid email".into());
        }
        Ok(())
    }
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

impl Validate for RefreshRequest {
    fn validate(&self) -> Result<(), String> {
        if self.refresh_token.is_empty() {
            return Err("refreshToken is required".into());
        }
        Ok(())
    }
}

/// Response returned after login, register or refresh.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: PublicUser,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub email: String,
    pub name: String,
    pub image: Option<String>,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            email: u.email,
            name: u.name,
            image: u.image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(password: Option<&str>, provider: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            email: "ada@example.com".into(),
            name: Some("Ada".into()),
            image: None,
            password: password.map(Into::into),
            provider: provider.map(Into::into),
        }
    }

    #[test]
    fn local_registration_needs_a_password() {
        assert!(register(None, None).validate().is_err());
        assert!(register(Some("12345"), None).validate().is_err());
        assert!(register(Some("123456"), None).validate().is_ok());
    }

    #[test]
    fn federated_registration_needs_no_password() {
        assert!(register(None, Some("google")).validate().is_ok());
    }

    #[test]
    fn token_kind_accepts_both_casings() {
        let k: TokenKind = serde_json::from_str("\"Refresh\"").unwrap();
        assert_eq!(k, TokenKind::Refresh);
        assert_eq!(serde_json::to_string(&TokenKind::Access).unwrap(), "\"access\"");
    }

    #[test]
    fn public_user_hides_password_hash() {
        let json = serde_json::to_string(&PublicUser {
            email: "test@example.com".into(),
            name: "Test".into(),
            image: None,
        })
        .unwrap();
        assert!(json.contains("test@example.com"));
        assert!(!json.contains("password"));
    }
}
