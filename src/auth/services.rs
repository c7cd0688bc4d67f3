pub(crate) use crate::auth::dto::{Claims, JwtKeys, TokenKind};
use crate::auth::dto::{AuthResponse, LoginRequest, RegisterRequest};
use crate::config::JwtConfig;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{types::{NewUser, User}, StoreError, UniqueKey};
use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::{async_trait, extract::{FromRef, FromRequestParts}, http::request::Parts};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use regex::Regex;
use std::time::Duration;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Compares secrets without short-circuiting on the first differing byte.
fn secrets_match(given: &str, expected: &str) -> bool {
    given.len() == expected.len()
        && given
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::from_config(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        let JwtConfig {
            secret,
            issuer,
            audience,
            ttl_minutes,
            refresh_ttl_minutes,
        } = cfg.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            access_ttl: Duration::from_secs((ttl_minutes.max(1) as u64) * 60),
            refresh_ttl: Duration::from_secs((refresh_ttl_minutes.max(1) as u64) * 60),
        }
    }

    fn sign_with_kind(&self, user: &User, kind: TokenKind) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user.id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    pub fn sign_access(&self, user: &User) -> anyhow::Result<String> {
        self.sign_with_kind(user, TokenKind::Access)
    }
    pub fn sign_refresh(&self, user: &User) -> anyhow::Result<String> {
        self.sign_with_kind(user, TokenKind::Refresh)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims)
    }

    pub fn verify_refresh(&self, token: &str) -> anyhow::Result<Claims> {
        let claims = self.verify(token)?;
        if claims.kind != TokenKind::Refresh {
            anyhow::bail!("not a refresh token");
        }
        Ok(claims)
    }

    /// Signs a fresh access/refresh pair for `user`.
    pub fn issue(&self, user: User) -> anyhow::Result<AuthResponse> {
        Ok(AuthResponse {
            access_token: self.sign_access(&user)?,
            refresh_token: self.sign_refresh(&user)?,
            user: user.into(),
        })
    }
}

/// Registers a local account, or signs in a federated one. Federated calls
/// must present the configured provider secret.
pub async fn register_user(
    state: &AppState,
    req: RegisterRequest,
    provider_secret: Option<&str>,
) -> Result<User, ApiError> {
    let email = normalize_email(&req.email);
    let name = req
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());
    let existing = state.store.find_user_by_email(&email).await?;

    let new_user = match req.provider {
        Some(provider) => {
            let trusted = match (&state.config.provider_secret, provider_secret) {
                (Some(expected), Some(given)) => secrets_match(given, expected),
                _ => false,
            };
            if !trusted {
                warn!(%email, %provider, "untrusted federated registration");
                return Err(ApiError::Forbidden("Federated sign-in is not allowed".into()));
            }
            if let Some(user) = existing {
                info!(user_id = %user.id, %provider, "federated user signed in");
                return Ok(user);
            }
            NewUser {
                email,
                name,
                image: req.image,
                password_hash: None,
                provider: Some(provider),
                created_at: state.clock.now(),
            }
        }
        None => {
            if existing.is_some() {
                warn!(%email, "email already registered");
                return Err(already_registered());
            }
            let password = req.password.unwrap_or_default();
            let hash = hash_password(password.trim())?;
            NewUser {
                email,
                name,
                image: req.image,
                password_hash: Some(hash),
                provider: None,
                created_at: state.clock.now(),
            }
        }
    };

    match state.store.create_user(new_user).await {
        Ok(user) => {
            info!(user_id = %user.id, email = %user.email, "user registered");
            Ok(user)
        }
        Err(StoreError::Conflict(UniqueKey::UserEmail)) => Err(already_registered()),
        Err(e) => Err(e.into()),
    }
}

fn already_registered() -> ApiError {
    ApiError::Conflict("Already registered. Please login/continue with google.".into())
}

/// Checks email and password against the stored Argon2 hash.
pub async fn authenticate(state: &AppState, req: LoginRequest) -> Result<User, ApiError> {
    let email = normalize_email(&req.email);
    let user = state
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| {
            warn!(%email, "login unknown email");
            ApiError::Unauthorized("Please register first!".into())
        })?;

    let Some(hash) = user.password_hash.as_deref() else {
        warn!(user_id = %user.id, "password login on federated account");
        return Err(ApiError::Unauthorized(
            "This account signs in with its provider".into(),
        ));
    };
    if !verify_password(req.password.trim(), hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized("Wrong password!".into()));
    }
    info!(user_id = %user.id, "user logged in");
    Ok(user)
}

/// Authenticated caller, taken from a Bearer access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("You are not authorized".into()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization header".into()))?;

        let claims = match keys.verify(token) {
            Ok(c) => c,
            Err(_) => {
                warn!("invalid or expired token");
                return Err(ApiError::Unauthorized("Invalid or expired token".into()));
            }
        };

        if claims.kind != TokenKind::Access {
            return Err(ApiError::Unauthorized("Access token required".into()));
        }

        Ok(AuthUser {
            id: claims.sub,
            email: claims.email,
        })
    }
}
