use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use super::error::ApiError;
use crate::config::AuthConfig;
use crate::db::{LoginRequest, LoginResponse, NewSession, NewUser, Role, User};
use crate::inventory::validation::validate_email;
use crate::store::{store_timestamp, InventoryStore, StoreError};
use crate::AppState;

pub const SESSION_COOKIE: &str = "stockroom_session";

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Generate a random session token
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Hash a token for storage
pub(crate) fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Bearer header first, then the session cookie
fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization").and_then(|h| h.to_str().ok()) {
        if let Some(token) = auth_header.strip_prefix("Bearer ") {
            return Some(token.to_string());
        }
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
}

fn session_cookie(token: String, config: &AuthConfig) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookie)
        .same_site(SameSite::Lax)
        .build()
}

/// Create an account. Used by the CLI and by the startup bootstrap.
pub async fn register_user(
    store: &dyn InventoryStore,
    email: &str,
    password: &str,
    role: Role,
) -> Result<(), ApiError> {
    let email = email.trim().to_lowercase();
    validate_email(&email)?;
    if password.len() < 8 {
        return Err(ApiError::validation_field(
            "password",
            "Password must be at least 8 characters",
        ));
    }

    let password_hash = hash_password(password)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?;

    store
        .insert_user(&NewUser {
            email: email.clone(),
            password_hash,
            role,
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict => ApiError::conflict(format!("User {} already exists", email)),
            other => other.into(),
        })?;

    tracing::info!(user = %email, role = %role, "Created user");
    Ok(())
}

/// Create the configured bootstrap staff account if it does not exist yet
pub async fn ensure_bootstrap_user(
    store: &dyn InventoryStore,
    config: &AuthConfig,
) -> anyhow::Result<()> {
    let (Some(email), Some(password)) = (&config.bootstrap_email, &config.bootstrap_password)
    else {
        return Ok(());
    };

    if store.find_user(&email.trim().to_lowercase()).await?.is_some() {
        tracing::debug!(user = %email, "Bootstrap user already exists");
        return Ok(());
    }

    register_user(store, email, password, Role::Staff).await?;
    tracing::info!(user = %email, "Created bootstrap staff user");
    Ok(())
}

/// Login endpoint
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let email = request.email.trim().to_lowercase();
    if email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let store = state.inventory.store();
    let record = store.find_user(&email).await?;
    let record = match record {
        Some(r) if verify_password(&request.password, &r.password_hash) => r,
        _ => {
            tracing::warn!(user = %email, "Failed login attempt");
            return Err(ApiError::unauthorized("Invalid email or password"));
        }
    };

    let now = chrono::Utc::now();
    let purged = store.purge_expired_sessions(&store_timestamp(now)).await?;
    if purged > 0 {
        tracing::debug!(purged, "Removed expired sessions");
    }

    let token = generate_token();
    let expires_at = now + chrono::Duration::hours(state.config.auth.session_ttl_hours);

    store
        .insert_session(&NewSession {
            user_id: record.id.clone(),
            token_hash: hash_token(&token),
            expires_at: store_timestamp(expires_at),
        })
        .await?;

    let user = User::from(record);
    tracing::info!(user = %user.email, role = %user.role, "User logged in");

    let jar = jar.add(session_cookie(token.clone(), &state.config.auth));
    Ok((jar, Json(LoginResponse { token, user })))
}

/// Logout endpoint. Deletes the session behind the presented token.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = extract_token(&headers) {
        state
            .inventory
            .store()
            .delete_session(&hash_token(&token))
            .await?;
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/").build());
    Ok((jar, StatusCode::NO_CONTENT))
}

/// Current user endpoint
pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

/// The authenticated user, resolved from the session on every request
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

        let now = store_timestamp(chrono::Utc::now());
        let user = state
            .inventory
            .store()
            .find_session_user(&hash_token(&token), &now)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Session expired or invalid"))?;

        Ok(CurrentUser(user))
    }
}

/// An authenticated user with the staff role
#[derive(Debug, Clone)]
pub struct StaffUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for StaffUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if user.role != Role::Staff {
            tracing::warn!(user = %user.email, path = %parts.uri.path(), "Staff-only route refused");
            return Err(ApiError::forbidden(
                "This action is only available to academic support staff",
            ));
        }
        Ok(StaffUser(user))
    }
}
