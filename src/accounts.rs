//! User accounts: registration, login, and the password-reset flow.
//!
//! Passwords are stored as argon2 hashes. Reset tokens are random 32-byte
//! values handed out base64url-encoded; only their sha-256 hash is kept at
//! rest, and they are single-use with a fixed expiry.

use std::sync::{Arc, RwLock};

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{Duration, Utc};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::{PasswordResetToken, User};
use crate::error::{FieldError, ServiceError};
use crate::store::MemoryStore;

const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;
const DEFAULT_ROLE: &str = "CUSTOMER";

/// Out-of-band delivery for reset tokens.
pub trait Mailer: Send + Sync {
    fn send_reset_token(&self, email: &str, token: &str) -> Result<(), ServiceError>;
}

/// Test double that records every (email, token) pair instead of sending.
#[derive(Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<RwLock<Vec<(String, String)>>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.read().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Mailer for RecordingMailer {
    fn send_reset_token(&self, email: &str, token: &str) -> Result<(), ServiceError> {
        self.sent
            .write()
            .map_err(|_| ServiceError::Internal("mailer recorder lock poisoned".into()))?
            .push((email.to_string(), token.to_string()));
        Ok(())
    }
}

/// Default mailer: logs that a token was issued, never the token itself.
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send_reset_token(&self, email: &str, _token: &str) -> Result<(), ServiceError> {
        tracing::info!(%email, "password reset token issued");
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Clone)]
pub struct AccountService {
    store: MemoryStore,
    mailer: Arc<dyn Mailer>,
    token_ttl: Duration,
}

impl AccountService {
    pub fn new(store: MemoryStore, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            store,
            mailer,
            token_ttl: Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
        }
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn register(&self, input: RegisterInput) -> Result<User, ServiceError> {
        let mut errors = Vec::new();
        if !input.email.contains('@') {
            errors.push(FieldError::new("email", "must be a valid email address"));
        }
        if input.password.len() < 8 {
            errors.push(FieldError::new("password", "must be at least 8 characters"));
        }
        if input.first_name.trim().is_empty() {
            errors.push(FieldError::new("first_name", "must not be empty"));
        }
        if !errors.is_empty() {
            return Err(ServiceError::Validation(errors));
        }

        if self.store.user_by_email(&input.email)?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "email '{}' is already registered",
                input.email
            )));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: input.email,
            password_hash: hash_password(&input.password)?,
            first_name: input.first_name,
            last_name: input.last_name,
            role: input
                .role
                .map(|r| r.to_ascii_uppercase())
                .unwrap_or_else(|| DEFAULT_ROLE.to_string()),
            active: true,
        };
        self.store.put_user(user.clone())?;
        tracing::info!(user = %user.id, "account registered");
        Ok(user)
    }

    /// Verify credentials. One error for every failure mode, so the caller
    /// learns nothing about which part was wrong.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<User, ServiceError> {
        let invalid = || ServiceError::Unauthorized("invalid credentials".into());
        let user = self.store.user_by_email(email)?.ok_or_else(invalid)?;
        if !user.active || !verify_password(password, &user.password_hash) {
            return Err(invalid());
        }
        Ok(user)
    }

    pub fn user(&self, id: Uuid) -> Result<User, ServiceError> {
        self.store
            .user(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("user {}", id)))
    }

    /// Request a password reset. Always succeeds, whether or not the email
    /// is registered — the response must not reveal which.
    pub fn request_reset(&self, email: &str) -> Result<(), ServiceError> {
        let Some(user) = self.store.user_by_email(email)? else {
            return Ok(());
        };

        let raw = generate_token();
        let now = Utc::now();
        let token = PasswordResetToken {
            id: Uuid::new_v4(),
            token_hash: hash_token(&raw),
            user_id: user.id,
            expires_at: now + self.token_ttl,
            created_at: now,
            used: false,
        };
        self.store.put_reset_token(token)?;
        self.mailer.send_reset_token(&user.email, &raw)?;
        Ok(())
    }

    /// Consume a reset token and set the new password. Unknown, used, and
    /// expired tokens are all rejected the same way.
    pub fn confirm_reset(&self, raw_token: &str, new_password: &str) -> Result<(), ServiceError> {
        let rejected = || ServiceError::InvalidArgument("invalid or expired reset token".into());

        let token = self
            .store
            .reset_token_by_hash(&hash_token(raw_token))?
            .ok_or_else(rejected)?;
        if token.used || token.expires_at <= Utc::now() {
            return Err(rejected());
        }
        if new_password.len() < 8 {
            return Err(ServiceError::Validation(vec![FieldError::new(
                "new_password",
                "must be at least 8 characters",
            )]));
        }

        let hash = hash_password(new_password)?;
        self.store
            .update_user_password(token.user_id, hash)?
            .ok_or_else(|| ServiceError::NotFound(format!("user {}", token.user_id)))?;
        self.store.mark_token_used(token.id)?;
        tracing::info!(user = %token.user_id, "password reset completed");
        Ok(())
    }
}

fn hash_password(plain: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::Internal(format!("password hashing failed: {}", e)))
}

fn verify_password(plain: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(plain.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

fn hash_token(raw: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(raw.as_bytes()))
}
