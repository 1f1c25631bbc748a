//! User service
//!
//! Registration, login, and token refresh. Registration enforces the
//! username/email/password rules; the first registered user becomes the
//! administrator, every later signup is a customer.

use crate::db::repositories::UserRepository;
use crate::models::{CreateUserInput, User, UserRole};
use crate::services::password::{hash_password, verify_password};
use crate::services::token::{TokenError, TokenPair, TokenService};
use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

/// Minimum username length
const MIN_USERNAME_LEN: usize = 3;
/// Maximum username length (storage column width)
const MAX_USERNAME_LEN: usize = 50;
/// Minimum password length
const MIN_PASSWORD_LEN: usize = 8;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("username pattern is valid"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"));

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Invalid registration input or a taken username/email
    #[error("{0}")]
    Validation(String),

    /// Credentials or token rejected
    #[error("{0}")]
    AuthenticationFailed(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<TokenError> for UserServiceError {
    fn from(err: TokenError) -> Self {
        UserServiceError::AuthenticationFailed(err.to_string())
    }
}

/// User service for registration and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    tokens: TokenService,
}

impl UserService {
    /// Create a new user service
    pub fn new(user_repo: Arc<dyn UserRepository>, tokens: TokenService) -> Self {
        Self { user_repo, tokens }
    }

    /// Register a new user.
    ///
    /// The first user in the system is created as an administrator; everyone
    /// after that is a customer.
    pub async fn register(&self, input: CreateUserInput) -> Result<User, UserServiceError> {
        validate_username(&input.username)?;
        validate_email(&input.email)?;
        validate_password(&input.password, &input.username)?;

        if self
            .user_repo
            .get_by_username(&input.username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(UserServiceError::Validation(
                "Username is already taken".to_string(),
            ));
        }

        if self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::Validation(
                "Email is already registered".to_string(),
            ));
        }

        let role = if self
            .user_repo
            .count()
            .await
            .context("Failed to count users")?
            == 0
        {
            UserRole::Admin
        } else {
            UserRole::Customer
        };

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;
        let user = User::new(input.username, input.email, password_hash, role);

        let created = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?;

        tracing::info!(user_id = created.id, username = %created.username, role = %created.role, "User registered");

        Ok(created)
    }

    /// Verify credentials and issue a token pair.
    ///
    /// Unknown usernames and wrong passwords are indistinguishable to the
    /// caller.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, UserServiceError> {
        let user = self
            .user_repo
            .get_by_username(username)
            .await
            .context("Failed to look up user")?
            .ok_or_else(|| {
                UserServiceError::AuthenticationFailed("Invalid username or password".to_string())
            })?;

        let valid = verify_password(password, &user.password_hash)
            .context("Failed to verify password")?;
        if !valid {
            return Err(UserServiceError::AuthenticationFailed(
                "Invalid username or password".to_string(),
            ));
        }

        tracing::debug!(user_id = user.id, "Login succeeded");

        Ok(self.tokens.issue_pair(&user)?)
    }

    /// Exchange a refresh token for a fresh access token
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, UserServiceError> {
        let claims = self.tokens.decode_refresh(refresh_token)?;

        // The user may have been removed since the token was issued
        let user = self
            .user_repo
            .get_by_id(claims.sub)
            .await
            .context("Failed to look up user")?
            .ok_or_else(|| {
                UserServiceError::AuthenticationFailed("Invalid token".to_string())
            })?;

        Ok(self.tokens.issue_access(&user)?)
    }
}

fn validate_username(username: &str) -> Result<(), UserServiceError> {
    if username.len() < MIN_USERNAME_LEN {
        return Err(UserServiceError::Validation(format!(
            "Username must be at least {} characters",
            MIN_USERNAME_LEN
        )));
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err(UserServiceError::Validation(format!(
            "Username cannot exceed {} characters",
            MAX_USERNAME_LEN
        )));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(UserServiceError::Validation(
            "Username may only contain letters, digits and underscores".to_string(),
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), UserServiceError> {
    if !EMAIL_RE.is_match(email) {
        return Err(UserServiceError::Validation(
            "Enter a valid email address".to_string(),
        ));
    }
    Ok(())
}

fn validate_password(password: &str, username: &str) -> Result<(), UserServiceError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(UserServiceError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(UserServiceError::Validation(
            "Password must contain an uppercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(UserServiceError::Validation(
            "Password must contain a lowercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(UserServiceError::Validation(
            "Password must contain a digit".to_string(),
        ));
    }
    if password.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(UserServiceError::Validation(
            "Password must contain a special character".to_string(),
        ));
    }
    if password.to_lowercase().contains(&username.to_lowercase()) {
        return Err(UserServiceError::Validation(
            "Password cannot contain the username".to_string(),
        ));
    }
    Ok(())
}
