//! User model
//!
//! This module defines the User entity and related types for the Cinebook
//! booking system. Passwords are stored as argon2id hashes and are never
//! serialized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User entity representing a registered user in the system.
///
/// Users are either administrators (catalog management, stats) or customers
/// (booking seats).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Username (unique)
    pub username: String,
    /// Email address (unique)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// User role
    pub role: UserRole,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with the given parameters.
    ///
    /// Note: The password should already be hashed before calling this
    /// function. Use `services::password::hash_password()` for that.
    pub fn new(username: String, email: String, password_hash: String, role: UserRole) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            username,
            email,
            password_hash,
            role,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the user is an administrator
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// User role for authorization.
///
/// - Admin: manages the movie/show catalog and reads booking stats
/// - Customer: books and cancels seats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Administrator - catalog management and stats
    Admin,
    /// Customer - booking operations only
    #[default]
    Customer,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::Customer => write!(f, "customer"),
        }
    }
}

impl FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "customer" => Ok(UserRole::Customer),
            _ => Err(anyhow::anyhow!("Invalid user role: {}", s)),
        }
    }
}

/// Input for creating a new user (before password hashing)
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Username
    pub username: String,
    /// Email address
    pub email: String,
    /// Plaintext password (will be hashed)
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_new() {
        let user = User::new(
            "moviegoer".to_string(),
            "fan@example.com".to_string(),
            "hashed_password".to_string(),
            UserRole::Customer,
        );

        assert_eq!(user.id, 0);
        assert_eq!(user.username, "moviegoer");
        assert_eq!(user.email, "fan@example.com");
        assert_eq!(user.role, UserRole::Customer);
    }

    #[test]
    fn test_user_is_admin() {
        let admin = User::new(
            "admin".to_string(),
            "admin@test.com".to_string(),
            "hash".to_string(),
            UserRole::Admin,
        );
        let customer = User::new(
            "customer".to_string(),
            "c@test.com".to_string(),
            "hash".to_string(),
            UserRole::Customer,
        );

        assert!(admin.is_admin());
        assert!(!customer.is_admin());
    }

    #[test]
    fn test_user_role_display() {
        assert_eq!(UserRole::Admin.to_string(), "admin");
        assert_eq!(UserRole::Customer.to_string(), "customer");
    }

    #[test]
    fn test_user_role_from_str() {
        assert_eq!(UserRole::from_str("admin").unwrap(), UserRole::Admin);
        assert_eq!(UserRole::from_str("ADMIN").unwrap(), UserRole::Admin);
        assert_eq!(UserRole::from_str("Customer").unwrap(), UserRole::Customer);
        assert!(UserRole::from_str("invalid").is_err());
    }

    #[test]
    fn test_user_role_default() {
        assert_eq!(UserRole::default(), UserRole::Customer);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::new(
            "moviegoer".to_string(),
            "fan@example.com".to_string(),
            "supersecrethash".to_string(),
            UserRole::Customer,
        );
        let json = serde_json::to_string(&user).expect("User should serialize");
        assert!(!json.contains("supersecrethash"));
        assert!(!json.contains("password_hash"));
    }
}
