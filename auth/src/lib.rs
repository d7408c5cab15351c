//! Credential primitives for the account service.
//!
//! Provides reusable authentication infrastructure:
//! - Password hashing (Argon2id, PHC strings with embedded salt and cost)
//! - Session token issuance and verification (HS256 JWT)
//!
//! The service defines its own ports and adapts these implementations to
//! them, so nothing here knows about users, stores or HTTP.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## Session Tokens
//! ```
//! use auth::JwtHandler;
//! use chrono::Duration;
//!
//! let handler = JwtHandler::new(b"secret_key_at_least_32_bytes_long!").unwrap();
//! let token = handler.issue("42", Duration::hours(1)).unwrap();
//! let subject = handler.verify(&token).unwrap();
//! assert_eq!(subject, "42");
//! ```

pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use jwt::Claims;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use password::PasswordError;
pub use password::PasswordHasher;
