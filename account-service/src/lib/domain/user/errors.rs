use thiserror::Error;

/// Error for UserId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserIdError {
    #[error("Invalid user id: {0}")]
    InvalidFormat(String),
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Email length must be between {min} and {max} characters, got {actual}")]
    InvalidLength {
        min: usize,
        max: usize,
        actual: usize,
    },

    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for signup password policy failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("Password length must be between {min} and {max} characters, got {actual}")]
    InvalidLength {
        min: usize,
        max: usize,
        actual: usize,
    },

    #[error("Password contains characters outside the allowed set")]
    InvalidCharacters,

    #[error("Password and confirmation do not match")]
    ConfirmationMismatch,
}

/// Error for DisplayName validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DisplayNameError {
    #[error("Name must be between {min} and {max} characters, got {actual}")]
    InvalidLength {
        min: usize,
        max: usize,
        actual: usize,
    },

    #[error("Name contains control characters")]
    InvalidCharacters,
}

/// Error for PhoneNumber validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PhoneNumberError {
    #[error("Invalid phone number: {0}")]
    InvalidFormat(String),
}

/// Error for BirthDate validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BirthDateError {
    #[error("Birth date {0} is in the future")]
    InFuture(String),

    #[error("Birth date {0} is before {1}")]
    TooEarly(String, String),
}

/// Error for password hashing operations
#[derive(Debug, Clone, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Password verification failed: {0}")]
    VerificationFailed(String),
}

/// Error for session token issuance and verification.
///
/// Verification failures are kept distinct here for logging; the HTTP
/// boundary collapses all of them into one unauthorized response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("Bad token signature")]
    BadSignature,

    #[error("Token expired")]
    Expired,

    #[error("Token has no usable subject")]
    MissingSubject,

    #[error("Token signing failed: {0}")]
    SigningFailed(String),
}

/// Top-level error for all user-related operations
#[derive(Debug, Clone, Error)]
pub enum UserError {
    // Value object validation errors (automatically converted via #[from])
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid password: {0}")]
    InvalidPassword(#[from] PasswordPolicyError),

    #[error("Invalid name: {0}")]
    InvalidName(#[from] DisplayNameError),

    #[error("Invalid phone number: {0}")]
    InvalidPhoneNumber(#[from] PhoneNumberError),

    #[error("Invalid birth date: {0}")]
    InvalidBirthDate(#[from] BirthDateError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    // Domain-level errors
    #[error("User not found: {0}")]
    NotFound(String),

    #[error("User with email already exists: {0}")]
    EmailAlreadyExists(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    // Infrastructure errors
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl UserError {
    /// Whether this error was caused by a malformed field in caller input.
    pub fn is_invalid_field(&self) -> bool {
        matches!(
            self,
            UserError::InvalidEmail(_)
                | UserError::InvalidPassword(_)
                | UserError::InvalidName(_)
                | UserError::InvalidPhoneNumber(_)
                | UserError::InvalidBirthDate(_)
        )
    }
}
