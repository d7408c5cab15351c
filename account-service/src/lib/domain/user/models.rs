use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::DateTime;
use chrono::NaiveDate;
use chrono::Utc;
use regex::Regex;

use crate::user::errors::BirthDateError;
use crate::user::errors::DisplayNameError;
use crate::user::errors::EmailError;
use crate::user::errors::PasswordPolicyError;
use crate::user::errors::PhoneNumberError;
use crate::user::errors::UserIdError;

/// User aggregate entity.
///
/// Represents a registered account. The password hash is an opaque PHC
/// string and is never part of any outward representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: EmailAddress,
    pub password_hash: String,
    pub name: Option<DisplayName>,
    pub phone_number: Option<PhoneNumber>,
    pub birth_date: Option<BirthDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User unique identifier type, assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

impl UserId {
    /// Parse a user ID from string.
    ///
    /// # Arguments
    /// * `s` - Decimal identifier
    ///
    /// # Returns
    /// Parsed UserId
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a positive integer
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        match s.parse::<i64>() {
            Ok(id) if id > 0 => Ok(UserId(id)),
            Ok(id) => Err(UserIdError::InvalidFormat(format!(
                "{} is not a positive identifier",
                id
            ))),
            Err(e) => Err(UserIdError::InvalidFormat(e.to_string())),
        }
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates format using an RFC 5322 compliant parser. Addresses are
/// trimmed and lowercased on construction, which makes every comparison
/// and the store's uniqueness rule case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    const MIN_LENGTH: usize = 3;
    const MAX_LENGTH: usize = 254;

    /// Create a new validated, normalized email address.
    ///
    /// # Errors
    /// * `InvalidLength` - Outside 3..=254 characters
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        let email = email.trim().to_lowercase();

        let length = email.chars().count();
        if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&length) {
            return Err(EmailError::InvalidLength {
                min: Self::MIN_LENGTH,
                max: Self::MAX_LENGTH,
                actual: length,
            });
        }

        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    /// Get email as string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Plaintext password accepted at signup.
///
/// Only lives long enough to be hashed. Debug output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    const MIN_LENGTH: usize = 8;
    const MAX_LENGTH: usize = 64;
    const ALLOWED_SYMBOLS: &'static str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?";

    /// Validate a candidate password against the signup policy.
    ///
    /// # Errors
    /// * `InvalidLength` - Outside 8..=64 characters
    /// * `InvalidCharacters` - Anything but ASCII letters, digits and the allowed symbols
    pub fn new(password: String) -> Result<Self, PasswordPolicyError> {
        let length = password.chars().count();
        if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&length) {
            return Err(PasswordPolicyError::InvalidLength {
                min: Self::MIN_LENGTH,
                max: Self::MAX_LENGTH,
                actual: length,
            });
        }

        if !password
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || Self::ALLOWED_SYMBOLS.contains(c))
        {
            return Err(PasswordPolicyError::InvalidCharacters);
        }

        Ok(Self(password))
    }

    /// Validate a password together with its confirmation.
    ///
    /// # Errors
    /// * `ConfirmationMismatch` - The two values differ
    /// * any error from [`Password::new`]
    pub fn with_confirmation(
        password: String,
        confirmation: &str,
    ) -> Result<Self, PasswordPolicyError> {
        if password != confirmation {
            return Err(PasswordPolicyError::ConfirmationMismatch);
        }
        Self::new(password)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Display name value type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    const MIN_LENGTH: usize = 1;
    const MAX_LENGTH: usize = 64;

    /// Create a trimmed display name of 1..=64 characters.
    ///
    /// # Errors
    /// * `InvalidLength` - Empty after trimming or longer than 64 characters
    /// * `InvalidCharacters` - Contains control characters
    pub fn new(name: String) -> Result<Self, DisplayNameError> {
        let name = name.trim().to_string();

        let length = name.chars().count();
        if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&length) {
            return Err(DisplayNameError::InvalidLength {
                min: Self::MIN_LENGTH,
                max: Self::MAX_LENGTH,
                actual: length,
            });
        }

        if name.chars().any(char::is_control) {
            return Err(DisplayNameError::InvalidCharacters);
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

static PHONE_NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[1-9][0-9]{6,14}$").expect("valid phone number pattern"));

/// Phone number value type
///
/// Common separators are stripped; what remains must have E.164 shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    const SEPARATORS: [char; 5] = [' ', '-', '(', ')', '.'];

    /// Create a normalized phone number.
    ///
    /// # Errors
    /// * `InvalidFormat` - Not 7 to 15 digits with an optional leading `+`
    pub fn new(phone_number: String) -> Result<Self, PhoneNumberError> {
        let normalized: String = phone_number
            .trim()
            .chars()
            .filter(|c| !Self::SEPARATORS.contains(c))
            .collect();

        if PHONE_NUMBER_PATTERN.is_match(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(PhoneNumberError::InvalidFormat(phone_number))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Birth date value type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BirthDate(NaiveDate);

impl BirthDate {
    /// Validate a birth date against today's date (UTC).
    ///
    /// # Errors
    /// * `InFuture` - Date is after today
    /// * `TooEarly` - Date is before 1900-01-01
    pub fn new(date: NaiveDate) -> Result<Self, BirthDateError> {
        Self::as_of(date, Utc::now().date_naive())
    }

    /// Validate a birth date against an explicit reference day.
    pub fn as_of(date: NaiveDate, today: NaiveDate) -> Result<Self, BirthDateError> {
        let earliest = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN);

        if date > today {
            Err(BirthDateError::InFuture(date.to_string()))
        } else if date < earliest {
            Err(BirthDateError::TooEarly(
                date.to_string(),
                earliest.to_string(),
            ))
        } else {
            Ok(Self(date))
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

/// Identity proven by a verified session token.
///
/// Only the token verification path can build one, so holding an
/// `AuthenticatedUser` means the bearer token checked out. It is the sole
/// source of "who is calling" for protected operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    user_id: UserId,
}

impl AuthenticatedUser {
    pub(crate) fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }
}

/// Command to register a new account
#[derive(Debug)]
pub struct SignUpCommand {
    pub email: EmailAddress,
    pub password: Password,
}

impl SignUpCommand {
    /// Construct a new signup command.
    ///
    /// # Arguments
    /// * `email` - Validated email address
    /// * `password` - Policy-checked plain text password (will be hashed by service)
    pub fn new(email: EmailAddress, password: Password) -> Self {
        Self { email, password }
    }
}

/// Credentials presented at sign-in, deliberately unvalidated.
pub struct SignInCommand {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for SignInCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignInCommand")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Command to update profile fields with optional validated values.
///
/// All fields are optional to support partial updates.
/// Only provided fields will be updated. The target account is never part
/// of the command; it comes from the caller's [`AuthenticatedUser`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateProfileCommand {
    pub name: Option<DisplayName>,
    pub email: Option<EmailAddress>,
    pub phone_number: Option<PhoneNumber>,
    pub birth_date: Option<BirthDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_from_string() {
        assert_eq!(UserId::from_string("42"), Ok(UserId(42)));
        assert!(UserId::from_string("0").is_err());
        assert!(UserId::from_string("-3").is_err());
        assert!(UserId::from_string("abc").is_err());
    }

    #[test]
    fn test_email_is_normalized() {
        let email = EmailAddress::new("  Alice@Example.COM ".to_string()).unwrap();
        assert_eq!(email.as_str(), "alice@example.com");
    }

    #[test]
    fn test_email_rejects_invalid_format() {
        assert!(matches!(
            EmailAddress::new("not-an-email".to_string()),
            Err(EmailError::InvalidFormat(_))
        ));
        assert!(matches!(
            EmailAddress::new("a".to_string()),
            Err(EmailError::InvalidLength { .. })
        ));
    }

    #[test]
    fn test_password_policy() {
        assert!(Password::new("Passw0rd!".to_string()).is_ok());
        assert_eq!(
            Password::new("short".to_string()),
            Err(PasswordPolicyError::InvalidLength {
                min: 8,
                max: 64,
                actual: 5
            })
        );
        assert_eq!(
            Password::new("pässwörd123".to_string()),
            Err(PasswordPolicyError::InvalidCharacters)
        );
        assert_eq!(
            Password::new("has a space".to_string()),
            Err(PasswordPolicyError::InvalidCharacters)
        );
    }

    #[test]
    fn test_password_confirmation() {
        assert!(Password::with_confirmation("Passw0rd!".to_string(), "Passw0rd!").is_ok());
        assert_eq!(
            Password::with_confirmation("Passw0rd!".to_string(), "Passw0rd?"),
            Err(PasswordPolicyError::ConfirmationMismatch)
        );
    }

    #[test]
    fn test_password_debug_is_redacted() {
        let password = Password::new("Passw0rd!".to_string()).unwrap();
        assert!(!format!("{:?}", password).contains("Passw0rd!"));

        let command = SignInCommand {
            email: "a@b.com".to_string(),
            password: "Passw0rd!".to_string(),
        };
        assert!(!format!("{:?}", command).contains("Passw0rd!"));
    }

    #[test]
    fn test_display_name() {
        assert_eq!(
            DisplayName::new("  Ada Lovelace ".to_string()).unwrap().as_str(),
            "Ada Lovelace"
        );
        assert!(matches!(
            DisplayName::new("   ".to_string()),
            Err(DisplayNameError::InvalidLength { .. })
        ));
        assert_eq!(
            DisplayName::new("bad\u{7}name".to_string()),
            Err(DisplayNameError::InvalidCharacters)
        );
    }

    #[test]
    fn test_phone_number_is_normalized() {
        let phone = PhoneNumber::new("+7 (701) 123-45-67".to_string()).unwrap();
        assert_eq!(phone.as_str(), "+77011234567");

        assert!(PhoneNumber::new("12345".to_string()).is_err());
        assert!(PhoneNumber::new("+0123456789".to_string()).is_err());
        assert!(PhoneNumber::new("call me".to_string()).is_err());
    }

    #[test]
    fn test_birth_date_bounds() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        assert!(BirthDate::as_of(NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(), today).is_ok());
        assert!(BirthDate::as_of(today, today).is_ok());
        assert!(matches!(
            BirthDate::as_of(NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(), today),
            Err(BirthDateError::InFuture(_))
        ));
        assert!(matches!(
            BirthDate::as_of(NaiveDate::from_ymd_opt(1899, 12, 31).unwrap(), today),
            Err(BirthDateError::TooEarly(_, _))
        ));
    }
}
