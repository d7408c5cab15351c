use async_trait::async_trait;

use crate::domain::user::models::AuthenticatedUser;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::SignInCommand;
use crate::domain::user::models::SignUpCommand;
use crate::domain::user::models::UpdateProfileCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::TokenError;
use crate::user::errors::UserError;

/// Port for account use cases.
#[async_trait]
pub trait UserServicePort: Send + Sync + 'static {
    /// Register a new account.
    ///
    /// # Arguments
    /// * `command` - Validated command containing email and password
    ///
    /// # Returns
    /// Created user entity
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `Password` - Hashing failed
    /// * `DatabaseError` - Database operation failed
    async fn sign_up(&self, command: SignUpCommand) -> Result<User, UserError>;

    /// Exchange credentials for a session token.
    ///
    /// # Arguments
    /// * `command` - Email and password as presented by the caller
    ///
    /// # Returns
    /// Signed bearer token
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password (indistinguishable)
    /// * `Password` - Stored hash could not be decoded
    /// * `Token` - Token signing failed
    /// * `DatabaseError` - Database operation failed
    async fn sign_in(&self, command: SignInCommand) -> Result<String, UserError>;

    /// Apply a partial profile update to the caller's own account.
    ///
    /// # Arguments
    /// * `identity` - Caller identity from a verified token
    /// * `command` - Fields to change; absent fields stay untouched
    ///
    /// # Returns
    /// Updated user entity
    ///
    /// # Errors
    /// * `NotFound` - Account no longer exists
    /// * `EmailAlreadyExists` - New email belongs to another account
    /// * `DatabaseError` - Database operation failed
    async fn update_profile(
        &self,
        identity: &AuthenticatedUser,
        command: UpdateProfileCommand,
    ) -> Result<User, UserError>;

    /// Read the caller's own account.
    ///
    /// # Errors
    /// * `NotFound` - Account no longer exists
    /// * `DatabaseError` - Database operation failed
    async fn get_profile(&self, identity: &AuthenticatedUser) -> Result<User, UserError>;
}

/// Persistence operations for user records.
///
/// The store is the sole enforcer of email uniqueness and row existence.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist a new user.
    ///
    /// # Arguments
    /// * `email` - Normalized email address
    /// * `password_hash` - PHC string produced by the credential hasher
    ///
    /// # Returns
    /// Created user entity with store-assigned id and timestamps
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, email: &EmailAddress, password_hash: &str) -> Result<User, UserError>;

    /// Retrieve user by identifier.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;

    /// Retrieve user by email address.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError>;

    /// Apply the present fields of `update` to the user `id`.
    ///
    /// # Returns
    /// Updated user entity
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `EmailAlreadyExists` - New email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn update_profile(
        &self,
        id: &UserId,
        update: &UpdateProfileCommand,
    ) -> Result<User, UserError>;
}

/// Issuance and verification of stateless session tokens.
///
/// Both operations are pure CPU work, so the trait is synchronous.
pub trait TokenManager: Send + Sync + 'static {
    /// Issue a signed token bound to `user_id` with the configured lifetime.
    ///
    /// # Errors
    /// * `SigningFailed` - Token could not be signed
    fn issue(&self, user_id: &UserId) -> Result<String, TokenError>;

    /// Verify a presented token and resolve the identity it asserts.
    ///
    /// # Errors
    /// * `MalformedToken` - Not a decodable token
    /// * `BadSignature` - Wrong algorithm or signature
    /// * `Expired` - Past its expiry
    /// * `MissingSubject` - No usable subject claim
    fn verify(&self, token: &str) -> Result<AuthenticatedUser, TokenError>;
}
