use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::user::models::AuthenticatedUser;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::SignInCommand;
use crate::domain::user::models::SignUpCommand;
use crate::domain::user::models::UpdateProfileCommand;
use crate::domain::user::models::User;
use crate::user::errors::PasswordError;
use crate::user::errors::UserError;
use crate::user::ports::TokenManager;
use crate::user::ports::UserRepository;
use crate::user::ports::UserServicePort;

/// Domain service implementation for account operations.
///
/// Concrete implementation of UserServicePort with dependency injection.
pub struct UserService<UR, TM>
where
    UR: UserRepository,
    TM: TokenManager,
{
    repository: Arc<UR>,
    token_manager: Arc<TM>,
    password_hasher: auth::PasswordHasher,
}

impl<UR, TM> UserService<UR, TM>
where
    UR: UserRepository,
    TM: TokenManager,
{
    /// Create a new user service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User persistence implementation
    /// * `token_manager` - Session token issuer/verifier
    /// * `password_hasher` - Credential hasher with the configured cost
    ///
    /// # Returns
    /// Configured user service instance
    pub fn new(
        repository: Arc<UR>,
        token_manager: Arc<TM>,
        password_hasher: auth::PasswordHasher,
    ) -> Self {
        Self {
            repository,
            token_manager,
            password_hasher,
        }
    }

    /// Argon2 is CPU-bound, so it runs on the blocking pool.
    async fn hash_password(&self, password: &str) -> Result<String, UserError> {
        let hasher = self.password_hasher.clone();
        let password = password.to_string();

        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| UserError::Password(PasswordError::HashingFailed(e.to_string())))?
            .map_err(|e| UserError::Password(PasswordError::HashingFailed(e.to_string())))
    }

    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, UserError> {
        let hasher = self.password_hasher.clone();
        let password = password.to_string();
        let hash = hash.to_string();

        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| UserError::Password(PasswordError::VerificationFailed(e.to_string())))?
            .map_err(|e| UserError::Password(PasswordError::VerificationFailed(e.to_string())))
    }

    /// Burn one hash computation for a sign-in that failed before any
    /// password comparison, so it costs what a wrong password costs.
    async fn spend_hash(&self, password: &str) {
        let _ = self.hash_password(password).await;
    }
}

#[async_trait]
impl<UR, TM> UserServicePort for UserService<UR, TM>
where
    UR: UserRepository,
    TM: TokenManager,
{
    async fn sign_up(&self, command: SignUpCommand) -> Result<User, UserError> {
        let password_hash = self.hash_password(command.password.expose()).await?;

        let user = self.repository.create(&command.email, &password_hash).await?;

        tracing::info!(user_id = %user.id, "User signed up");

        Ok(user)
    }

    async fn sign_in(&self, command: SignInCommand) -> Result<String, UserError> {
        let SignInCommand { email, password } = command;

        let Ok(email) = EmailAddress::new(email) else {
            self.spend_hash(&password).await;
            tracing::debug!("Sign-in rejected: email is not well-formed");
            return Err(UserError::InvalidCredentials);
        };

        let Some(user) = self.repository.find_by_email(&email).await? else {
            self.spend_hash(&password).await;
            tracing::debug!("Sign-in rejected: unknown email");
            return Err(UserError::InvalidCredentials);
        };

        let is_valid = self.verify_password(&password, &user.password_hash).await?;

        if !is_valid {
            tracing::warn!(user_id = %user.id, "Sign-in rejected: wrong password");
            return Err(UserError::InvalidCredentials);
        }

        let token = self.token_manager.issue(&user.id)?;

        tracing::info!(user_id = %user.id, "User signed in");

        Ok(token)
    }

    async fn update_profile(
        &self,
        identity: &AuthenticatedUser,
        command: UpdateProfileCommand,
    ) -> Result<User, UserError> {
        let user = self
            .repository
            .update_profile(identity.user_id(), &command)
            .await?;

        tracing::info!(user_id = %user.id, "Profile updated");

        Ok(user)
    }

    async fn get_profile(&self, identity: &AuthenticatedUser) -> Result<User, UserError> {
        let id = identity.user_id();

        self.repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id.to_string()))
    }
}
