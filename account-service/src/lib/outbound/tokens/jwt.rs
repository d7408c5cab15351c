use auth::JwtError;
use auth::JwtHandler;
use chrono::Duration;

use crate::domain::user::models::AuthenticatedUser;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::TokenManager;
use crate::user::errors::TokenError;

/// HS256 session tokens whose subject is the decimal user id.
pub struct JwtTokenManager {
    handler: JwtHandler,
    ttl: Duration,
}

impl JwtTokenManager {
    /// Create a token manager.
    ///
    /// # Arguments
    /// * `secret` - HMAC signing secret
    /// * `ttl` - Lifetime of every issued token
    ///
    /// # Errors
    /// * `MissingSigningKey` - Secret is empty
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, JwtError> {
        Ok(Self {
            handler: JwtHandler::new(secret)?,
            ttl,
        })
    }
}

impl TokenManager for JwtTokenManager {
    fn issue(&self, user_id: &UserId) -> Result<String, TokenError> {
        self.handler
            .issue(&user_id.to_string(), self.ttl)
            .map_err(|e| TokenError::SigningFailed(e.to_string()))
    }

    fn verify(&self, token: &str) -> Result<AuthenticatedUser, TokenError> {
        let subject = self.handler.verify(token).map_err(TokenError::from)?;

        // A validly signed token whose subject is not one of our ids asserts nobody.
        let user_id = UserId::from_string(&subject).map_err(|_| TokenError::MissingSubject)?;

        Ok(AuthenticatedUser::new(user_id))
    }
}

impl From<JwtError> for TokenError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::MalformedToken(msg) => TokenError::MalformedToken(msg),
            JwtError::BadSignature => TokenError::BadSignature,
            JwtError::Expired => TokenError::Expired,
            JwtError::MissingSubject => TokenError::MissingSubject,
            JwtError::MissingSigningKey | JwtError::EncodingFailed(_) => {
                TokenError::SigningFailed(err.to_string())
            }
        }
    }
}
