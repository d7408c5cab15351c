use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;

use crate::domain::user::models::AuthenticatedUser;
use crate::domain::user::ports::TokenManager;
use crate::inbound::http::handlers::ApiError;

/// The one message every rejected token gets.
const INVALID_TOKEN_MESSAGE: &str = "invalid token";

fn unauthenticated() -> ApiError {
    ApiError::Unauthenticated(INVALID_TOKEN_MESSAGE.to_string())
}

/// Middleware that verifies the bearer token and attaches the caller's
/// [`AuthenticatedUser`] to the request extensions.
pub async fn authenticate<TM: TokenManager>(
    State(token_manager): State<Arc<TM>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token_from_header(&req)?;

    let identity = token_manager.verify(token).map_err(|e| {
        tracing::warn!(reason = %e, "Bearer token rejected");
        unauthenticated()
    })?;

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

fn extract_token_from_header(req: &Request) -> Result<&str, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| {
            tracing::warn!("Missing Authorization header");
            unauthenticated()
        })?;

    auth_header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| {
            tracing::warn!("Authorization header is not a bearer token");
            unauthenticated()
        })
}

/// Handlers take the caller's identity as an argument. On a route the gate
/// does not cover, extraction fails closed.
#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| {
                tracing::error!(uri = %parts.uri, "Identity requested on an unauthenticated route");
                unauthenticated()
            })
    }
}
