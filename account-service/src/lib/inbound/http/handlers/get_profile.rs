use axum::extract::State;
use axum::http::StatusCode;

use super::ApiError;
use super::ApiSuccess;
use super::ProfileData;
use crate::domain::user::models::AuthenticatedUser;
use crate::domain::user::ports::UserServicePort;
use crate::inbound::http::router::AppState;

pub async fn get_profile(
    State(state): State<AppState>,
    identity: AuthenticatedUser,
) -> Result<ApiSuccess<ProfileData>, ApiError> {
    state
        .user_service
        .get_profile(&identity)
        .await
        .map_err(ApiError::from)
        .map(|ref user| ApiSuccess::new(StatusCode::OK, user.into()))
}
