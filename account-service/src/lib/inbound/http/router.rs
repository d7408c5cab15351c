use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::error_handling::HandleErrorLayer;
use axum::extract::FromRef;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::BoxError;
use axum::Router;
use tower::timeout::error::Elapsed;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::get_profile::get_profile;
use super::handlers::ApiError;
use super::handlers::sign_in::sign_in;
use super::handlers::sign_up::sign_up;
use super::handlers::update_profile::update_profile;
use super::middleware::authenticate as auth_middleware;
use crate::domain::user::service::UserService;
use crate::outbound::repositories::SqliteUserRepository;
use crate::outbound::tokens::JwtTokenManager;

pub type AccountService = UserService<SqliteUserRepository, JwtTokenManager>;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub user_service: Arc<AccountService>,
    pub token_manager: Arc<JwtTokenManager>,
}

pub fn create_router(
    user_service: Arc<AccountService>,
    token_manager: Arc<JwtTokenManager>,
    request_timeout: Duration,
) -> Router {
    let state = AppState {
        user_service,
        token_manager,
    };

    let public_routes = Router::new()
        .route("/user/signup", post(sign_up))
        .route("/user/signin", post(sign_in));

    let protected_routes = Router::new()
        .route("/user/profile", get(get_profile))
        .route("/user/profile/update", post(update_profile))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::<JwtTokenManager>,
        ));

    // Headers stay out of the span: they carry bearer tokens.
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    let routes = Router::new().merge(public_routes).merge(protected_routes);

    with_request_timeout(routes, request_timeout)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Drop any request still running after `request_timeout`. The in-flight
/// handler future, and whatever store call it awaits, is cancelled.
fn with_request_timeout<S>(router: Router<S>, request_timeout: Duration) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_timeout_error))
            .timeout(request_timeout),
    )
}

async fn handle_timeout_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        tracing::warn!("Request timed out");
        ApiError::Timeout("request timed out".to_string())
    } else {
        ApiError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use super::*;

    async fn call(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        (status, serde_json::from_slice(&body).unwrap_or_default())
    }

    fn slow_router(request_timeout: Duration) -> Router {
        let routes = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            )
            .route("/fast", get(|| async { "on time" }));

        with_request_timeout(routes, request_timeout)
    }

    #[tokio::test]
    async fn test_timed_out_request_uses_error_body() {
        let (status, body) = call(slow_router(Duration::from_millis(20)), "/slow").await;

        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(
            body,
            serde_json::json!({"error": "Request Timeout", "message": "request timed out"})
        );
    }

    #[tokio::test]
    async fn test_request_within_deadline_is_untouched() {
        let response = slow_router(Duration::from_secs(5))
            .oneshot(Request::builder().uri("/fast").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"on time");
    }
}
