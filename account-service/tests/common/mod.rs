#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use account_service::domain::user::service::UserService;
use account_service::inbound::http::router::create_router;
use account_service::outbound::repositories::SqliteUserRepository;
use account_service::outbound::tokens::JwtTokenManager;
use account_service::user::models::UserId;
use account_service::user::ports::TokenManager;
use serde_json::json;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

pub const JWT_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";
pub const PASSWORD: &str = "Passw0rd!";

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub pool: SqlitePool,
    pub api_client: reqwest::Client,
    pub token_manager: Arc<JwtTokenManager>,
}

/// Fresh in-memory database with migrations applied.
///
/// Every connection to `:memory:` is its own database, so the pool is
/// pinned to a single connection that never expires.
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("Failed to parse in-memory database url");

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("Failed to open in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

/// Argon2 with the smallest cost the crate accepts.
pub fn cheap_hasher() -> auth::PasswordHasher {
    auth::PasswordHasher::with_cost(1024, 1, 1).expect("Failed to build password hasher")
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        let pool = test_pool().await;

        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let user_repo = Arc::new(SqliteUserRepository::new(pool.clone()));
        let token_manager = Arc::new(
            JwtTokenManager::new(JWT_SECRET, chrono::Duration::minutes(15))
                .expect("Failed to create token manager"),
        );

        let user_service = Arc::new(UserService::new(
            user_repo,
            Arc::clone(&token_manager),
            cheap_hasher(),
        ));

        let router = create_router(
            user_service,
            Arc::clone(&token_manager),
            Duration::from_secs(10),
        );

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            pool,
            api_client: reqwest::Client::new(),
            token_manager,
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to make POST request with Bearer token
    pub fn post_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.post(path).bearer_auth(token)
    }

    /// Register an account and return the response body.
    pub async fn sign_up(&self, email: &str) -> serde_json::Value {
        let response = self
            .post("/user/signup")
            .json(&json!({
                "email": email,
                "password": PASSWORD,
                "password_confirmation": PASSWORD,
            }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        response.json().await.expect("Failed to parse response")
    }

    /// Sign in with the shared test password and return the token.
    pub async fn sign_in(&self, email: &str) -> String {
        let response = self
            .post("/user/signin")
            .json(&json!({ "email": email, "password": PASSWORD }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        body["token"]
            .as_str()
            .expect("token should be a string")
            .to_string()
    }

    /// Register and sign in, returning `(user_id, token)`.
    pub async fn create_authenticated_user(&self, email: &str) -> (i64, String) {
        let body = self.sign_up(email).await;
        let id = body["id"].as_i64().expect("id should be a number");
        (id, self.sign_in(email).await)
    }

    /// A correctly signed token that expired a minute ago.
    pub fn expired_token(&self, user_id: i64) -> String {
        JwtTokenManager::new(JWT_SECRET, chrono::Duration::minutes(-1))
            .expect("Failed to create token manager")
            .issue(&UserId(user_id))
            .expect("Failed to issue expired token")
    }

    /// A valid token for an arbitrary subject, bypassing sign-in.
    pub fn token_for(&self, user_id: i64) -> String {
        self.token_manager
            .issue(&UserId(user_id))
            .expect("Failed to issue token")
    }
}
