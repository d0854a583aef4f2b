//! Axum integration for the Bastille lockout toolkit.
//!
//! Provides the two signed capability-gated endpoints (`GET /lockout/lock`,
//! `GET /lockout/unlock`) and the [`middleware::access_guard`] request gate.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use axum::{Router, routing::post};
//! use bastille::Bastille;
//! use bastille_axum::{LockoutState, access_guard, create_router};
//! # use bastille::RepositoryProvider;
//!
//! # async fn handler() {}
//! fn app<R: RepositoryProvider>(bastille: Arc<Bastille<R>>) -> Router {
//!     let state = LockoutState { bastille: bastille.clone() };
//!     Router::new()
//!         .route("/login", post(handler))
//!         .layer(axum::middleware::from_fn_with_state(state, access_guard::<R>))
//!         .merge(create_router(bastille))
//! }
//! ```

pub mod error;
pub mod middleware;
pub mod routes;
pub mod types;

pub use error::LockoutHttpError;
pub use middleware::access_guard;
pub use routes::{LockoutState, create_router};
pub use types::CapabilityParams;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
        routing::post,
    };
    use bastille::{
        Bastille, LockoutConfig, NewLock, RequestContext, SqliteIdentityResolver,
        SqliteRepositoryProvider,
    };
    use tower::ServiceExt;

    use crate::routes::LockoutState;

    type TestBastille = Arc<Bastille<SqliteRepositoryProvider>>;

    async fn setup() -> TestBastille {
        let repositories = Arc::new(
            SqliteRepositoryProvider::connect("sqlite::memory:")
                .await
                .unwrap(),
        );

        sqlx::query("CREATE TABLE users (id TEXT PRIMARY KEY, email TEXT NOT NULL UNIQUE)")
            .execute(repositories.pool())
            .await
            .unwrap();
        sqlx::query("INSERT INTO users (id, email) VALUES ('usr_1', 'test@example.com')")
            .execute(repositories.pool())
            .await
            .unwrap();

        let resolver = Arc::new(SqliteIdentityResolver::for_users(
            repositories.pool().clone(),
        ));

        let bastille = Bastille::builder(repositories)
            .with_resolver(resolver)
            .with_capability_secret(b"test-secret", "https://app.test")
            .with_config(LockoutConfig::default().with_max_attempts(2))
            .build()
            .await
            .unwrap();
        bastille.migrate().await.unwrap();

        Arc::new(bastille)
    }

    fn path_and_query(url: &str) -> String {
        url.strip_prefix("https://app.test").unwrap().to_string()
    }

    #[tokio::test]
    async fn test_unlock_endpoint_with_valid_capability() {
        let bastille = setup().await;
        let subject = bastille.resolve("test@example.com").await.unwrap().unwrap();
        bastille.lock(&subject, NewLock::default()).await.unwrap();
        assert!(bastille.is_identifier_locked_out("test@example.com").await);

        let router = crate::create_router(bastille.clone());
        let url = bastille.unlock_url("test@example.com");

        let response = router
            .oneshot(
                Request::builder()
                    .uri(path_and_query(&url))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("/login?status="));

        assert!(!bastille.is_identifier_locked_out("test@example.com").await);
    }

    #[tokio::test]
    async fn test_unlock_endpoint_rejects_tampered_identifier() {
        let bastille = setup().await;
        let router = crate::create_router(bastille.clone());

        let url = bastille.unlock_url("test@example.com");
        let tampered = path_and_query(&url).replace("test%40example.com", "other%40example.com");

        let response = router
            .oneshot(Request::builder().uri(tampered).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_unlock_endpoint_unknown_identifier_redirects_with_error() {
        let bastille = setup().await;
        let router = crate::create_router(bastille.clone());

        let url = bastille.unlock_url("nobody@example.com");
        let response = router
            .oneshot(
                Request::builder()
                    .uri(path_and_query(&url))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        // No internal detail leaks; the client is redirected with a flash error
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("/login?error="));
    }

    #[tokio::test]
    async fn test_lock_endpoint_creates_lock() {
        let bastille = setup().await;
        let router = crate::create_router(bastille.clone());

        let url = bastille.lock_url("test@example.com");
        let response = router
            .oneshot(
                Request::builder()
                    .uri(path_and_query(&url))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(bastille.is_identifier_locked_out("test@example.com").await);
    }

    #[tokio::test]
    async fn test_lock_capability_cannot_be_replayed_as_unlock() {
        let bastille = setup().await;
        let router = crate::create_router(bastille.clone());

        let url = bastille.lock_url("test@example.com");
        let crossed = path_and_query(&url).replace("/lockout/lock?", "/lockout/unlock?");

        let response = router
            .oneshot(Request::builder().uri(crossed).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    async fn guarded_app(bastille: TestBastille) -> Router {
        let state = LockoutState {
            bastille: bastille.clone(),
        };
        Router::new()
            .route("/login", post(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(
                state,
                crate::access_guard::<SqliteRepositoryProvider>,
            ))
    }

    #[tokio::test]
    async fn test_access_guard_allows_unlocked_identifier() {
        let bastille = setup().await;
        let app = guarded_app(bastille).await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"email":"test@example.com","password":"x"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_access_guard_denies_locked_identifier() {
        let bastille = setup().await;
        let subject = bastille.resolve("test@example.com").await.unwrap().unwrap();
        bastille.lock(&subject, NewLock::default()).await.unwrap();

        let app = guarded_app(bastille).await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"email":"test@example.com","password":"x"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_access_guard_denies_counter_saturated_identifier() {
        let bastille = setup().await;
        let ctx = RequestContext::default();
        bastille
            .record_failure("test@example.com", &ctx)
            .await
            .unwrap();
        bastille
            .record_failure("test@example.com", &ctx)
            .await
            .unwrap();

        let app = guarded_app(bastille).await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/login")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("email=test%40example.com&password=x"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_access_guard_passes_requests_without_identifier() {
        let bastille = setup().await;
        let app = guarded_app(bastille).await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/login")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
