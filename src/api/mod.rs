//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP API endpoints for the newsroom system:
//! - Auth endpoints (register, login, password reset)
//! - Reader feed endpoints (articles, newsletters, subscriptions)
//! - Authoring and review endpoints (content lifecycle)
//! - Publisher administration endpoints

pub mod auth;
pub mod content;
pub mod feed;
pub mod middleware;
pub mod publishers;
pub mod responses;
pub mod subscriptions;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Everything except account entry points requires a session
    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        // Reader surface
        .route("/articles", get(feed::list_articles))
        .route("/newsletters", get(feed::list_newsletters))
        .route("/feed/{id}", get(feed::get_feed_item))
        .route("/my-subscriptions", get(subscriptions::my_subscriptions))
        .route("/subscriptions", post(subscriptions::subscribe))
        .route("/subscriptions/{kind}/{id}", delete(subscriptions::unsubscribe))
        // Journalist surface
        .route("/content", post(content::create_content))
        .route("/content/mine", get(content::list_own_content))
        .route("/content/{id}", get(content::get_content))
        .route("/content/{id}", put(content::update_content))
        .route("/content/{id}", delete(content::delete_content))
        .route("/content/{id}/submit", post(content::submit_content))
        .route("/content/{id}/resubmit", post(content::resubmit_content))
        // Editor surface
        .route("/review/queue", get(content::review_queue))
        .route("/content/{id}/approve", post(content::approve_content))
        .route("/content/{id}/reject", post(content::reject_content))
        // Manager surface
        .route("/publishers", post(publishers::create_publisher))
        .route("/publishers", get(publishers::list_publishers))
        .route("/publishers/{id}", get(publishers::get_publisher))
        .route("/publishers/{id}", put(publishers::update_publisher))
        .route("/publishers/{id}", delete(publishers::delete_publisher))
        .route(
            "/publishers/{id}/journalists/{user_id}",
            post(publishers::add_journalist),
        )
        .route(
            "/publishers/{id}/journalists/{user_id}",
            delete(publishers::remove_journalist),
        )
        .route("/publishers/{id}/editors/{user_id}", post(publishers::add_editor))
        .route(
            "/publishers/{id}/editors/{user_id}",
            delete(publishers::remove_editor),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ));

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SiteConfig, SmtpConfig, SocialConfig};
    use crate::db::repositories::{
        SqlxContentRepository, SqlxPublisherRepository, SqlxResetTokenRepository,
        SqlxSessionRepository, SqlxSubscriptionRepository, SqlxUserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::notify::{ApprovalNotifier, EmailSender, SocialClient};
    use crate::services::{
        ContentService, LoginRateLimiter, PublisherService, SubscriptionService, UserService,
    };
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use std::sync::Arc;

    async fn test_server() -> TestServer {
        let pool = create_test_pool().await.expect("pool");
        migrations::run_migrations(&pool).await.expect("migrations");

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let reset_token_repo = SqlxResetTokenRepository::boxed(pool.clone());
        let subscription_repo = SqlxSubscriptionRepository::boxed(pool.clone());
        let publisher_repo = SqlxPublisherRepository::boxed(pool.clone());
        let content_repo = SqlxContentRepository::boxed(pool.clone());

        let email = Arc::new(EmailSender::new(SmtpConfig::default()));
        let social = Arc::new(SocialClient::new(SocialConfig::default()));
        let site = SiteConfig::default();

        let notifier = Arc::new(ApprovalNotifier::new(
            content_repo.clone(),
            publisher_repo.clone(),
            subscription_repo.clone(),
            user_repo.clone(),
            email.clone(),
            social,
            site.clone(),
        ));

        let state = AppState {
            user_service: Arc::new(UserService::new(
                user_repo.clone(),
                session_repo,
                reset_token_repo,
                subscription_repo.clone(),
            )),
            content_service: Arc::new(ContentService::new(
                content_repo,
                publisher_repo.clone(),
                notifier,
            )),
            publisher_service: Arc::new(PublisherService::new(publisher_repo, user_repo.clone())),
            subscription_service: Arc::new(SubscriptionService::new(
                subscription_repo,
                SqlxPublisherRepository::boxed(pool.clone()),
                user_repo,
            )),
            rate_limiter: Arc::new(LoginRateLimiter::new()),
            email,
            site,
        };

        TestServer::new(build_router(state, "http://localhost:3000")).expect("server")
    }

    async fn register_and_login(server: &TestServer, username: &str, role: &str) -> String {
        let response = server
            .post("/api/v1/auth/register")
            .json(&json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": "correct-horse",
                "role": role,
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);

        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({
                "username_or_email": username,
                "password": "correct-horse",
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);

        response.json::<Value>()["token"]
            .as_str()
            .expect("token")
            .to_string()
    }

    fn bearer(token: &str) -> (axum::http::HeaderName, axum::http::HeaderValue) {
        (
            axum::http::header::AUTHORIZATION,
            axum::http::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_articles_require_authentication() {
        let server = test_server().await;

        let response = server.get("/api/v1/articles").await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_articles_are_reader_only() {
        let server = test_server().await;
        let token = register_and_login(&server, "jsmith", "journalist").await;

        let (name, value) = bearer(&token);
        let response = server.get("/api/v1/articles").add_header(name, value).await;
        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_independent_article_visible_to_any_reader() {
        let server = test_server().await;
        let journalist_token = register_and_login(&server, "indy", "journalist").await;
        let reader_token = register_and_login(&server, "reader", "reader").await;

        let (name, value) = bearer(&journalist_token);
        let response = server
            .post("/api/v1/content")
            .add_header(name, value)
            .json(&json!({
                "kind": "article",
                "title": "Standalone story",
                "body": "Written without a publisher.",
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        let created = response.json::<Value>();
        assert_eq!(created["status"], "approved");

        // The reader has zero subscriptions and still sees the piece
        let (name, value) = bearer(&reader_token);
        let response = server.get("/api/v1/articles").add_header(name, value).await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let articles = response.json::<Vec<Value>>();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0]["title"], "Standalone story");
    }

    #[tokio::test]
    async fn test_full_editorial_workflow_over_http() {
        let server = test_server().await;
        let manager_token = register_and_login(&server, "boss", "manager").await;
        let journalist_token = register_and_login(&server, "jsmith", "journalist").await;
        let editor_token = register_and_login(&server, "editor", "editor").await;
        let reader_a_token = register_and_login(&server, "reader_a", "reader").await;
        let reader_b_token = register_and_login(&server, "reader_b", "reader").await;

        // Manager creates the publisher and affiliates the staff
        let (name, value) = bearer(&manager_token);
        let response = server
            .post("/api/v1/publishers")
            .add_header(name.clone(), value.clone())
            .json(&json!({ "name": "The Daily", "description": "All the news" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        let publisher_id = response.json::<Value>()["id"].as_i64().expect("id");

        // Look up user IDs through /auth/me for each staff member
        let (jn, jv) = bearer(&journalist_token);
        let journalist_id = server
            .get("/api/v1/auth/me")
            .add_header(jn.clone(), jv.clone())
            .await
            .json::<Value>()["id"]
            .as_i64()
            .expect("id");
        let (en, ev) = bearer(&editor_token);
        let editor_id = server
            .get("/api/v1/auth/me")
            .add_header(en.clone(), ev.clone())
            .await
            .json::<Value>()["id"]
            .as_i64()
            .expect("id");

        let response = server
            .post(&format!(
                "/api/v1/publishers/{}/journalists/{}",
                publisher_id, journalist_id
            ))
            .add_header(name.clone(), value.clone())
            .await;
        assert_eq!(response.status_code(), StatusCode::NO_CONTENT);
        let response = server
            .post(&format!(
                "/api/v1/publishers/{}/editors/{}",
                publisher_id, editor_id
            ))
            .add_header(name, value)
            .await;
        assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

        // Reader A subscribes to the publisher; reader B stays unsubscribed
        let (ran, rav) = bearer(&reader_a_token);
        let response = server
            .post("/api/v1/subscriptions")
            .add_header(ran.clone(), rav.clone())
            .json(&json!({ "target_kind": "publisher", "target_id": publisher_id }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);

        // Journalist submits an article to the publisher
        let response = server
            .post("/api/v1/content")
            .add_header(jn, jv)
            .json(&json!({
                "kind": "article",
                "title": "Scoop",
                "body": "Publisher-owned reporting.",
                "publisher_id": publisher_id,
                "submit": true,
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        let item = response.json::<Value>();
        assert_eq!(item["status"], "pending_approval");
        let item_id = item["id"].as_i64().expect("id");

        // Not visible to anyone while pending
        let response = server
            .get("/api/v1/articles")
            .add_header(ran.clone(), rav.clone())
            .await;
        assert_eq!(response.json::<Vec<Value>>().len(), 0);

        // Editor finds it in the queue and approves it
        let response = server
            .get("/api/v1/review/queue")
            .add_header(en.clone(), ev.clone())
            .await;
        let queue = response.json::<Vec<Value>>();
        assert_eq!(queue.len(), 1);

        let response = server
            .post(&format!("/api/v1/content/{}/approve", item_id))
            .add_header(en.clone(), ev.clone())
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>()["status"], "approved");

        // A second approval loses the state check
        let response = server
            .post(&format!("/api/v1/content/{}/approve", item_id))
            .add_header(en, ev)
            .await;
        assert_eq!(response.status_code(), StatusCode::CONFLICT);

        // Subscribed reader A sees the article; reader B does not
        let response = server
            .get("/api/v1/articles")
            .add_header(ran.clone(), rav.clone())
            .await;
        let articles = response.json::<Vec<Value>>();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0]["title"], "Scoop");

        let (rbn, rbv) = bearer(&reader_b_token);
        let response = server.get("/api/v1/articles").add_header(rbn, rbv).await;
        assert_eq!(response.json::<Vec<Value>>().len(), 0);

        // The single-item endpoint applies the same visibility
        let response = server
            .get(&format!("/api/v1/feed/{}", item_id))
            .add_header(ran, rav)
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_my_subscriptions_listing() {
        let server = test_server().await;
        let manager_token = register_and_login(&server, "boss", "manager").await;
        register_and_login(&server, "jsmith", "journalist").await;
        let reader_token = register_and_login(&server, "reader", "reader").await;

        let (mn, mv) = bearer(&manager_token);
        let publisher_id = server
            .post("/api/v1/publishers")
            .add_header(mn, mv)
            .json(&json!({ "name": "The Daily" }))
            .await
            .json::<Value>()["id"]
            .as_i64()
            .expect("id");

        let (rn, rv) = bearer(&reader_token);
        server
            .post("/api/v1/subscriptions")
            .add_header(rn.clone(), rv.clone())
            .json(&json!({ "target_kind": "publisher", "target_id": publisher_id }))
            .await;

        let response = server
            .get("/api/v1/my-subscriptions")
            .add_header(rn, rv)
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let summary = response.json::<Value>();
        assert_eq!(summary["publishers"][0], "The Daily");
    }

    #[tokio::test]
    async fn test_unknown_role_rejected_at_registration() {
        let server = test_server().await;

        let response = server
            .post("/api/v1/auth/register")
            .json(&json!({
                "username": "ghost",
                "email": "ghost@example.com",
                "password": "correct-horse",
                "role": "admin",
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }
}
