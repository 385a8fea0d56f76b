//! Newsroom - a role-based news publishing backend

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use newsroom::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{
            SqlxContentRepository, SqlxPublisherRepository, SqlxResetTokenRepository,
            SqlxSessionRepository, SqlxSubscriptionRepository, SqlxUserRepository,
        },
    },
    notify::{ApprovalNotifier, EmailSender, SocialClient},
    services::{
        ContentService, LoginRateLimiter, PublisherService, SubscriptionService, UserService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "newsroom=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting newsroom...");

    // Load configuration
    let config = Config::load(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {}", config.database.url);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Create repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let session_repo = SqlxSessionRepository::boxed(pool.clone());
    let reset_token_repo = SqlxResetTokenRepository::boxed(pool.clone());
    let subscription_repo = SqlxSubscriptionRepository::boxed(pool.clone());
    let publisher_repo = SqlxPublisherRepository::boxed(pool.clone());
    let content_repo = SqlxContentRepository::boxed(pool.clone());

    // Outbound clients: one email sender and one social client for the
    // process lifetime, injected into the notifier
    let email = Arc::new(EmailSender::new(config.smtp.clone()));
    let social = Arc::new(SocialClient::new(config.social.clone()));
    if !email.is_configured() {
        tracing::warn!("SMTP is not configured; notification emails are disabled");
    }
    if !social.is_enabled() {
        tracing::info!("Social posting is disabled");
    }

    let notifier = Arc::new(ApprovalNotifier::new(
        content_repo.clone(),
        publisher_repo.clone(),
        subscription_repo.clone(),
        user_repo.clone(),
        email.clone(),
        social,
        config.site.clone(),
    ));

    // Initialize services
    let user_service = Arc::new(UserService::new(
        user_repo.clone(),
        session_repo.clone(),
        reset_token_repo.clone(),
        subscription_repo.clone(),
    ));
    let content_service = Arc::new(ContentService::new(
        content_repo,
        publisher_repo.clone(),
        notifier,
    ));
    let publisher_service = Arc::new(PublisherService::new(publisher_repo.clone(), user_repo.clone()));
    let subscription_service = Arc::new(SubscriptionService::new(
        subscription_repo,
        publisher_repo,
        user_repo,
    ));

    let rate_limiter = Arc::new(LoginRateLimiter::new());

    // Build application state
    let state = AppState {
        user_service,
        content_service,
        publisher_service,
        subscription_service,
        rate_limiter: rate_limiter.clone(),
        email,
        site: config.site.clone(),
    };

    // Housekeeping: drop expired sessions/tokens and stale limiter entries
    // every 5 minutes
    {
        let session_repo = session_repo.clone();
        let reset_token_repo = reset_token_repo.clone();
        let limiter = rate_limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(300));
            loop {
                interval.tick().await;
                if let Err(e) = session_repo.delete_expired().await {
                    tracing::warn!("Session cleanup failed: {}", e);
                }
                if let Err(e) = reset_token_repo.delete_expired().await {
                    tracing::warn!("Reset token cleanup failed: {}", e);
                }
                limiter.cleanup().await;
            }
        });
    }

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
