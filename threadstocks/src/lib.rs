//! # threadstocks: multi-user thread inventory backend
//!
//! `threadstocks` is an HTTP API where people register, sign in, and keep an inventory of
//! embroidery threads. Every thread record belongs to exactly one user, and every read or write of
//! a thread is checked against the signed-in user.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer and
//! uses PostgreSQL for persistence.
//!
//! ### Request Flow
//!
//! Public routes (registration, login, logout, password reset, contact) are handled directly.
//! Everything under `/users` and `/threads` first passes through
//! [`require_session`](auth::middleware::require_session), which resolves the session token from
//! the `token` cookie or an `Authorization: Bearer` header and attaches the user to the request.
//! Handlers then delegate to [`services`], which enforce ownership and run repository calls from
//! [`db`] inside transactions.
//!
//! Emails (password reset links, contact form messages) are queued on an in-process channel and
//! delivered by a background worker, so a slow mail server never holds up a response.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use threadstocks::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = threadstocks::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     threadstocks::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! Migrations run automatically on startup. To run them yourself:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//! threadstocks::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod email;
pub mod errors;
pub mod notifications;
mod openapi;
pub mod services;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{self, HeaderValue},
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use bon::Builder;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument, warn};
use utoipa::OpenApi;

use crate::{
    api::handlers::{auth as auth_handlers, contact, threads, users},
    auth::middleware::require_session,
    config::CorsOrigin,
    email::EmailService,
    notifications::{EmailQueue, EmailWorker},
    openapi::ApiDoc,
};

pub use config::Config;
pub use types::{ThreadId, UserId};

/// Application state shared across all request handlers.
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .emails(queue)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Outbound email queue, drained by the [`EmailWorker`]
    pub emails: EmailQueue,
}

/// Get the threadstocks database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    info!("Connecting to database");
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await?;

    migrator().run(&pool).await?;
    debug!("Database migrations applied");

    Ok(pool)
}

fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let allowed = &config.auth.security.cors.allowed_origins;

    // tower-http refuses `*` inside an origin list, so a wildcard anywhere means any origin
    let allow_origin = if allowed.iter().any(|origin| matches!(origin, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in allowed {
            if let CorsOrigin::Url(url) = origin {
                // Url serialization adds a trailing slash that browsers never send in Origin
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PUT,
            http::Method::PATCH,
            http::Method::DELETE,
        ])
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
        .allow_credentials(config.auth.security.cors.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.auth.security.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
///
/// Routes under `/users` and `/threads` require a session; the rest are public. The router is
/// wrapped in a body size limit, CORS, and request tracing.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let public_routes = Router::new()
        .route("/register", post(auth_handlers::register))
        .route("/login", post(auth_handlers::login))
        .route("/logout", post(auth_handlers::logout))
        .route("/forgot-password", post(auth_handlers::forgot_password))
        .route("/reset-password", post(auth_handlers::reset_password))
        .route("/contact", post(contact::send_contact_message))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }));

    let protected_routes = Router::new()
        .route("/users/me", get(users::get_current_user))
        .route("/users/update-password", put(users::update_password))
        .route(
            "/threads",
            get(threads::list_threads)
                .post(threads::create_thread)
                .patch(threads::update_threads)
                .put(threads::update_threads)
                .delete(threads::delete_threads),
        )
        .route(
            "/threads/{id}",
            get(threads::get_thread)
                .patch(threads::update_thread)
                .put(threads::update_thread)
                .delete(threads::delete_thread),
        )
        .route_layer(from_fn_with_state(state.clone(), require_session));

    let cors_layer = create_cors_layer(&state.config)?;
    let body_limit = DefaultBodyLimit::max(state.config.limits.max_request_body_bytes);

    let router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(body_limit)
        .layer(cors_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// Tasks that run alongside the HTTP server.
///
/// Currently only the email worker. Cancelling the token tells it to drain the queue and exit.
pub struct BackgroundServices {
    background_tasks: Vec<JoinHandle<()>>,
    shutdown_token: CancellationToken,
}

impl BackgroundServices {
    /// Gracefully shutdown all background tasks
    pub async fn shutdown(self) {
        self.shutdown_token.cancel();

        for handle in self.background_tasks {
            let _ = handle.await;
        }
    }
}

fn setup_background_services(config: &Config) -> anyhow::Result<(BackgroundServices, EmailQueue)> {
    let shutdown_token = CancellationToken::new();

    let email_service = EmailService::new(config)?;
    let (worker, queue) = EmailWorker::new(email_service, config.email.queue_capacity);
    let handle = tokio::spawn(worker.run(shutdown_token.clone()));

    let services = BackgroundServices {
        background_tasks: vec![handle],
        shutdown_token,
    };
    Ok((services, queue))
}

/// The running application: router, database pool and background services.
///
/// 1. **Create**: [`Application::new`] connects to the database, runs migrations, and starts the
///    email worker
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: when the shutdown future resolves, in-flight requests finish, queued emails
///    are delivered, and the pool is closed
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
    bg_services: BackgroundServices,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting threadstocks with configuration: {:#?}", config.redacted());

        if config.auth.session.cookie_max_age < config.auth.security.jwt_expiry {
            warn!(
                cookie_max_age = %humantime::format_duration(config.auth.session.cookie_max_age),
                jwt_expiry = %humantime::format_duration(config.auth.security.jwt_expiry),
                "Session cookie expires before the token it carries; cookie sessions end early"
            );
        }

        let pool = setup_database(&config).await?;
        let (bg_services, emails) = setup_background_services(&config)?;

        let app_state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .emails(emails)
            .build();

        let router = build_router(app_state)?;

        Ok(Self {
            router,
            config,
            pool,
            bg_services,
        })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "threadstocks listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Stopping background services...");
        self.bg_services.shutdown().await;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::{create_lazy_state, create_test_config};
    use axum::http::{StatusCode, header};
    use axum_test::TestServer;
    use url::Url;

    #[tokio::test]
    async fn test_protected_routes_require_session() {
        let router = build_router(create_lazy_state()).unwrap();
        let server = TestServer::new(router).unwrap();

        for path in ["/users/me", "/threads", "/threads/1"] {
            let response = server.get(path).await;
            response.assert_status(StatusCode::UNAUTHORIZED);
        }
        server.delete("/threads").await.assert_status(StatusCode::UNAUTHORIZED);
        server.put("/users/update-password").await.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_openapi_document_is_public() {
        let server = TestServer::new(build_router(create_lazy_state()).unwrap()).unwrap();

        let response = server.get("/openapi.json").await;

        response.assert_status_ok();
        let doc: serde_json::Value = response.json();
        assert!(doc["paths"]["/threads/{id}"].is_object());
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_configured_origin() {
        let server = TestServer::new(build_router(create_lazy_state()).unwrap()).unwrap();

        let response = server
            .method(http::Method::OPTIONS, "/login")
            .add_header(header::ORIGIN, "http://localhost:5173")
            .add_header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .await;

        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:5173"
        );
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
    }

    #[test]
    fn test_cors_layer_accepts_wildcard_without_credentials() {
        let mut config = create_test_config();
        config.auth.security.cors.allowed_origins =
            vec![CorsOrigin::Wildcard, CorsOrigin::Url(Url::parse("https://app.example.com").unwrap())];
        config.auth.security.cors.allow_credentials = false;

        assert!(create_cors_layer(&config).is_ok());
    }

    #[tokio::test]
    async fn test_wildcard_origin_allows_any_origin() {
        let mut state = create_lazy_state();
        state.config.auth.security.cors.allowed_origins = vec![CorsOrigin::Wildcard];
        state.config.auth.security.cors.allow_credentials = false;
        let server = TestServer::new(build_router(state).unwrap()).unwrap();

        let response = server
            .method(http::Method::OPTIONS, "/login")
            .add_header(header::ORIGIN, "https://elsewhere.example.org")
            .add_header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .await;

        assert_eq!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
    }
}
