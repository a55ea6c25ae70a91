//! Shared fixtures for unit and integration tests.

use axum::http::HeaderValue;
use axum_test::TestServer;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::sync::mpsc::Receiver;

use crate::{
    AppState,
    api::models::threads::ThreadCreate,
    auth::{
        password::{self, Argon2Params},
        session,
    },
    config::{Config, EmailConfig, EmailTransportConfig, PasswordConfig},
    db::{
        handlers::{Repository, Users},
        models::users::{UserCreateDBRequest, UserDBResponse},
    },
    notifications::{EmailQueue, QueuedEmail},
    types::UserId,
};

pub const TEST_PASSWORD: &str = "password123";

pub fn create_test_config() -> Config {
    // Emails written by tests land in a per-process temp dir
    let temp_dir = std::env::temp_dir().join(format!("threadstocks-test-emails-{}", std::process::id()));

    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        auth: crate::config::AuthConfig {
            // Cheapest argon2 settings the crate accepts
            password: PasswordConfig {
                argon2_memory_kib: 64,
                argon2_iterations: 1,
                argon2_parallelism: 1,
                ..Default::default()
            },
            ..Default::default()
        },
        email: EmailConfig {
            transport: EmailTransportConfig::File {
                path: temp_dir.to_string_lossy().to_string(),
            },
            ..Default::default()
        },
        ..Default::default()
    }
}

/// State whose pool never connects unless a query is actually run
pub fn create_lazy_state() -> AppState {
    let db = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/threadstocks_test")
        .expect("Failed to create lazy pool");
    let (emails, _receiver) = EmailQueue::channel(8);

    AppState::builder().db(db).config(create_test_config()).emails(emails).build()
}

/// State backed by `pool`, plus the receiving end of its email queue so tests can inspect what
/// would have been sent
pub fn create_test_state(pool: PgPool) -> (AppState, Receiver<QueuedEmail>) {
    let config = create_test_config();
    let (emails, receiver) = EmailQueue::channel(config.email.queue_capacity);
    let state = AppState::builder().db(pool).config(config).emails(emails).build();
    (state, receiver)
}

pub fn create_test_server(pool: PgPool) -> (TestServer, AppState, Receiver<QueuedEmail>) {
    let (state, receiver) = create_test_state(pool);
    let router = crate::build_router(state.clone()).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to create test server");
    (server, state, receiver)
}

/// Insert a user named `name` with email `{name}@example.com`. Returns the user and their
/// plaintext password.
pub async fn create_test_user(pool: &PgPool, name: &str) -> (UserDBResponse, String) {
    let params = Argon2Params::from(&create_test_config().auth.password);
    let password_hash = password::hash_string_with_params(TEST_PASSWORD, params).expect("Failed to hash password");

    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let user = Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password_hash,
        })
        .await
        .expect("Failed to create test user");

    (user, TEST_PASSWORD.to_string())
}

/// `Cookie` header value carrying a fresh session for `user_id`
pub fn session_cookie(state: &AppState, user_id: UserId) -> HeaderValue {
    let token = session::create_session_token(user_id, &state.config).expect("Failed to create session token");
    HeaderValue::from_str(&format!("{}={token}", state.config.auth.session.cookie_name)).expect("Invalid cookie header")
}

/// `Authorization` header value carrying a fresh session for `user_id`
pub fn bearer(state: &AppState, user_id: UserId) -> HeaderValue {
    let token = session::create_session_token(user_id, &state.config).expect("Failed to create session token");
    HeaderValue::from_str(&format!("Bearer {token}")).expect("Invalid authorization header")
}

pub fn test_thread(thread_id: &str) -> ThreadCreate {
    ThreadCreate {
        thread_id: thread_id.to_string(),
        is_e: false,
        is_c: true,
        is_s: false,
        brand: "DMC".to_string(),
        thread_count: 1,
    }
}

/// Emails the file transport wrote into `dir`, with quoted-printable soft line breaks and `=3D`
/// escapes undone so bodies can be searched for links
pub fn sent_emails(dir: &std::path::Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .expect("Failed to read email dir")
        .map(|entry| entry.expect("Failed to read email entry").path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "eml"))
        .map(|path| std::fs::read_to_string(path).expect("Failed to read email"))
        .map(|raw| raw.replace("=\r\n", "").replace("=\n", "").replace("=3D", "="))
        .collect()
}
