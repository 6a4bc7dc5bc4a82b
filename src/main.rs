use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use clap::Parser;
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use tinta::auth::{password, session};
use tinta::config::{Cli, Config};
use tinta::db::{self, users};
use tinta::routes;
use tinta::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli);
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;

    // Initialize database
    let pool = db::create_pool(config.db_path())?;
    db::run_migrations(&pool)?;

    // Seed the admin account if configured. No other path creates one.
    if let Some(ref admin_password) = config.auth.bootstrap_admin_password {
        let hash = password::hash(admin_password)?;
        let conn = pool.get()?;
        users::bootstrap_admin(&conn, &hash)?;
        tracing::info!("Admin account ensured");
    }

    // Build app state
    let state = AppState::new(pool, config.clone());

    // Build router
    let mut app = Router::new()
        .route("/assets/{*path}", get(routes::assets::serve))
        .merge(routes::auth::router())
        .merge(routes::home::router())
        .merge(routes::posts::router())
        .merge(routes::profile::router())
        .merge(routes::admin::router());

    // Test-only seed endpoint: creates a user + session, returns session cookie
    if std::env::var("TINTA_TEST_SEED").is_ok() {
        app = app.route("/test/seed", get(test_seed));
    }

    let app = app.layer(TraceLayer::new_for_http()).with_state(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Test-only: seed a user + session and return the session cookie.
/// Only mounted when TINTA_TEST_SEED env var is set.
async fn test_seed(State(state): State<AppState>) -> impl IntoResponse {
    let conn = state.db.get().unwrap();
    let hash = password::hash("testpass").unwrap();
    let _ = users::create(&conn, "testuser", &hash);

    // The account may already exist from a previous seed call
    let (user, _) = users::find_credentials(&conn, "testuser").unwrap().unwrap();
    drop(conn);

    let token = session::create_session(&state.db, &user, state.config.auth.session_hours).unwrap();

    let cookie = format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age=3600",
        state.config.auth.cookie_name, token
    );

    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        format!(
            "{{\"user_id\":{},\"username\":\"testuser\"}}",
            user.id
        ),
    )
}
