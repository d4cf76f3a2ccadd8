//! Postboard - users, posts and comments behind bearer-token auth
//! Mission: Every request is authenticated and authorized before it touches data

use anyhow::{Context, Result};
use dotenv::dotenv;
use std::{path::Path, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use postboard_backend::{
    api::{router, AppState},
    auth::{BcryptHasher, JwtHandler, PasswordHasher, TokenService},
    config::AppConfig,
    store::SqliteStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    info!("🚀 Postboard starting");

    let config = AppConfig::from_env();
    info!("⚙️  {:?}", config);

    let hasher = Arc::new(
        BcryptHasher::new(config.bcrypt_cost).context("Failed to initialise password hasher")?,
    );

    let store = Arc::new(SqliteStore::open(&config.db_path)?);
    store.seed_admin(hasher.as_ref(), &config.admin_password)?;
    info!("💾 Store ready at: {}", config.db_path);

    let tokens: Arc<dyn TokenService> =
        Arc::new(JwtHandler::new(&config.jwt_secret, config.jwt_issuer.clone()));
    let hasher: Arc<dyn PasswordHasher> = hasher;

    let app = router(AppState::new(tokens, hasher, store));

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("🌐 Listening on http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "postboard_backend=debug,postboard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // Standard dotenv search (cwd + parents), then the crate root
    let _ = dotenv();

    let manifest_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if manifest_env.exists() {
        let _ = dotenv::from_path(&manifest_env);
    }
}
