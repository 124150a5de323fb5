use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use common::{
    cache::{RedisConfig, RedisPool},
    database,
};
use web::{
    AppState,
    auth::AuthService,
    codes::CodeService,
    config::{SessionBackend, WebConfig},
    gateway::{GatewayConfig, HttpQrGateway},
    rate_limiter::RateLimiter,
    repositories::{self, PgCodeStore, PgUserStore},
    routes,
    session::{MemorySessionStore, RedisSessionStore, SessionStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting QR web service");

    let web_config = WebConfig::from_env()?;

    // Initialize database connection pool
    let db_config = database::DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    repositories::run_migrations(&pool).await?;

    let sessions: Arc<dyn SessionStore> = match web_config.session_backend {
        SessionBackend::Memory => {
            info!("Keeping sessions in memory");
            Arc::new(MemorySessionStore::new(web_config.session_ttl))
        }
        SessionBackend::Redis => {
            let redis_config = RedisConfig::from_env();
            let redis_pool = RedisPool::new(&redis_config).await?;
            info!("Keeping sessions in Redis");
            Arc::new(RedisSessionStore::new(redis_pool, web_config.session_ttl))
        }
    };

    let gateway_config = GatewayConfig::from_env()?;
    let gateway_deadline = gateway_config.timeout;
    let gateway = HttpQrGateway::new(gateway_config)?;

    let users = Arc::new(PgUserStore::new(pool.clone()));
    let codes = Arc::new(PgCodeStore::new(pool));

    let app_state = AppState {
        auth: AuthService::new(users.clone(), sessions, RateLimiter::default()),
        codes: CodeService::new(codes, users, Arc::new(gateway), gateway_deadline),
        cookie_secure: web_config.cookie_secure,
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let addr = web_config.bind_addr();
    let listener = TcpListener::bind(addr).await?;
    info!("QR web service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
