mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::Config;
use crate::core::database;
use crate::core::router::{build_router, swagger_routes, AppServices};
use crate::features::auth::repositories::PgRefreshTokenRepository;
use crate::features::auth::services::{AuthService, PasswordHasher, TokenService};
use crate::features::files::repositories::PgFileRepository;
use crate::features::files::services::{FileService, QuotaPolicy};
use crate::features::users::repositories::PgUserRepository;
use crate::features::users::services::{ProfileService, UserService};
use crate::modules::storage::{MinIOClient, ObjectStore};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "Configuration loaded: tokio_worker_threads={}, pid={}",
        worker_threads,
        std::process::id()
    );

    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    let minio_client = MinIOClient::new(config.minio.clone())
        .map_err(|e| anyhow::anyhow!("Failed to initialize MinIO client: {}", e))?;
    minio_client
        .ensure_bucket_exists()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to ensure MinIO bucket exists: {}", e))?;
    tracing::info!(
        "MinIO client initialized for bucket: {}",
        minio_client.bucket_name()
    );

    // Repositories
    let user_repository = Arc::new(PgUserRepository::new(pool.clone()));
    let file_repository = Arc::new(PgFileRepository::new(pool.clone()));
    let refresh_token_repository = Arc::new(PgRefreshTokenRepository::new(pool.clone()));

    // Services
    let token_service = Arc::new(TokenService::new(&config.jwt));
    let user_service = Arc::new(UserService::new(
        user_repository,
        PasswordHasher::new(config.jwt.bcrypt_cost),
    ));
    let auth_service = Arc::new(AuthService::new(
        Arc::clone(&user_service),
        Arc::clone(&token_service),
        refresh_token_repository,
        config.app.registration_enabled,
    ));
    tracing::info!(
        "Auth service initialized (registration {})",
        if config.app.registration_enabled {
            "enabled"
        } else {
            "disabled"
        }
    );

    let file_service = Arc::new(FileService::new(
        file_repository,
        Arc::new(minio_client),
        QuotaPolicy::new(config.storage.quota_bytes),
        config.app.max_upload_size,
    ));
    tracing::info!(
        "File service initialized (quota={} bytes, max upload={} bytes)",
        config.storage.quota_bytes,
        config.app.max_upload_size
    );

    let profile_service = Arc::new(ProfileService::new(
        user_service,
        Arc::clone(&auth_service),
        Arc::clone(&file_service),
    ));

    let app = build_router(
        AppServices {
            token_service,
            auth_service,
            profile_service,
            file_service,
        },
        &config.app,
    )
    .merge(swagger_routes(&config.swagger));

    // Start server
    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(std::time::Duration::from_secs(60))
            .with_interval(std::time::Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
