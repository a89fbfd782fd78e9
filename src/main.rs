mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::{Config, DatabaseConfig};
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::session::SessionCodec;
use crate::core::{database, middleware};
use crate::features::admin::{routes as admin_routes, AdminState, ModerationService};
use crate::features::auth::clients::GoogleOAuthClient;
use crate::features::auth::{routes as auth_routes, AuthService};
use crate::features::comments::{routes as comments_routes, CommentService};
use crate::features::legends::{routes as legends_routes, LegendService, LegendState};
use crate::features::metadata::MetadataService;
use crate::features::notifications::NotificationService;
use crate::features::reports::{
    routes as reports_routes, InteractionService, ReportService, ReportState, SubmissionService,
};
use crate::features::users::{routes as users_routes, UserService, UserState};
use crate::modules::captcha::CaptchaVerifier;
use crate::modules::geolocation::IpApiClient;
use crate::modules::mail::Mailer;
use crate::modules::storage::{MediaStore, MinIOClient};
use crate::shared::locations::LocationCatalog;
use crate::shared::rate_limit::RateLimiter;
use axum::extract::DefaultBodyLimit;
use axum::{middleware::from_fn, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

const ADMIN_REALM: &str = "Login Required";
const RATE_LIMIT_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

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

    // `observatorio-core init-db` only prepares the schema
    if std::env::args().nth(1).as_deref() == Some("init-db") {
        let database_config = DatabaseConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;
        let pool = database::create_pool(&database_config).await?;
        database::run_migrations(&pool)
            .await
            .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
        tracing::info!("Database initialized");
        return Ok(());
    }

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    tracing::info!("Configuration loaded successfully");

    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    tracing::info!("Running database migrations...");
    database::run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    tracing::info!(
        "System info: available_cpus={}, tokio_worker_threads={}, pid={}",
        std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(1),
        worker_threads,
        std::process::id()
    );

    let catalog = Arc::new(LocationCatalog::load(&config.app.locations_file));

    // Media storage
    let minio_client = MinIOClient::new(config.minio.clone())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize MinIO client: {}", e))?;
    minio_client
        .ensure_bucket_exists()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to ensure MinIO bucket exists: {}", e))?;
    tracing::info!(
        "MinIO client initialized for bucket: {}",
        minio_client.bucket_name()
    );
    let media: Arc<dyn MediaStore> = Arc::new(minio_client);

    // External collaborators
    let captcha = Arc::new(
        CaptchaVerifier::new(&config.captcha)
            .map_err(|e| anyhow::anyhow!("Failed to initialize reCAPTCHA client: {}", e))?,
    );
    let ip_client = Arc::new(
        IpApiClient::new().map_err(|e| anyhow::anyhow!("Failed to create ip-api client: {}", e))?,
    );
    let mailer = Arc::new(
        Mailer::new(config.mail.clone())
            .map_err(|e| anyhow::anyhow!("Failed to initialize mailer: {}", e))?,
    );
    let google = GoogleOAuthClient::from_config(&config.oauth)
        .map_err(|e| anyhow::anyhow!("Failed to initialize Google OAuth client: {}", e))?;

    // Services
    let metadata_service = Arc::new(MetadataService::new(pool.clone(), ip_client));
    let notification_service = Arc::new(NotificationService::new(
        mailer,
        config.admin.notify_email.clone(),
        &config.app.public_url,
    ));
    let user_service = Arc::new(UserService::new(pool.clone()));
    let report_service = Arc::new(ReportService::new(pool.clone(), Arc::clone(&catalog)));
    let submission_service = Arc::new(SubmissionService::new(
        pool.clone(),
        Arc::clone(&catalog),
        Arc::clone(&media),
        captcha,
        Arc::clone(&metadata_service),
        Arc::clone(&notification_service),
    ));
    let interaction_service = Arc::new(InteractionService::new(
        pool.clone(),
        Arc::clone(&metadata_service),
    ));
    let comment_service = Arc::new(CommentService::new(
        pool.clone(),
        Arc::clone(&metadata_service),
    ));
    let legend_service = Arc::new(LegendService::new(pool.clone(), Arc::clone(&media)));
    let moderation_service = Arc::new(ModerationService::new(
        pool.clone(),
        Arc::clone(&media),
        Arc::clone(&user_service),
        notification_service,
    ));
    let auth_service = Arc::new(AuthService::new(google, Arc::clone(&user_service)));
    tracing::info!("Services initialized");

    // Per-IP limits on the public write endpoints
    let rate_limiter = Arc::new(RateLimiter::new());
    {
        let limiter = Arc::clone(&rate_limiter);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(RATE_LIMIT_CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                limiter.cleanup_old_entries();
                tracing::debug!(
                    "Rate limiter cleanup: {} keys tracked",
                    limiter.tracked_keys_count()
                );
            }
        });
    }

    // Build application router with dynamic swagger config
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn(middleware::basic_auth_middleware(
                Arc::new(credentials),
                "Swagger",
            )))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    let legend_state = LegendState {
        legend_service,
        catalog: Arc::clone(&catalog),
    };

    // Admin routes (HTTP Basic auth)
    let admin_credentials = Arc::new(format!(
        "{}:{}",
        config.admin.username, config.admin.password
    ));
    let admin = Router::new()
        .merge(admin_routes::routes(AdminState {
            moderation_service,
            comment_service: Arc::clone(&comment_service),
        }))
        .merge(legends_routes::admin_routes(legend_state.clone()))
        .route_layer(from_fn(middleware::basic_auth_middleware(
            admin_credentials,
            ADMIN_REALM,
        )));

    // Public routes
    let public_routes = Router::new()
        .merge(reports_routes::routes(
            ReportState {
                report_service: Arc::clone(&report_service),
                submission_service,
                interaction_service,
                comment_service: Arc::clone(&comment_service),
            },
            &rate_limiter,
        ))
        .merge(comments_routes::routes(comment_service, &rate_limiter))
        .merge(legends_routes::routes(legend_state))
        .merge(auth_routes::routes(auth_service))
        .merge(users_routes::routes(UserState {
            user_service,
            report_service,
        }));

    // Simple health check endpoint (no auth required)
    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    let session_codec = Arc::new(SessionCodec::new(&config.session));

    let app = Router::new()
        .merge(swagger)
        .merge(admin)
        .merge(public_routes)
        .merge(health_route)
        .layer(axum::middleware::from_fn_with_state(
            session_codec,
            middleware::session_middleware,
        ))
        .layer(DefaultBodyLimit::max(config.app.max_request_body_size))
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        .layer(
            ServiceBuilder::new()
                // Generate X-Request-Id using UUID v7 (or use client-provided one)
                .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(middleware::MakeSpanWithRequestId)
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                // Propagate X-Request-Id to response headers
                .layer(PropagateRequestIdLayer::x_request_id()),
        );

    // Start server
    let addr = config.app.server_address();
    let socket_addr: SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nodelay(true)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(Duration::from_secs(60))
            .with_interval(Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    // Peer addresses feed ClientIp when no X-Forwarded-For is present
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
