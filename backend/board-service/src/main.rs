use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use board_service::activity::{ActivityCategory, ActivityEntry, ActivityLevel, ActivityLog};
use board_service::config::StoreBackend;
use board_service::db::{
    create_pool, ensure_posts_table, seed_sample_posts, DbConfig, InMemoryPostStore, PgPostStore,
    PostStore,
};
use board_service::handlers::{configure_routes, AppState};
use board_service::interpreter::InterpreterSwitch;
use board_service::services::{BoardService, PostService};
use board_service::Config;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    }
}

fn init_tracing(json_logs: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());

    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn PostStore>> {
    match config.database.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory post store; data is lost on restart");
            Ok(Arc::new(InMemoryPostStore::new()))
        }
        StoreBackend::Postgres => {
            let db_config = DbConfig::from(&config.database);
            db_config.log_config();

            let pool = create_pool(db_config)
                .await
                .context("failed to create database pool")?;
            ensure_posts_table(&pool)
                .await
                .context("failed to ensure posts table")?;
            Ok(Arc::new(PgPostStore::new(pool)))
        }
    }
}

/// Board Service
///
/// Serves the post CRUD API, free-text chart and management commands,
/// interpreter control and the activity log.
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Support container healthchecks via CLI subcommand
    if std::env::args().nth(1).as_deref() == Some("healthcheck") {
        let port = std::env::var("BOARD_SERVICE_PORT").unwrap_or_else(|_| "8000".to_string());
        let url = format!("http://127.0.0.1:{}/api/v1/health/live", port);
        let resp = reqwest::Client::new()
            .get(&url)
            .send()
            .await
            .context("healthcheck request failed")?;
        if resp.status().is_success() {
            return Ok(());
        }
        anyhow::bail!("healthcheck HTTP status: {}", resp.status());
    }

    let _ = dotenvy::dotenv();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(config.app.json_logs);

    tracing::info!("Starting board-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let store = build_store(&config).await?;

    if config.board.seed_sample_data {
        match seed_sample_posts(store.as_ref()).await {
            Ok(0) => tracing::debug!("Store already has posts, skipping sample data"),
            Ok(n) => tracing::info!(inserted = n, "Sample posts inserted"),
            Err(e) => tracing::warn!(error = %e, "Failed to insert sample posts"),
        }
    }

    let activity = Arc::new(ActivityLog::new(config.board.activity_capacity));
    let interpreter = Arc::new(InterpreterSwitch::from_config(&config.llm, activity.clone()));
    let board = BoardService::new(PostService::new(store), interpreter.clone(), activity.clone());

    activity.record(ActivityEntry::new(
        ActivityLevel::Info,
        ActivityCategory::System,
        format!("board-service started ({})", config.app.env),
    ));

    let state = web::Data::new(AppState::new(board, interpreter, activity));
    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    let allowed_origins = config.cors.allowed_origins.clone();

    tracing::info!("Starting HTTP server on {}", bind_address);

    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(configure_routes)
    })
    .bind(&bind_address)
    .with_context(|| format!("failed to bind {}", bind_address))?
    .workers(4)
    .disable_signals()
    .run();

    let handle = server.handle();
    let server_task = actix_web::rt::spawn(server);

    shutdown_signal().await;
    tracing::info!("Shutdown signal received");
    handle.stop(true).await;

    server_task
        .await
        .context("server task panicked")?
        .context("server error")?;

    tracing::info!("Board-service shut down");
    Ok(())
}
