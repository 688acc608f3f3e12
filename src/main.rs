use std::{process, sync::Arc, time::Duration};

use storefront::{
    application::{
        auth::TokenService,
        carts::CartService,
        error::AppError,
        listing::ListService,
        monitor::HealthMonitor,
        orders::OrderService,
        repos::{
            AccessTokensRepo, CartsRepo, CollectionRepo, OrdersRepo, ReadinessCheck, ReviewsRepo,
            ServiceChecksRepo, WishlistsRepo,
        },
        reviews::ReviewService,
    },
    cache::{CacheConfig, build_store},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState, RouterState},
        telemetry,
    },
};
use tokio::sync::oneshot;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Probe(_) => run_probe(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let monitor = build_monitor(&repositories, &settings)?;
    let state = build_router_state(repositories, monitor.clone(), &settings);

    let monitor_handle = if settings.monitor.enabled && !monitor.targets().is_empty() {
        let interval = settings.monitor.interval;
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // Skip the first immediate tick
            loop {
                ticker.tick().await;
                monitor.run_all().await;
            }
        }))
    } else {
        info!(
            target: "storefront::monitor",
            "periodic health monitor disabled"
        );
        None
    };

    let result = serve_http(&settings, state).await;

    if let Some(handle) = monitor_handle {
        handle.abort();
    }

    result
}

async fn run_probe(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let monitor = build_monitor(&repositories, &settings)?;

    if monitor.targets().is_empty() {
        warn!(
            target: "storefront::monitor",
            "no monitor targets configured"
        );
        return Ok(());
    }

    let checks = monitor.run_all().await;
    let rendered = serde_json::to_string_pretty(&checks)
        .map_err(|err| AppError::unexpected(format!("failed to render checks: {err}")))?;
    println!("{rendered}");
    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(
        database_url,
        settings.database.max_connections.get(),
        settings.database.acquire_timeout,
    )
    .await
    .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_monitor(
    repositories: &Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<Arc<HealthMonitor>, AppError> {
    let checks_repo: Arc<dyn ServiceChecksRepo> = repositories.clone();
    let monitor = HealthMonitor::new(
        checks_repo,
        settings.monitor.targets.clone(),
        settings.monitor.timeout,
    )
    .map_err(|err| AppError::unexpected(err.to_string()))?;
    Ok(Arc::new(monitor))
}

fn build_router_state(
    repositories: Arc<PostgresRepositories>,
    monitor: Arc<HealthMonitor>,
    settings: &config::Settings,
) -> RouterState {
    let collections_repo: Arc<dyn CollectionRepo> = repositories.clone();
    let tokens_repo: Arc<dyn AccessTokensRepo> = repositories.clone();
    let reviews_repo: Arc<dyn ReviewsRepo> = repositories.clone();
    let carts_repo: Arc<dyn CartsRepo> = repositories.clone();
    let wishlists_repo: Arc<dyn WishlistsRepo> = repositories.clone();
    let orders_repo: Arc<dyn OrdersRepo> = repositories.clone();
    let readiness: Arc<dyn ReadinessCheck> = repositories;

    let cache_config = CacheConfig::from(&settings.cache);
    let store = build_store(&cache_config);
    info!(
        target: "storefront::cache",
        enabled = cache_config.enabled,
        capacity = cache_config.capacity,
        default_ttl_secs = cache_config.default_ttl_secs,
        "response cache configured"
    );

    let lists = Arc::new(ListService::new(
        collections_repo,
        store,
        cache_config,
        settings.pagination,
    ));

    RouterState {
        api: ApiState {
            lists,
            tokens: Arc::new(TokenService::new(tokens_repo)),
            reviews: Arc::new(ReviewService::new(reviews_repo)),
            carts: Arc::new(CartService::new(carts_repo, wishlists_repo)),
            orders: Arc::new(OrderService::new(orders_repo)),
            monitor,
        },
        readiness,
    }
}

async fn serve_http(settings: &config::Settings, state: RouterState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(addr = %settings.server.addr, "storefront listening");

    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, router.into_make_service()).with_graceful_shutdown(
        async move {
            shutdown_signal().await;
            let _ = signalled_tx.send(());
        },
    );

    let grace = settings.server.graceful_shutdown;
    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        _ = drain_deadline(signalled_rx, grace) => {
            warn!(grace_secs = grace.as_secs(), "graceful shutdown timed out");
        }
    }

    info!("storefront stopped");
    Ok(())
}

async fn drain_deadline(signalled: oneshot::Receiver<()>, grace: Duration) {
    if signalled.await.is_err() {
        std::future::pending::<()>().await;
    }
    tokio::time::sleep(grace).await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(err) => {
                error!(error = %err, "failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
