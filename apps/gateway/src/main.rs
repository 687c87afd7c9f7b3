use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use amqp_worker::{BrokerClient, BrokerConfig, PoolConfig, RetryPolicy, WorkerPool};
use axum_helpers::{Lifecycle, ShutdownCoordinator};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_payments::{PaymentEventProcessor, PaymentRepository, PgPaymentRepository};
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info};

mod api;
mod config;
mod grpc;
mod middleware;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    // Load configuration from environment variables
    let config = Config::from_env()?;

    // Initialize tracing with ErrorLayer for span trace capture
    init_tracing(&config.environment);
    amqp_worker::init_metrics();

    info!(
        name = config.app.name,
        version = config.app.version,
        "starting payment gateway"
    );

    // Broker connection declares the fixed topology up front
    let broker = Arc::new(
        BrokerClient::connect(BrokerConfig::new(config.amqp.uri.clone()))
            .await
            .map_err(|e| eyre::eyre!("RabbitMQ connection failed: {e}"))?,
    );

    let db = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {e}"))?;

    sqlx::migrate!()
        .run(&db)
        .await
        .map_err(|e| eyre::eyre!("migrations failed: {e}"))?;
    info!("database migrations applied");

    let repository: Arc<dyn PaymentRepository> = Arc::new(PgPaymentRepository::new(db.clone()));

    // Consumer pool over the broker queue
    let pool = Arc::new(WorkerPool::start(
        Arc::new(broker.connector()),
        Arc::new(PaymentEventProcessor::new(Arc::clone(&repository))),
        PoolConfig {
            worker_count: config.worker.worker_count,
            retry: RetryPolicy::new(config.worker.max_retries, config.worker.retry_base_delay),
        },
    ));

    let publisher = Arc::new(
        broker
            .publisher()
            .await
            .map_err(|e| eyre::eyre!("could not open publisher channel: {e}"))?,
    );

    let (coordinator, _) = ShutdownCoordinator::new();
    let limiter = Arc::new(middleware::RateLimiter::new(config.rate_limit.clone()));
    let sweeper = middleware::rate_limit::spawn_sweeper(
        Arc::clone(&limiter),
        coordinator.subscribe(),
    );

    let app_state = AppState {
        config: config.clone(),
        repository: Arc::clone(&repository),
        db: db.clone(),
        publisher,
        limiter,
    };

    // HTTP server
    let http_addr: SocketAddr = config.server.address().parse()?;
    let listener = tokio::net::TcpListener::bind(http_addr).await?;
    info!(addr = %http_addr, "HTTP server started");

    let mut http_shutdown = coordinator.subscribe();
    let http_task = tokio::spawn(async move {
        axum::serve(
            listener,
            api::router(app_state).into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = http_shutdown.recv().await;
        })
        .await
    });

    // gRPC server
    let grpc_addr: SocketAddr = config.grpc.address().parse()?;
    let mut grpc_shutdown = coordinator.subscribe();
    let grpc_task = tokio::spawn(grpc::serve(grpc_addr, Arc::clone(&repository), async move {
        let _ = grpc_shutdown.recv().await;
    }));

    // Run until a signal arrives or the pool fails terminally
    tokio::select! {
        _ = coordinator.wait_for_signal() => {}
        err = pool.fatal_error() => {
            error!(error = %err, "worker pool failed, shutting down");
            coordinator.shutdown();
        }
    }

    // Ordered teardown: stop accepting work first, drain the pool, then
    // release the broker and database
    let mut lifecycle = Lifecycle::new();
    lifecycle.step("http", Duration::from_secs(10), async move {
        match http_task.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(e) => Err(e.to_string()),
        }
    });
    lifecycle.step("grpc", Duration::from_secs(10), async move {
        match grpc_task.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(e) => Err(e.to_string()),
        }
    });
    {
        let pool = Arc::clone(&pool);
        lifecycle.step("worker-pool", Duration::from_secs(30), async move {
            pool.shutdown().await.map_err(|e| e.to_string())
        });
    }
    lifecycle.step("sweeper", Duration::from_secs(5), async move {
        sweeper.await.map_err(|e| e.to_string())
    });
    {
        let broker = Arc::clone(&broker);
        lifecycle.step("broker", Duration::from_secs(10), async move {
            broker.close().await.map_err(|e| e.to_string())
        });
    }
    lifecycle.step("database", Duration::from_secs(10), async move {
        db.close().await;
        Ok::<(), String>(())
    });

    lifecycle.run().await?;
    info!("payment gateway stopped");
    Ok(())
}
