use std::sync::Arc;

use anyhow::Context;
use qrcheckin::{
    checkin::CheckinService,
    codec::TicketCodec,
    config::Config,
    logger::init_logger,
    persist::registry::SqliteRegistry,
    runtime::handle::spawn_sqlite_ledger,
    server::build_app,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let config = Config::from_env()?;
    init_logger(&config.log_level);

    info!(addr = %config.http_addr, "check-in service starting");

    // No scans are accepted until the registration import has run.
    let registry = SqliteRegistry::open(&config.registration_db).with_context(|| {
        format!(
            "registration dataset {} not provisioned; import registrations first",
            config.registration_db.display()
        )
    })?;
    let registered = registry.count()?;
    info!(registered, path = %registry.path().display(), "registration dataset ready");

    let ledger = spawn_sqlite_ledger(&config.attendance_db, config.runtime_config())
        .await
        .context("open attendance ledger")?;

    let service = CheckinService::new(
        TicketCodec::with_prefix(config.ticket_prefix.clone()),
        Arc::new(registry),
        ledger,
    );
    let app = build_app(service.clone(), &config.cors_origins);

    let listener = tokio::net::TcpListener::bind(config.http_addr)
        .await
        .with_context(|| format!("bind {}", config.http_addr))?;
    info!(addr = %config.http_addr, "listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Err(e) = service.shutdown().await {
        error!(error = %e, "attendance ledger shutdown failed");
    }
    served.context("http server")?;
    info!("check-in service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
