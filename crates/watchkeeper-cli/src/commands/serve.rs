use super::AppContext;
use crate::api::{self, AppState};
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};
use watchkeeper_config::SchedulerConfig;
use watchkeeper_core::ReconciliationEngine;

/// Periodic trigger for reconciliation passes
pub struct Scheduler {
    scheduler: JobScheduler,
    engine: Arc<ReconciliationEngine>,
    config: SchedulerConfig,
}

impl Scheduler {
    pub async fn new(engine: Arc<ReconciliationEngine>, config: SchedulerConfig) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| eyre!("Failed to create scheduler: {:?}", e))?;

        Ok(Self {
            scheduler,
            engine,
            config,
        })
    }

    pub async fn start(&mut self) -> Result<()> {
        if self.config.run_on_startup {
            info!(operation = "scheduler_startup", "Running initial sync on startup");
            let engine = self.engine.clone();
            tokio::spawn(async move { run_pass(&engine, "startup").await });
        }

        let engine = self.engine.clone();
        let job = Job::new_repeated_async(Duration::from_secs(self.config.interval_secs), move |_uuid, _lock| {
            let engine = engine.clone();
            Box::pin(async move { run_pass(&engine, "scheduled").await })
        })
        .map_err(|e| eyre!("Failed to create sync job: {:?}", e))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| eyre!("Failed to register sync job: {:?}", e))?;
        self.scheduler
            .start()
            .await
            .map_err(|e| eyre!("Failed to start scheduler: {:?}", e))?;

        info!(
            operation = "scheduler_started",
            interval_secs = self.config.interval_secs,
            "Scheduler started"
        );
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| eyre!("Failed to stop scheduler: {:?}", e))
    }
}

async fn run_pass(engine: &ReconciliationEngine, trigger: &'static str) {
    info!(operation = "scheduled_sync_start", trigger, "Starting sync");
    match engine.sync().await {
        Ok(report) => info!(
            operation = "scheduled_sync_complete",
            trigger,
            entries = report.entries,
            newly_available = report.newly_available.len(),
            duration_ms = report.duration_ms,
            "Sync completed"
        ),
        Err(e) => error!(operation = "scheduled_sync_error", trigger, error = %e, "Sync failed"),
    }
}

pub async fn run_serve(no_startup_sync: bool, bind: Option<String>, output: &Output) -> Result<()> {
    let ctx = AppContext::load()?;
    ctx.paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create data directories: {}", e))?;

    let addr: SocketAddr = match bind {
        Some(b) => b.parse().map_err(|e| eyre!("Invalid bind address '{}': {}", b, e))?,
        None => ctx.config.bind_addr().map_err(|e| eyre!("{}", e))?,
    };

    let store = ctx.open_store()?;
    let engine = Arc::new(ctx.build_engine(store)?);

    let mut scheduler_config = ctx.config.scheduler.clone();
    if no_startup_sync {
        scheduler_config.run_on_startup = false;
    }
    let mut scheduler = Scheduler::new(engine.clone(), scheduler_config).await?;
    scheduler.start().await?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| eyre!("Failed to bind {}: {}", addr, e))?;
    output.success(format!("Serving on http://{} (server '{}')", addr, ctx.config.server.name));
    info!(operation = "serve_start", %addr, "HTTP API listening");

    axum::serve(listener, api::app(AppState { engine }))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await
        .map_err(|e| eyre!("HTTP server error: {}", e))?;

    info!(operation = "serve_stop", "Shutting down");
    scheduler.shutdown().await
}
