use super::AppContext;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use watchkeeper_core::{MemorySnapshotStore, SnapshotStore};

pub async fn run_sync(dry_run: bool, output: &Output) -> Result<()> {
    tracing::debug!("Sync command started");
    let ctx = AppContext::load()?;
    let disk = ctx.open_store()?;

    let store: Arc<dyn SnapshotStore> = if dry_run {
        // Seeded from disk; nothing is written back
        let entries = disk.load_entries().unwrap_or_default();
        let status = disk.load_status().unwrap_or_default();
        Arc::new(MemorySnapshotStore::seeded(entries, status))
    } else {
        disk
    };

    let mut engine = ctx.build_engine(store.clone())?;
    if dry_run {
        engine = engine.with_notifier(None);
    }

    let spinner = if output.is_json() {
        ProgressBar::hidden()
    } else {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .map_err(|e| eyre!("Invalid progress template: {}", e))?,
        );
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    };
    spinner.set_message(format!("Reconciling watchlist against '{}'...", engine.server_name()));

    let result = engine.sync().await;
    spinner.finish_and_clear();

    let report = result.map_err(|e| {
        output.error(format!("Sync failed: {}", e));
        eyre!("Sync failed: {}", e)
    })?;

    output.data(&report);
    output.success(format!(
        "{} entries, {} available, {} newly available ({} libraries scanned, {} ms)",
        report.entries, report.available, report.newly_available.len(), report.libraries_scanned, report.duration_ms
    ));
    if report.libraries_failed > 0 {
        output.warn(format!("{} libraries could not be read", report.libraries_failed));
    }
    if !report.newly_available.is_empty() {
        let entries = store.load_entries().unwrap_or_default();
        for entry in entries.iter().filter(|e| report.newly_available.contains(&e.id)) {
            output.info(format!("  new: {} ({})", entry.title, entry.locations.join(", ")));
        }
    }
    if dry_run {
        output.info("Dry run: snapshot on disk left unchanged");
    }

    Ok(())
}
