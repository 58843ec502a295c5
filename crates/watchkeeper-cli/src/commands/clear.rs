use super::prompts;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::fs;
use watchkeeper_config::PathManager;
use watchkeeper_core::{JsonSnapshotStore, SnapshotStore};

pub async fn run_clear(all: bool, snapshot: bool, credentials: bool, yes: bool, output: &Output) -> Result<()> {
    let paths = PathManager::default();

    if !(all || snapshot || credentials) {
        output.warn("No clear option specified. Use --snapshot, --credentials, or --all");
        output.println("\nExample: watchkeeper clear --snapshot");
        return Ok(());
    }

    if !yes && !output.is_json() && !prompts::prompt_yes_no("This cannot be undone. Continue?", false)? {
        output.info("Nothing cleared");
        return Ok(());
    }

    if all || snapshot {
        clear_snapshot(&paths, output)?;
    }
    if all || credentials {
        clear_credentials(&paths, output)?;
    }
    Ok(())
}

fn clear_snapshot(paths: &PathManager, output: &Output) -> Result<()> {
    let dir = paths.snapshot_dir();
    if !dir.exists() {
        output.info("No snapshot found to clear");
        return Ok(());
    }

    let store = JsonSnapshotStore::new(dir.clone()).map_err(|e| eyre!("Failed to open snapshot at {}: {}", dir.display(), e))?;
    store
        .clear()
        .map_err(|e| eyre!("Failed to clear snapshot at {}: {}", dir.display(), e))?;
    tracing::info!(path = %dir.display(), "Snapshot cleared");
    output.success(format!("Cleared snapshot: {}", dir.display()));
    Ok(())
}

fn clear_credentials(paths: &PathManager, output: &Output) -> Result<()> {
    let file = paths.credentials_file();
    if !file.exists() {
        output.info("No credentials file found to clear");
        return Ok(());
    }

    fs::remove_file(&file).map_err(|e| eyre!("Failed to remove credentials file at {}: {}", file.display(), e))?;
    output.success(format!("Cleared credentials: {}", file.display()));
    Ok(())
}
