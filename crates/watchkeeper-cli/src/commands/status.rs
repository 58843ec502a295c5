use super::AppContext;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use owo_colors::OwoColorize;
use serde_json::json;
use watchkeeper_core::SnapshotStore;

pub async fn run_status(output: &Output) -> Result<()> {
    let ctx = AppContext::load()?;
    let store = ctx.open_store()?;
    let status = store
        .load_status()
        .map_err(|e| eyre!("Failed to read sync status: {}", e))?;

    let Some(status) = status else {
        if output.is_json() {
            output.data(&json!({ "state": "never_run" }));
        } else {
            output.info("No sync has run yet");
        }
        return Ok(());
    };

    if output.is_json() {
        output.data(&status);
        return Ok(());
    }

    let when = status.timestamp.format("%Y-%m-%d %H:%M:%S UTC");
    if status.is_success() {
        println!("{} {}", "Last sync:".bold(), "success".green());
        println!("  Server:           {}", status.server_name);
        println!("  Finished:         {}", when);
        println!("  Entries:          {}", status.entries);
        println!("  Available:        {}", status.available);
        println!("  Newly available:  {}", status.newly_available);
    } else {
        println!("{} {}", "Last sync:".bold(), "error".red());
        println!("  Server:           {}", status.server_name);
        println!("  Failed:           {}", when);
        println!("  Error:            {}", status.error.as_deref().unwrap_or("unknown"));
    }
    Ok(())
}
