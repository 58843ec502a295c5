use super::AppContext;
use crate::output::Output;
use chrono::{TimeZone, Utc};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use watchkeeper_core::SnapshotStore;
use watchkeeper_models::ReconciledEntry;

fn format_first_seen(timestamp: i64) -> String {
    if timestamp <= 0 {
        return "-".to_string();
    }
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn render_table(entries: &[ReconciledEntry]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Status", "Title", "Year", "Kind", "Rating", "Libraries", "Since", "Owners"]);

    for entry in entries {
        let status = if entry.available {
            Cell::new("available").fg(Color::Green)
        } else {
            Cell::new("missing").fg(Color::Red)
        };
        table.add_row(vec![
            Cell::new(entry.rank + 1),
            status,
            Cell::new(&entry.title),
            Cell::new(entry.year.map(|y| y.to_string()).unwrap_or_default()),
            Cell::new(entry.kind.label()),
            Cell::new(&entry.rating),
            Cell::new(entry.locations.join(", ")),
            Cell::new(format_first_seen(entry.first_seen_at)),
            Cell::new(entry.owners.join(", ")),
        ]);
    }
    table
}

pub async fn run_list(missing_only: bool, output: &Output) -> Result<()> {
    let ctx = AppContext::load()?;
    let store = ctx.open_store()?;
    let entries: Vec<ReconciledEntry> = store
        .load_entries()
        .map_err(|e| eyre!("Failed to read snapshot: {}", e))?
        .into_iter()
        .filter(|e| !missing_only || !e.available)
        .collect();

    if output.is_json() {
        output.data(&entries);
        return Ok(());
    }

    if entries.is_empty() {
        output.info("Snapshot is empty. Run 'watchkeeper sync' first.");
        return Ok(());
    }

    println!("{}", render_table(&entries));
    let available = entries.iter().filter(|e| e.available).count();
    output.info(format!("{} of {} available", available, entries.len()));
    Ok(())
}
