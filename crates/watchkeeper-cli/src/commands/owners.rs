use super::AppContext;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use watchkeeper_core::{SnapshotStore, StoreError};

/// Trim names and drop blanks and repeats, keeping the given order
fn normalize_owners(names: Vec<String>) -> Vec<String> {
    let mut owners: Vec<String> = Vec::new();
    for name in names {
        let name = name.trim();
        if !name.is_empty() && !owners.iter().any(|o| o == name) {
            owners.push(name.to_string());
        }
    }
    owners
}

pub async fn run_owners(id: String, names: Vec<String>, clear: bool, output: &Output) -> Result<()> {
    let ctx = AppContext::load()?;
    let store = ctx.open_store()?;

    if !clear && names.is_empty() {
        let entry = store
            .load_entries()
            .map_err(|e| eyre!("Failed to read snapshot: {}", e))?
            .into_iter()
            .find(|e| e.id == id)
            .ok_or_else(|| eyre!("No watchlist entry with id '{}'", id))?;
        if output.is_json() {
            output.data(&entry.owners);
        } else if entry.owners.is_empty() {
            output.info(format!("'{}' has no owners", entry.title));
        } else {
            output.info(format!("'{}': {}", entry.title, entry.owners.join(", ")));
        }
        return Ok(());
    }

    let owners = if clear { Vec::new() } else { normalize_owners(names) };
    match store.set_owners(&id, owners) {
        Ok(updated) => {
            tracing::info!(id = %id, owners = ?updated.owners, "Owners updated");
            if output.is_json() {
                output.data(&updated);
            } else if updated.owners.is_empty() {
                output.success(format!("Cleared owners of '{}'", updated.title));
            } else {
                output.success(format!("'{}' now owned by {}", updated.title, updated.owners.join(", ")));
            }
            Ok(())
        }
        Err(StoreError::NotFound(id)) => Err(eyre!("No watchlist entry with id '{}'", id)),
        Err(e) => Err(eyre!("Failed to update owners: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_owners() {
        let owners = normalize_owners(vec![" Alice ".into(), "".into(), "Bob".into(), "Alice".into()]);
        assert_eq!(owners, vec!["Alice".to_string(), "Bob".to_string()]);
    }
}
