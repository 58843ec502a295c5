// Comparison of a freshly built snapshot against the previous one

use std::collections::HashMap;
use watchkeeper_models::ReconciledEntry;

#[derive(Debug, Clone, Default)]
struct PriorState {
    available: bool,
    owners: Vec<String>,
}

/// What the previous pass left behind, keyed by entry id
#[derive(Debug, Clone, Default)]
pub struct PriorSnapshot {
    entries: HashMap<String, PriorState>,
}

impl PriorSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: &[ReconciledEntry]) -> Self {
        let entries = entries
            .iter()
            .map(|e| {
                (
                    e.id.clone(),
                    PriorState {
                        available: e.available,
                        owners: e.owners.clone(),
                    },
                )
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Owners carried forward to the new pass; empty for unseen ids
    pub fn owners_for(&self, id: &str) -> Vec<String> {
        self.entries
            .get(id)
            .map(|s| s.owners.clone())
            .unwrap_or_default()
    }

    pub fn was_available(&self, id: &str) -> bool {
        self.entries.get(id).map(|s| s.available).unwrap_or(false)
    }
}

/// Entries that are available now but were unavailable or absent before
pub fn newly_available<'a>(prior: &PriorSnapshot, current: &'a [ReconciledEntry]) -> Vec<&'a ReconciledEntry> {
    current
        .iter()
        .filter(|e| e.available && !prior.was_available(&e.id))
        .collect()
}

#[cfg(test)]
mod tests;
