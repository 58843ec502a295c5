use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use watchkeeper_models::{
    Library, LibraryItem, ReconciledEntry, SyncStatus, WatchlistEntry, RATING_UNKNOWN,
};
use watchkeeper_sources::{LibrarySource, Notifier, RatingLookup, WatchlistSource};

use crate::diff::{newly_available, PriorSnapshot};
use crate::error::SyncError;
use crate::matcher::match_entry;
use crate::store::SnapshotStore;

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Media server whose libraries are scanned
    pub server_name: String,
    /// Prefix of the outbound reference link
    pub reference_url_base: String,
}

/// Summary of one completed pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub entries: usize,
    pub available: usize,
    /// Ids that turned available in this pass
    pub newly_available: Vec<String>,
    pub libraries_scanned: usize,
    pub libraries_failed: usize,
    pub library_items: usize,
    pub duration_ms: u64,
}

/// Runs full fetch, match, enrich, diff, persist passes.
///
/// `sync` takes `&self` and may be called concurrently from a timer and an
/// on-demand trigger; the final replace-all write is last-writer-wins.
pub struct ReconciliationEngine {
    watchlist: Arc<dyn WatchlistSource>,
    libraries: Arc<dyn LibrarySource>,
    ratings: Option<Arc<dyn RatingLookup>>,
    notifier: Option<Arc<dyn Notifier>>,
    store: Arc<dyn SnapshotStore>,
    options: EngineOptions,
}

impl ReconciliationEngine {
    pub fn new(
        watchlist: Arc<dyn WatchlistSource>,
        libraries: Arc<dyn LibrarySource>,
        store: Arc<dyn SnapshotStore>,
        options: EngineOptions,
    ) -> Self {
        Self {
            watchlist,
            libraries,
            ratings: None,
            notifier: None,
            store,
            options,
        }
    }

    pub fn with_ratings(mut self, ratings: Option<Arc<dyn RatingLookup>>) -> Self {
        self.ratings = ratings;
        self
    }

    pub fn with_notifier(mut self, notifier: Option<Arc<dyn Notifier>>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn store(&self) -> &Arc<dyn SnapshotStore> {
        &self.store
    }

    pub fn server_name(&self) -> &str {
        &self.options.server_name
    }

    #[instrument(skip(self), fields(server = %self.options.server_name))]
    pub async fn sync(&self) -> Result<SyncReport, SyncError> {
        let start = Instant::now();
        info!(operation = "sync_start", source = self.watchlist.source_name(), "Starting reconciliation pass");

        let prior = self.load_prior();

        let fetched = match self.watchlist.fetch_watchlist().await {
            Ok(entries) => entries,
            Err(e) => {
                error!(operation = "sync_abort", error = %e, "Watchlist fetch failed, pass aborted");
                return Err(SyncError::UpstreamUnavailable(e.to_string()));
            }
        };
        let watchlist = dedupe_entries(fetched);

        let mut report = SyncReport::default();
        let pool = self.collect_library_items(&mut report).await;

        let mut entries = Vec::with_capacity(watchlist.len());
        for (rank, entry) in watchlist.iter().enumerate() {
            entries.push(self.reconcile(entry, rank, &pool, &prior).await);
        }

        let transitions: Vec<ReconciledEntry> = newly_available(&prior, &entries).into_iter().cloned().collect();

        report.entries = entries.len();
        report.available = entries.iter().filter(|e| e.available).count();
        report.newly_available = transitions.iter().map(|e| e.id.clone()).collect();

        if let Err(e) = self.store.replace_entries_keeping_owners(&entries) {
            error!(operation = "sync_persist", error = %e, "Failed to persist snapshot");
            self.record_status(&SyncStatus::error(&self.options.server_name, e.to_string()));
            return Err(SyncError::Persistence(e.to_string()));
        }
        self.record_status(&SyncStatus::success(
            &self.options.server_name,
            report.entries,
            report.available,
            transitions.len(),
        ));

        // Snapshot is durable from here on
        if let Some(notifier) = &self.notifier {
            for entry in &transitions {
                notifier.notify(entry).await;
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            operation = "sync_complete",
            entries = report.entries,
            available = report.available,
            newly_available = transitions.len(),
            libraries = report.libraries_scanned,
            duration_ms = report.duration_ms,
            "Reconciliation pass complete"
        );
        Ok(report)
    }

    fn load_prior(&self) -> PriorSnapshot {
        match self.store.load_entries() {
            Ok(entries) => {
                debug!("Loaded prior snapshot with {} entries", entries.len());
                PriorSnapshot::from_entries(&entries)
            }
            Err(e) => {
                warn!(error = %e, "Could not load prior snapshot, owners and transitions start fresh");
                PriorSnapshot::empty()
            }
        }
    }

    async fn collect_library_items(&self, report: &mut SyncReport) -> Vec<LibraryItem> {
        let libraries: Vec<Library> = match self.libraries.discover_libraries(&self.options.server_name).await {
            Ok(libraries) => libraries,
            Err(e) => {
                warn!(error = %e, "Library discovery failed, every entry resolves unavailable");
                Vec::new()
            }
        };

        let mut pool = Vec::new();
        for library in &libraries {
            match self.libraries.fetch_library_items(library).await {
                Ok(items) => {
                    report.libraries_scanned += 1;
                    pool.extend(items);
                }
                Err(e) => {
                    report.libraries_failed += 1;
                    warn!(library = %library.name, error = %e, "Skipping unreadable library");
                }
            }
        }
        report.library_items = pool.len();
        debug!("Library pool holds {} items from {} libraries", pool.len(), report.libraries_scanned);
        pool
    }

    async fn reconcile(
        &self,
        entry: &WatchlistEntry,
        rank: usize,
        pool: &[LibraryItem],
        prior: &PriorSnapshot,
    ) -> ReconciledEntry {
        let outcome = match_entry(entry, pool);
        let id = entry.join_key();

        let rating = match &self.ratings {
            Some(ratings) => {
                ratings
                    .lookup(&entry.title, entry.alternate_title.as_deref(), entry.known_year(), entry.kind)
                    .await
            }
            None => RATING_UNKNOWN.to_string(),
        };

        ReconciledEntry {
            owners: prior.owners_for(&id),
            id,
            title: entry.title.clone(),
            alternate_title: entry.alternate_title.clone(),
            year: entry.known_year(),
            kind: entry.kind,
            artwork_url: entry
                .artwork
                .as_deref()
                .and_then(|a| self.watchlist.resolve_artwork(a)),
            reference_url: reference_url(&self.options.reference_url_base, &entry.title),
            available: outcome.matched,
            locations: outcome.locations,
            rating,
            first_seen_at: outcome.first_seen_at,
            rank,
        }
    }

    fn record_status(&self, status: &SyncStatus) {
        if let Err(e) = self.store.save_status(status) {
            warn!(error = %e, "Failed to record sync status");
        }
    }
}

/// Collapse entries sharing a join key, keeping the first occurrence
pub fn dedupe_entries(entries: Vec<WatchlistEntry>) -> Vec<WatchlistEntry> {
    let mut seen = HashSet::new();
    let before = entries.len();
    let kept: Vec<WatchlistEntry> = entries
        .into_iter()
        .filter(|e| seen.insert(e.join_key()))
        .collect();
    if kept.len() < before {
        debug!("Dropped {} duplicate watchlist entries", before - kept.len());
    }
    kept
}

/// Search link for a title: each word percent-encoded, joined with '+'
pub fn reference_url(base: &str, title: &str) -> String {
    let query = title
        .split_whitespace()
        .map(|word| urlencoding::encode(word).into_owned())
        .collect::<Vec<_>>()
        .join("+");
    format!("{}{}", base, query)
}
