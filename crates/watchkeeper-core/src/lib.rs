pub mod diff;
pub mod error;
pub mod matcher;
pub mod store;
pub mod sync;

pub use diff::{newly_available, PriorSnapshot};
pub use error::SyncError;
pub use matcher::{match_entry, MatchOutcome};
pub use store::{JsonSnapshotStore, MemorySnapshotStore, SnapshotStore, StoreError};
pub use sync::{reference_url, EngineOptions, ReconciliationEngine, SyncReport};
