// Identity matching between watchlist entries and library items

use watchkeeper_models::{LibraryItem, WatchlistEntry};

/// Maximum release-year skew accepted by the title fallback
pub const YEAR_TOLERANCE: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    pub matched: bool,
    /// Library names in order of first discovery, no duplicates
    pub locations: Vec<String>,
    /// Earliest non-zero ingestion timestamp among matched items, 0 if none
    pub first_seen_at: i64,
}

impl MatchOutcome {
    fn record(&mut self, item: &LibraryItem) {
        self.matched = true;
        if !self.locations.iter().any(|l| l == &item.library) {
            self.locations.push(item.library.clone());
        }
        if item.added_at > 0 && (self.first_seen_at == 0 || item.added_at < self.first_seen_at) {
            self.first_seen_at = item.added_at;
        }
    }
}

/// Decide whether `entry` is present among `items`.
///
/// A cross-reference hit is authoritative and ends the scan. Otherwise every
/// item matching on title and year adds its library to the locations.
pub fn match_entry(entry: &WatchlistEntry, items: &[LibraryItem]) -> MatchOutcome {
    let entry_keys = title_keys(&entry.title, entry.alternate_title.as_deref());
    let entry_year = entry.known_year();
    let mut outcome = MatchOutcome::default();

    for item in items {
        if cross_ref_matches(&entry.cross_refs, item.cross_ref.as_deref()) {
            outcome.record(item);
            break;
        }
        if title_year_matches(&entry_keys, entry_year, item) {
            outcome.record(item);
        }
    }

    outcome
}

/// Equal identifiers, or the item's identifier ends with the entry's short form
fn cross_ref_matches(entry_refs: &[String], item_ref: Option<&str>) -> bool {
    let Some(item_ref) = item_ref.map(str::trim).filter(|r| !r.is_empty()) else {
        return false;
    };
    entry_refs
        .iter()
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .any(|r| item_ref == r || item_ref.ends_with(r))
}

fn title_year_matches(entry_keys: &[String], entry_year: Option<u32>, item: &LibraryItem) -> bool {
    // Year-less titles never fallback-match
    let (Some(entry_year), Some(item_year)) = (entry_year, item.known_year()) else {
        return false;
    };
    if entry_year.abs_diff(item_year) > YEAR_TOLERANCE {
        return false;
    }
    let item_keys = title_keys(&item.title, item.alternate_title.as_deref());
    entry_keys.iter().any(|k| item_keys.contains(k))
}

/// Lower-cased, trimmed, non-empty titles
fn title_keys(title: &str, alternate: Option<&str>) -> Vec<String> {
    let mut keys = Vec::with_capacity(2);
    for candidate in std::iter::once(title).chain(alternate) {
        let key = candidate.trim().to_lowercase();
        if !key.is_empty() && !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchkeeper_models::MediaKind;

    fn dune() -> WatchlistEntry {
        WatchlistEntry::new("Dune", Some(2021), MediaKind::Film)
            .with_identifier("abc")
            .with_cross_ref("abc")
    }

    #[test]
    fn test_title_fallback_within_year_tolerance() {
        let items = vec![LibraryItem::new("dune", Some(2022), "Movies").with_cross_ref("other")];
        let outcome = match_entry(&dune(), &items);
        assert!(outcome.matched);
        assert_eq!(outcome.locations, vec!["Movies".to_string()]);
    }

    #[test]
    fn test_year_zero_disables_fallback() {
        let items = vec![LibraryItem::new("dune", Some(0), "Movies")];
        assert!(!match_entry(&dune(), &items).matched);

        let items = vec![LibraryItem::new("dune", None, "Movies")];
        assert!(!match_entry(&dune(), &items).matched);

        let yearless = WatchlistEntry::new("Dune", Some(0), MediaKind::Film);
        let items = vec![LibraryItem::new("Dune", Some(0), "Movies")];
        assert!(!match_entry(&yearless, &items).matched);
    }

    #[test]
    fn test_year_outside_tolerance() {
        let items = vec![LibraryItem::new("Dune", Some(1984), "Movies")];
        assert!(!match_entry(&dune(), &items).matched);

        let items = vec![LibraryItem::new("Dune", Some(2019), "Movies")];
        assert!(!match_entry(&dune(), &items).matched);
    }

    #[test]
    fn test_cross_ref_is_authoritative() {
        let entry = WatchlistEntry::new("Dune", Some(2021), MediaKind::Film)
            .with_cross_ref("plex://movie/5d776b59");
        let items = vec![LibraryItem::new("Duna", Some(1999), "Archive").with_cross_ref("plex://movie/5d776b59")];
        let outcome = match_entry(&entry, &items);
        assert!(outcome.matched);
        assert_eq!(outcome.locations, vec!["Archive".to_string()]);
    }

    #[test]
    fn test_cross_ref_suffix_match() {
        let entry = WatchlistEntry::new("Dune", None, MediaKind::Film).with_cross_ref("5d776b59");
        let items = vec![LibraryItem::new("Dune", None, "Movies").with_cross_ref("plex://movie/5d776b59")];
        assert!(match_entry(&entry, &items).matched);
    }

    #[test]
    fn test_empty_cross_refs_never_match() {
        let entry = WatchlistEntry::new("A", None, MediaKind::Film).with_cross_ref("");
        let items = vec![LibraryItem::new("B", None, "Movies").with_cross_ref("")];
        assert!(!match_entry(&entry, &items).matched);
    }

    #[test]
    fn test_cross_ref_stops_scan() {
        let items = vec![
            LibraryItem::new("Dune", Some(2021), "Movies"),
            LibraryItem::new("Something Else", Some(1990), "4K").with_cross_ref("plex://abc"),
            LibraryItem::new("Dune", Some(2021), "Kids"),
        ];
        let outcome = match_entry(&dune(), &items);
        assert_eq!(outcome.locations, vec!["Movies".to_string(), "4K".to_string()]);
    }

    #[test]
    fn test_alternate_title_combinations() {
        let entry = WatchlistEntry::new("Wrath of Man", Some(2021), MediaKind::Film)
            .with_alternate_title("Despierta la furia");

        let by_item_alt = vec![LibraryItem::new("Something", Some(2021), "A").with_alternate_title("WRATH OF MAN")];
        assert!(match_entry(&entry, &by_item_alt).matched);

        let by_entry_alt = vec![LibraryItem::new("despierta la furia", Some(2020), "B")];
        assert!(match_entry(&entry, &by_entry_alt).matched);

        let alt_to_alt = vec![LibraryItem::new("X", Some(2021), "C").with_alternate_title("Despierta La Furia")];
        assert!(match_entry(&entry, &alt_to_alt).matched);
    }

    #[test]
    fn test_locations_deduplicated_in_discovery_order() {
        let items = vec![
            LibraryItem::new("Dune", Some(2021), "4K").with_added_at(300),
            LibraryItem::new("Dune", Some(2021), "Movies").with_added_at(100),
            LibraryItem::new("Dune", Some(2020), "4K").with_added_at(200),
        ];
        let outcome = match_entry(&dune(), &items);
        assert_eq!(outcome.locations, vec!["4K".to_string(), "Movies".to_string()]);
        assert_eq!(outcome.first_seen_at, 100);
    }

    #[test]
    fn test_blank_title_cannot_title_match() {
        let entry = WatchlistEntry::new("  ", Some(2021), MediaKind::Film);
        let items = vec![LibraryItem::new("", Some(2021), "Movies")];
        assert!(!match_entry(&entry, &items).matched);
    }

    #[test]
    fn test_no_items() {
        let outcome = match_entry(&dune(), &[]);
        assert_eq!(outcome, MatchOutcome::default());
    }
}
