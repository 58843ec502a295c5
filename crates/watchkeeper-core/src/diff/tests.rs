use super::*;
use watchkeeper_models::{MediaKind, RATING_UNKNOWN};

fn entry(id: &str, available: bool) -> ReconciledEntry {
    ReconciledEntry {
        id: id.to_string(),
        title: format!("Title {}", id),
        alternate_title: None,
        year: Some(2020),
        kind: MediaKind::Film,
        artwork_url: None,
        reference_url: String::new(),
        available,
        locations: Vec::new(),
        rating: RATING_UNKNOWN.to_string(),
        first_seen_at: 0,
        owners: Vec::new(),
        rank: 0,
    }
}

#[test]
fn test_transition_detected_once() {
    let prior = PriorSnapshot::from_entries(&[entry("a", false), entry("b", true)]);
    let current = vec![entry("a", true), entry("b", true)];

    let transitions = newly_available(&prior, &current);
    assert_eq!(transitions.len(), 1);
    assert_eq!(transitions[0].id, "a");
}

#[test]
fn test_absent_entry_counts_as_unavailable() {
    let prior = PriorSnapshot::from_entries(&[entry("a", true)]);
    let current = vec![entry("a", true), entry("new", true)];

    let ids: Vec<&str> = newly_available(&prior, &current).iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["new"]);
}

#[test]
fn test_no_transitions_when_losing_availability() {
    let prior = PriorSnapshot::from_entries(&[entry("a", true)]);
    let current = vec![entry("a", false)];
    assert!(newly_available(&prior, &current).is_empty());
}

#[test]
fn test_empty_prior_makes_every_available_entry_new() {
    let current = vec![entry("a", true), entry("b", false), entry("c", true)];
    let transitions = newly_available(&PriorSnapshot::empty(), &current);
    assert_eq!(transitions.len(), 2);
}

#[test]
fn test_owners_carried_by_id() {
    let mut annotated = entry("a", false);
    annotated.owners = vec!["Alice".to_string()];
    let prior = PriorSnapshot::from_entries(&[annotated, entry("b", false)]);

    assert_eq!(prior.len(), 2);
    assert_eq!(prior.owners_for("a"), vec!["Alice".to_string()]);
    assert!(prior.owners_for("b").is_empty());
    assert!(prior.owners_for("missing").is_empty());
}
