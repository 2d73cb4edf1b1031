//! Distribution tests: category, status, channel and satisfaction series.
//!
//! These cover ordering (most frequent first, ties by first appearance),
//! top-N truncation, palette coloring and the fixed satisfaction bins.

use civic_core::{
    aggregate::{
        bucket_by_satisfaction, category_distribution, channel_breakdown, distribution_by_key,
        status_breakdown,
    },
    config::DeskConfig,
    normalize::normalize,
    record::{ComplaintRecord, RawComplaint},
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn in_category(id: &str, category: Option<&str>) -> ComplaintRecord {
    normalize(RawComplaint {
        category: category.map(String::from),
        status: Some("received".into()),
        ..RawComplaint::with_id(id)
    })
}

fn with_status(id: &str, status: &str) -> ComplaintRecord {
    normalize(RawComplaint { status: Some(status.into()), ..RawComplaint::with_id(id) })
}

fn with_channel(id: &str, channel: &str) -> ComplaintRecord {
    normalize(RawComplaint { channel: Some(channel.into()), ..RawComplaint::with_id(id) })
}

fn scored(id: &str, score: f64) -> ComplaintRecord {
    normalize(RawComplaint { satisfaction_score: Some(score), ..RawComplaint::with_id(id) })
}

/// `counts` records per category, ids unique across the whole batch.
fn categories(counts: &[(&str, usize)]) -> Vec<ComplaintRecord> {
    counts
        .iter()
        .flat_map(|&(name, n)| (0..n).map(move |i| in_category(&format!("{name}-{i}"), Some(name))))
        .collect()
}

fn names<T, F: Fn(&T) -> &str>(entries: &[T], f: F) -> Vec<String> {
    entries.iter().map(|e| f(e).to_string()).collect()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn most_frequent_first() {
    let records = categories(&[("Roads", 2), ("Noise", 5), ("Parks", 3)]);
    let dist = distribution_by_key(&records, |r| r.category_label(), None);
    assert_eq!(names(&dist, |e| e.name.as_str()), ["Noise", "Parks", "Roads"]);
    assert_eq!(dist.iter().map(|e| e.value).collect::<Vec<_>>(), [5, 3, 2]);
}

/// Equal counts keep the order in which the keys first appeared.
#[test]
fn ties_keep_first_seen_order() {
    let records = vec![
        in_category("1", Some("B")),
        in_category("2", Some("A")),
        in_category("3", Some("C")),
        in_category("4", Some("A")),
        in_category("5", Some("B")),
    ];
    let dist = distribution_by_key(&records, |r| r.category_label(), None);
    assert_eq!(names(&dist, |e| e.name.as_str()), ["B", "A", "C"]);
}

/// Same input twice, same output twice.
#[test]
fn distribution_is_idempotent() {
    let records = categories(&[("A", 3), ("B", 3), ("C", 1), ("D", 3)]);
    let first = distribution_by_key(&records, |r| r.category_label(), Some(5));
    let second = distribution_by_key(&records, |r| r.category_label(), Some(5));
    assert_eq!(first, second);
}

#[test]
fn top_n_truncates_seven_categories_to_five() {
    let records = categories(&[
        ("G", 1),
        ("C", 5),
        ("A", 7),
        ("F", 2),
        ("B", 6),
        ("E", 3),
        ("D", 4),
    ]);
    let config = DeskConfig::default_test();
    let dist = category_distribution(&records, 5, &config.palette, &config.fallback_color);

    assert_eq!(dist.len(), 5);
    assert_eq!(names(&dist, |e| e.name.as_str()), ["A", "B", "C", "D", "E"]);
    let values: Vec<u64> = dist.iter().map(|e| e.value).collect();
    assert!(values.windows(2).all(|w| w[0] >= w[1]), "not descending: {values:?}");

    let mut unique = names(&dist, |e| e.name.as_str());
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 5, "category names must be unique");
}

#[test]
fn colors_follow_rank_then_fallback() {
    let records = categories(&[("A", 3), ("B", 2), ("C", 1)]);
    let palette = vec!["#111111".to_string(), "#222222".to_string()];
    let dist = category_distribution(&records, 5, &palette, "#999999");
    assert_eq!(names(&dist, |e| e.color.as_str()), ["#111111", "#222222", "#999999"]);
}

#[test]
fn default_palette_colors_five_slices() {
    let records = categories(&[("A", 5), ("B", 4), ("C", 3), ("D", 2), ("E", 1)]);
    let config = DeskConfig::default_test();
    let dist = category_distribution(&records, 5, &config.palette, &config.fallback_color);
    assert_eq!(
        names(&dist, |e| e.color.as_str()),
        ["#D1D5DB", "#9CA3AF", "#6B7280", "#4B5563", "#374151"]
    );
}

/// Records with no category are counted under "Other", together with any
/// record that literally says "Other".
#[test]
fn missing_category_counts_as_other() {
    let records = vec![
        in_category("1", None),
        in_category("2", Some("   ")),
        in_category("3", Some("Other")),
        in_category("4", Some("Roads")),
    ];
    let dist = distribution_by_key(&records, |r| r.category_label(), None);
    assert_eq!(dist[0].name, "Other");
    assert_eq!(dist[0].value, 3);
}

#[test]
fn empty_input_gives_empty_distributions() {
    let config = DeskConfig::default_test();
    assert!(category_distribution(&[], 5, &config.palette, &config.fallback_color).is_empty());
    assert!(status_breakdown(&[]).is_empty());
    assert!(channel_breakdown(&[], 5).is_empty());
}

/// Unrecognized statuses collapse into a single "Other" entry.
#[test]
fn status_breakdown_groups_unknown_statuses() {
    let records = vec![
        with_status("1", "received"),
        with_status("2", "in_review"),
        with_status("3", "escalated"),
        with_status("4", "In-Progress"),
        with_status("5", "in progress"),
        with_status("6", "resolved"),
    ];
    let dist = status_breakdown(&records);
    assert_eq!(names(&dist, |e| e.name.as_str()), ["Other", "In progress", "Received", "Resolved"]);
    assert_eq!(dist.iter().map(|e| e.value).sum::<u64>(), 6);
}

#[test]
fn channel_breakdown_labels_and_truncates() {
    let records = vec![
        with_channel("1", "web"),
        with_channel("2", "web"),
        with_channel("3", "Mobile"),
        with_channel("4", "offline"),
        with_channel("5", "phone"),
        with_channel("6", "visit"),
        with_channel("7", "kiosk"),
    ];
    let dist = channel_breakdown(&records, 3);
    assert_eq!(names(&dist, |e| e.name.as_str()), ["Web", "Other", "Mobile"]);
    assert_eq!(dist[1].value, 2);
}

/// All five bins are always present, in bin order, even with zero counts.
#[test]
fn satisfaction_bins_always_present() {
    let config = DeskConfig::default_test();
    let dist = bucket_by_satisfaction(&[], &config.satisfaction_bins);
    assert_eq!(names(&dist, |e| e.name.as_str()), ["1", "2", "3", "4", "5"]);
    assert!(dist.iter().all(|e| e.value == 0));
}

#[test]
fn satisfaction_scores_land_in_closed_bins() {
    let config = DeskConfig::default_test();
    let records = vec![
        scored("a", 1.0),
        scored("b", 1.9),
        scored("c", 2.5),
        scored("d", 3.0),
        scored("e", 4.5),
        scored("f", 4.6),
        scored("g", 5.0),
    ];
    let dist = bucket_by_satisfaction(&records, &config.satisfaction_bins);
    assert_eq!(dist.iter().map(|e| e.value).collect::<Vec<_>>(), [2, 1, 1, 1, 2]);
}

/// Scores between or outside the bins are not counted anywhere.
#[test]
fn satisfaction_gaps_and_out_of_range_are_dropped() {
    let config = DeskConfig::default_test();
    let records = vec![
        scored("a", 1.95),
        scored("b", 4.55),
        scored("c", 0.5),
        scored("d", 7.0),
        scored("e", 3.5),
    ];
    let dist = bucket_by_satisfaction(&records, &config.satisfaction_bins);
    assert_eq!(dist.iter().map(|e| e.value).sum::<u64>(), 1);
    assert_eq!(dist[2].value, 1);
}

/// Unrated records are not counted.
#[test]
fn unrated_records_are_not_binned() {
    let config = DeskConfig::default_test();
    let records = vec![with_status("a", "resolved"), with_status("b", "received")];
    let dist = bucket_by_satisfaction(&records, &config.satisfaction_bins);
    assert!(dist.iter().all(|e| e.value == 0));
}
