//! Aggregation engine: complaint list in, dashboard statistics out.
//!
//! Every function here is a pure read over a borrowed slice:
//!   1. KPIs (totals, active count, satisfaction and first-response averages)
//!   2. Monthly created/resolved buckets
//!   3. Keyed distributions (category, status, channel) with top-N truncation
//!   4. Satisfaction histogram
//!   5. Most recent complaints
//!   6. Active processing queue with a display-only progress figure
//!
//! Nothing is cached between calls. Malformed fields are skipped by the
//! aggregate they would corrupt and counted everywhere else.

use crate::{
    config::{DeskConfig, ScoreBin},
    record::{ComplaintRecord, ComplaintStatus},
    rng::DeskRng,
    types::RecordId,
};
use chrono::{Datelike, FixedOffset, Offset, Utc};
use serde::Serialize;
use std::collections::HashMap;

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub total_count: usize,
    pub active_count: usize,
    pub average_satisfaction: f64,
    pub average_first_response_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthBucket {
    pub month: String,
    pub count: u64,
    pub resolved: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributionEntry {
    pub name: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySlice {
    pub name: String,
    pub value: u64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    pub id: RecordId,
    pub label: String,
    pub progress_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedStatistics {
    #[serde(flatten)]
    pub kpis: Kpis,
    pub monthly_buckets: Vec<MonthBucket>,
    pub category_distribution: Vec<CategorySlice>,
    pub satisfaction_distribution: Vec<DistributionEntry>,
    pub status_breakdown: Vec<DistributionEntry>,
    pub channel_breakdown: Vec<DistributionEntry>,
    pub recent_items: Vec<ComplaintRecord>,
    pub processing_queue: Vec<QueueItem>,
}

// ── Progress bands ───────────────────────────────────────────────────────────

/// Half-open `[low, high)` progress range per status. Only the ordering
/// received < in_progress < pending/other is meaningful.
pub const RECEIVED_BAND: (f64, f64) = (15.0, 25.0);
pub const IN_PROGRESS_BAND: (f64, f64) = (35.0, 75.0);
pub const LATE_BAND: (f64, f64) = (75.0, 95.0);

pub fn progress_band(status: &ComplaintStatus) -> (f64, f64) {
    match status {
        ComplaintStatus::Received => RECEIVED_BAND,
        ComplaintStatus::InProgress => IN_PROGRESS_BAND,
        _ => LATE_BAND,
    }
}

// ── Operations ───────────────────────────────────────────────────────────────

pub fn compute_kpis(records: &[ComplaintRecord]) -> Kpis {
    let active_count = records.iter().filter(|r| r.status.is_active()).count();

    let scores: Vec<f64> = records.iter().filter_map(|r| r.satisfaction_score).collect();

    let response_hours: Vec<f64> = records
        .iter()
        .filter_map(|r| {
            let first = r.first_response_at?;
            let created = r.created_at?;
            let hours = (first - created).num_milliseconds() as f64 / 3_600_000.0;
            Some(hours.max(0.0))
        })
        .collect();

    Kpis {
        total_count: records.len(),
        active_count,
        average_satisfaction: rounded_mean(&scores),
        average_first_response_hours: rounded_mean(&response_hours),
    }
}

/// Buckets are seeded from `labels` and always all present. Month index is
/// the calendar month of the timestamp in `offset`; the year is ignored.
pub fn bucket_by_month(
    records: &[ComplaintRecord],
    labels: &[&str],
    offset: FixedOffset,
) -> Vec<MonthBucket> {
    let mut buckets: Vec<MonthBucket> = labels
        .iter()
        .map(|m| MonthBucket { month: m.to_string(), count: 0, resolved: 0 })
        .collect();

    for record in records {
        if let Some(created) = record.created_at {
            let idx = created.with_timezone(&offset).month0() as usize;
            if let Some(bucket) = buckets.get_mut(idx) {
                bucket.count += 1;
            }
        }
        if record.status == ComplaintStatus::Resolved {
            if let Some(done) = record.completion_time() {
                let idx = done.with_timezone(&offset).month0() as usize;
                if let Some(bucket) = buckets.get_mut(idx) {
                    bucket.resolved += 1;
                }
            }
        }
    }

    buckets
}

/// Count records per key, most frequent first. Ties keep first-seen order.
pub fn distribution_by_key<'a, F>(
    records: &'a [ComplaintRecord],
    key_fn: F,
    top_n: Option<usize>,
) -> Vec<DistributionEntry>
where
    F: Fn(&'a ComplaintRecord) -> &'a str,
{
    let mut counts: Vec<(&'a str, u64)> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();

    for record in records {
        let key = key_fn(record);
        match index.get(key) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(key, counts.len());
                counts.push((key, 1));
            }
        }
    }

    // sort_by is stable: equal counts stay in insertion order.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    if let Some(n) = top_n {
        counts.truncate(n);
    }

    counts
        .into_iter()
        .map(|(name, value)| DistributionEntry { name: name.to_string(), value })
        .collect()
}

pub fn category_distribution(
    records: &[ComplaintRecord],
    top_n: usize,
    palette: &[String],
    fallback_color: &str,
) -> Vec<CategorySlice> {
    distribution_by_key(records, |r| r.category_label(), Some(top_n))
        .into_iter()
        .enumerate()
        .map(|(rank, entry)| CategorySlice {
            color: palette
                .get(rank)
                .cloned()
                .unwrap_or_else(|| fallback_color.to_string()),
            name: entry.name,
            value: entry.value,
        })
        .collect()
}

pub fn status_breakdown(records: &[ComplaintRecord]) -> Vec<DistributionEntry> {
    distribution_by_key(records, |r| r.status.label(), None)
}

pub fn channel_breakdown(records: &[ComplaintRecord], top_n: usize) -> Vec<DistributionEntry> {
    distribution_by_key(records, |r| r.channel.label(), Some(top_n))
}

/// Each rated record lands in the first bin containing its score.
/// Scores outside every bin are dropped.
pub fn bucket_by_satisfaction(
    records: &[ComplaintRecord],
    bins: &[ScoreBin],
) -> Vec<DistributionEntry> {
    let mut counts = vec![0u64; bins.len()];
    for score in records.iter().filter_map(|r| r.satisfaction_score) {
        if let Some(i) = bins.iter().position(|b| b.contains(score)) {
            counts[i] += 1;
        }
    }
    bins.iter()
        .zip(counts)
        .map(|(bin, value)| DistributionEntry { name: bin.name.clone(), value })
        .collect()
}

/// Newest first by `created_at`; ties keep input order. Records without a
/// valid creation time are left out.
pub fn recent_records(records: &[ComplaintRecord], n: usize) -> Vec<&ComplaintRecord> {
    let mut dated: Vec<&ComplaintRecord> =
        records.iter().filter(|r| r.created_at.is_some()).collect();
    dated.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    dated.truncate(n);
    dated
}

/// First `n` active records in input order.
pub fn active_queue(records: &[ComplaintRecord], n: usize, rng: &mut DeskRng) -> Vec<QueueItem> {
    records
        .iter()
        .filter(|r| r.status.is_active())
        .take(n)
        .map(|r| {
            let (low, high) = progress_band(&r.status);
            QueueItem {
                id: r.id.clone(),
                label: r.display_label(),
                progress_percent: rng.uniform(low, high),
            }
        })
        .collect()
}

pub fn compute_statistics(
    records: &[ComplaintRecord],
    config: &DeskConfig,
    rng: &mut DeskRng,
) -> DerivedStatistics {
    let offset = config.utc_offset().unwrap_or_else(|| Utc.fix());

    let stats = DerivedStatistics {
        kpis: compute_kpis(records),
        monthly_buckets: bucket_by_month(records, config.month_labels(), offset),
        category_distribution: category_distribution(
            records,
            config.category_top_n,
            &config.palette,
            &config.fallback_color,
        ),
        satisfaction_distribution: bucket_by_satisfaction(records, &config.satisfaction_bins),
        status_breakdown: status_breakdown(records),
        channel_breakdown: channel_breakdown(records, config.channel_top_n),
        recent_items: recent_records(records, config.recent_limit)
            .into_iter()
            .cloned()
            .collect(),
        processing_queue: active_queue(records, config.queue_limit, rng),
    };

    log::debug!(
        "aggregated {} complaints: active={} satisfaction={:.1} first_response_h={:.1} categories={}",
        stats.kpis.total_count,
        stats.kpis.active_count,
        stats.kpis.average_satisfaction,
        stats.kpis.average_first_response_hours,
        stats.category_distribution.len(),
    );

    stats
}

/// Mean rounded to one decimal; 0 for an empty set. Non-finite inputs are skipped.
fn rounded_mean(values: &[f64]) -> f64 {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return 0.0;
    }
    let mean = finite.iter().sum::<f64>() / finite.len() as f64;
    (mean * 10.0).round() / 10.0
}
