//! Boundary normalization: `RawComplaint` → `ComplaintRecord`.
//!
//! This is the single place malformed source data is handled. A bad
//! field never rejects a record; it becomes `None` so the aggregation
//! engine can leave it out of exactly the aggregate it would corrupt.

use crate::{
    record::{Channel, ComplaintRecord, ComplaintStatus, RawComplaint},
    types::{RecordId, Timestamp},
};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub records: Vec<ComplaintRecord>,
    /// Ids dropped because an earlier record in the batch had the same id.
    pub duplicates: Vec<RecordId>,
    /// Records kept whose `createdAt` was missing or unparseable.
    pub invalid_timestamps: usize,
}

pub fn normalize(raw: RawComplaint) -> ComplaintRecord {
    let (resolved_at, resolved_at_invalid) = parse_supplied(raw.resolved_at.as_deref());
    let (updated_at, updated_at_invalid) = parse_supplied(raw.updated_at.as_deref());
    ComplaintRecord {
        id: raw.id.into_string(),
        title: non_blank(raw.title),
        category: non_blank(raw.category),
        priority: non_blank(raw.priority),
        channel: parse_channel(raw.channel.as_deref()),
        status: parse_status(raw.status.as_deref()),
        created_at: raw.created_at.as_deref().and_then(parse_timestamp),
        first_response_at: raw.first_response_at.as_deref().and_then(parse_timestamp),
        resolved_at,
        updated_at,
        satisfaction_score: raw.satisfaction_score.filter(|s| s.is_finite()),
        resolved_at_invalid,
        updated_at_invalid,
    }
}

/// Normalize a whole batch, keeping the first record for each id.
pub fn normalize_batch(raws: Vec<RawComplaint>) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();
    let mut seen: HashSet<RecordId> = HashSet::with_capacity(raws.len());

    for raw in raws {
        let record = normalize(raw);
        if !seen.insert(record.id.clone()) {
            log::warn!("dropping duplicate complaint id {}", record.id);
            batch.duplicates.push(record.id);
            continue;
        }
        if record.created_at.is_none() {
            batch.invalid_timestamps += 1;
        }
        batch.records.push(record);
    }

    log::debug!(
        "normalized {} complaints ({} duplicates dropped, {} without a valid createdAt)",
        batch.records.len(),
        batch.duplicates.len(),
        batch.invalid_timestamps,
    );
    batch
}

pub fn parse_status(raw: Option<&str>) -> ComplaintStatus {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return ComplaintStatus::Other("unknown".into());
    };
    match canonical(raw).as_str() {
        "received" => ComplaintStatus::Received,
        "in_progress" => ComplaintStatus::InProgress,
        "pending" => ComplaintStatus::Pending,
        "resolved" => ComplaintStatus::Resolved,
        "rejected" => ComplaintStatus::Rejected,
        _ => ComplaintStatus::Other(raw.to_string()),
    }
}

pub fn parse_channel(raw: Option<&str>) -> Channel {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Channel::Other("unknown".into());
    };
    match canonical(raw).as_str() {
        "web" => Channel::Web,
        "mobile" => Channel::Mobile,
        "phone" => Channel::Phone,
        "visit" => Channel::Visit,
        _ => Channel::Other(raw.to_string()),
    }
}

/// RFC 3339, or a bare `YYYY-MM-DDTHH:MM:SS[.fff]` read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parsed value, and whether a non-blank value failed to parse.
fn parse_supplied(raw: Option<&str>) -> (Option<Timestamp>, bool) {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(text) => {
            let parsed = parse_timestamp(text);
            let invalid = parsed.is_none();
            (parsed, invalid)
        }
        None => (None, false),
    }
}

fn canonical(raw: &str) -> String {
    raw.to_ascii_lowercase().replace(['-', ' '], "_")
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
