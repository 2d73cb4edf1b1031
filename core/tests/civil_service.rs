//! Demo civil service tests: seeding, submission lifecycle on a manual
//! clock, detail lookups, export and the dashboard-facing record view.

use chrono::{DateTime, Duration, Utc};
use civic_core::{
    clock::ManualClock,
    config::DeskConfig,
    error::DeskError,
    normalize::normalize_batch,
    record::Channel,
    rng::{RngBank, StreamSlot},
    service::{CivilService, ExportFormat, JobState, Mode, Priority, RecordState, SubmitOptions},
    source::ComplaintSource,
};
use std::sync::Arc;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-03-10T09:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn service_with_seed(seed: u64) -> (CivilService, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(t0()));
    let rng = RngBank::new(seed).for_stream(StreamSlot::Service);
    let service = CivilService::seeded(DeskConfig::default_test(), clock.clone(), rng);
    (service, clock)
}

fn service() -> (CivilService, Arc<ManualClock>) {
    service_with_seed(DeskConfig::default_test().seed)
}

// ── Seeding ──────────────────────────────────────────────────────────────────

#[test]
fn seeds_five_demo_complaints() {
    let (svc, _) = service();
    assert_eq!(svc.records().len(), 5);

    let states: Vec<RecordState> = svc.records().iter().map(|r| r.state).collect();
    assert_eq!(
        states,
        [
            RecordState::Resolved,
            RecordState::InProgress,
            RecordState::InReview,
            RecordState::Received,
            RecordState::Rejected,
        ]
    );
    assert!(svc.records().iter().all(|r| r.analysis.is_some()));
}

/// Only the resolved demo complaint carries a satisfaction score.
#[test]
fn only_resolved_records_are_rated() {
    let (svc, _) = service();
    for record in svc.records() {
        match record.state {
            RecordState::Resolved => {
                let score = record.satisfaction_score.expect("resolved record must be rated");
                assert!((3.2..=4.9).contains(&score), "score {score} out of range");
            }
            _ => assert!(record.satisfaction_score.is_none()),
        }
    }
}

#[test]
fn seeded_records_are_in_the_past() {
    let (svc, _) = service();
    for record in svc.records() {
        assert!(record.submitted_at < t0());
        assert!(record.submitted_at >= t0() - Duration::days(14));
    }
}

#[test]
fn runs_in_demo_mode() {
    let (svc, _) = service();
    assert!(!svc.backend_status().available);
    assert!(!svc.retry_connection());
    let info = svc.mode_info();
    assert_eq!(info.mode, Mode::Demo);
    assert!(!info.features.is_empty());
}

// ── Submission lifecycle ─────────────────────────────────────────────────────

#[test]
fn submission_starts_processing() {
    let (mut svc, _) = service();
    let submission = svc.submit_complaint("Pothole on Main Rd", SubmitOptions::default()).unwrap();

    let status = svc.analysis_status(&submission.job_id);
    assert_eq!(status.state, JobState::Processing);
    assert_eq!(status.progress, Some(0));

    let record = svc.records().last().unwrap();
    assert_eq!(record.id, submission.record_id);
    assert_eq!(record.state, RecordState::InProgress);
    assert_eq!(record.submitted_at, t0());
}

/// The job completes only once the processing delay has elapsed.
#[test]
fn job_completes_after_processing_delay() {
    let (mut svc, clock) = service();
    let submission = svc.submit_complaint("Pothole on Main Rd", SubmitOptions::default()).unwrap();

    clock.advance(Duration::seconds(2));
    assert_eq!(svc.process_due_jobs(), 0);
    assert_eq!(svc.analysis_status(&submission.job_id).state, JobState::Processing);

    clock.advance(Duration::seconds(1));
    assert_eq!(svc.process_due_jobs(), 1);
    let status = svc.analysis_status(&submission.job_id);
    assert_eq!(status.state, JobState::Completed);
    assert_eq!(status.progress, Some(100));

    // Already completed; nothing left to do.
    assert_eq!(svc.process_due_jobs(), 0);
}

#[test]
fn completed_submission_is_resolved_with_analysis() {
    let (mut svc, clock) = service();
    let submission = svc.submit_complaint("Pothole on Main Rd", SubmitOptions::default()).unwrap();
    clock.advance(Duration::seconds(3));
    svc.process_due_jobs();

    let record = svc.records().iter().find(|r| r.id == submission.record_id).unwrap();
    assert_eq!(record.state, RecordState::Resolved);
    let score = record.satisfaction_score.unwrap();
    assert!((3.2..=4.9).contains(&score));

    let analysis = svc.complaint_details(&submission.record_id).unwrap();
    assert_eq!(analysis.timeline.len(), 4);
    assert!((70..=95).contains(&analysis.overall_score));
    assert!((3..=5).contains(&analysis.tags.len()));
}

/// Caller-supplied routing hints win over the generated ones.
#[test]
fn submit_options_are_respected() {
    let (mut svc, clock) = service();
    let options = SubmitOptions {
        channel: Some(Channel::Visit),
        department_hint: Some("Parks & Greenery".into()),
        priority: Some(Priority::Low),
    };
    let submission = svc.submit_complaint("Fallen tree", options).unwrap();
    clock.advance(Duration::seconds(10));
    svc.process_due_jobs();

    let analysis = svc.complaint_details(&submission.record_id).unwrap();
    assert_eq!(analysis.routing.department, "Parks & Greenery");
    assert_eq!(analysis.routing.sla_hours, 72);
    assert_eq!(analysis.routing.priority, Priority::Low);
    assert_eq!(analysis.channel, Channel::Visit);
}

/// A delay that cannot be added to the clock is an error, not a panic,
/// and nothing is recorded for the failed submission.
#[test]
fn unrepresentable_delay_fails_submission() {
    let clock = Arc::new(ManualClock::new(t0()));
    let config = DeskConfig { processing_delay_secs: i64::MAX / 10, ..DeskConfig::default_test() };
    let rng = RngBank::new(config.seed).for_stream(StreamSlot::Service);
    let mut svc = CivilService::seeded(config, clock, rng);

    let result = svc.submit_complaint("Pothole on Main Rd", SubmitOptions::default());
    assert!(matches!(result, Err(DeskError::InvalidConfig { .. })));
    assert_eq!(svc.records().len(), 5);
}

#[test]
fn blank_title_gets_generated_name() {
    let (mut svc, _) = service();
    let submission = svc.submit_complaint("   ", SubmitOptions::default()).unwrap();
    let record = svc.records().last().unwrap();
    assert_eq!(record.title, format!("Complaint-{}", submission.record_id));
}

#[test]
fn unknown_job_reports_unknown() {
    let (svc, _) = service();
    let status = svc.analysis_status("no-such-job");
    assert_eq!(status.state, JobState::Unknown);
    assert_eq!(status.progress, None);
}

// ── Details ──────────────────────────────────────────────────────────────────

#[test]
fn details_of_unknown_record_is_not_found() {
    let (svc, _) = service();
    match svc.complaint_details("missing") {
        Err(DeskError::RecordNotFound { id }) => assert_eq!(id, "missing"),
        other => panic!("expected RecordNotFound, got {other:?}"),
    }
}

#[test]
fn details_while_processing_is_pending() {
    let (mut svc, _) = service();
    let submission = svc.submit_complaint("Broken bench", SubmitOptions::default()).unwrap();
    assert!(matches!(
        svc.complaint_details(&submission.record_id),
        Err(DeskError::AnalysisPending { .. })
    ));
}

// ── Dashboard view ───────────────────────────────────────────────────────────

#[test]
fn all_complaints_is_newest_first() {
    let (mut svc, _) = service();
    let first = svc.all_complaints();
    assert_eq!(first[0].title.as_deref(), Some("Construction noise and vibration"));

    let submission = svc.submit_complaint("Pothole on Main Rd", SubmitOptions::default()).unwrap();
    let after = svc.all_complaints();
    assert_eq!(after.len(), 6);
    assert_eq!(after[0].id.clone().into_string(), submission.record_id);
}

/// The raw view normalizes cleanly: unique ids, every createdAt parseable.
#[test]
fn all_complaints_normalize_cleanly() {
    let (svc, _) = service();
    let batch = normalize_batch(svc.all_complaints());
    assert_eq!(batch.records.len(), 5);
    assert!(batch.duplicates.is_empty());
    assert_eq!(batch.invalid_timestamps, 0);

    let resolved = batch
        .records
        .iter()
        .find(|r| r.title.as_deref() == Some("Illegal parking report (school front)"))
        .unwrap();
    assert!(resolved.resolved_at.is_some());
    assert!(resolved.first_response_at.is_some());
    assert!(resolved.category.is_some());
}

/// Fetching through the source contract advances due jobs first.
#[test]
fn fetch_processes_due_jobs() {
    let (mut svc, clock) = service();
    let submission = svc.submit_complaint("Pothole on Main Rd", SubmitOptions::default()).unwrap();
    clock.advance(Duration::seconds(5));

    let raws = svc.fetch().unwrap();
    let mine = raws
        .iter()
        .find(|r| r.id.clone().into_string() == submission.record_id)
        .unwrap();
    assert_eq!(mine.status.as_deref(), Some("resolved"));
    assert!(mine.satisfaction_score.is_some());
}

// ── Export ───────────────────────────────────────────────────────────────────

#[test]
fn csv_export_has_header_and_placeholder_rows() {
    let (svc, _) = service();
    let id = svc.records()[0].id.clone();
    let csv = svc.export_summary(&[id.as_str(), "missing"], ExportFormat::Csv).unwrap();

    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "title,status,score,department,priority,slaHours");
    assert!(lines[1].starts_with("Illegal parking report (school front),resolved,"));
    assert_eq!(lines[2], "N/A,N/A,0,N/A,N/A,0");
}

#[test]
fn json_export_is_an_array_of_rows() {
    let (svc, _) = service();
    let ids: Vec<&str> = svc.records().iter().map(|r| r.id.as_str()).collect();
    let json = svc.export_summary(&ids, ExportFormat::Json).unwrap();

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let rows = value.as_array().unwrap();
    assert_eq!(rows.len(), 5);
    assert!(rows[0].get("slaHours").is_some());
    assert_eq!(rows[4]["status"], "rejected");
}

// ── Determinism ──────────────────────────────────────────────────────────────

/// Same seed, same clock: identical records and ids.
#[test]
fn same_seed_same_service() {
    let (mut a, clock_a) = service_with_seed(77);
    let (mut b, clock_b) = service_with_seed(77);
    let sub_a = a.submit_complaint("x", SubmitOptions::default()).unwrap();
    let sub_b = b.submit_complaint("x", SubmitOptions::default()).unwrap();
    assert_eq!(sub_a, sub_b);

    clock_a.advance(Duration::seconds(3));
    clock_b.advance(Duration::seconds(3));
    a.process_due_jobs();
    b.process_due_jobs();
    assert_eq!(a.all_complaints(), b.all_complaints());
}

#[test]
fn different_seeds_differ() {
    let (a, _) = service_with_seed(1);
    let (b, _) = service_with_seed(2);
    assert_ne!(a.records()[0].id, b.records()[0].id);
}
