//! Demo civil-complaint service: fabricates complaints and simulates
//! their processing.
//!
//! This service:
//!   1. Seeds five demo complaints with full analyses
//!   2. Accepts new submissions and parks them as processing jobs
//!   3. Completes jobs whose due time has passed on the injected clock
//!   4. Flattens its records into `RawComplaint`s for the dashboard
//!   5. Exports CSV/JSON summaries of selected complaints
//!
//! All time comes from the `Clock`, all randomness from one `DeskRng`
//! stream, so two services with the same seed and clock agree exactly.

use crate::{
    clock::Clock,
    config::DeskConfig,
    error::{DeskError, DeskResult},
    record::{Channel, RawComplaint},
    rng::DeskRng,
    source::ComplaintSource,
    types::{JobId, RecordId, Timestamp},
};
use chrono::Duration;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const DEMO_BACKEND_URL: &str = "http://localhost:5000/civil-api";

const DEMO_FEATURES: [&str; 6] = [
    "Complaint intake and classification demo data",
    "Department routing and SLA simulation",
    "Tag and keyword statistics",
    "Processing-stage timelines",
    "Chart visualization",
    "Upload simulation",
];

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    Received,
    InReview,
    InProgress,
    Resolved,
    Rejected,
}

impl RecordState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::InReview => "in_review",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineAction {
    Received,
    Reviewing,
    Processing,
    Completed,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub at: Timestamp,
    pub action: TimelineAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reporter {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Excellent,
    Good,
    Average,
    Poor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionScore {
    pub name: String,
    pub score: i64,
    pub grade: Grade,
    pub found: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    pub name: &'static str,
    pub confidence: f64,
    pub category: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Routing {
    pub department: String,
    pub handler: Option<String>,
    pub priority: Priority,
    pub sla_hours: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CivilAnalysis {
    pub overall_score: i64,
    pub reporter: Reporter,
    pub sections: Vec<SectionScore>,
    pub tags: Vec<Tag>,
    pub routing: Routing,
    pub timeline: Vec<TimelineEntry>,
    pub location: String,
    pub channel: Channel,
    pub attachments: u32,
    pub analysis_date: Timestamp,
    pub text_length: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CivilRecord {
    pub id: RecordId,
    pub title: String,
    pub submitted_at: Timestamp,
    pub state: RecordState,
    pub analysis: Option<CivilAnalysis>,
    /// Assigned once, when the record reaches `Resolved`.
    pub satisfaction_score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmitOptions {
    pub channel: Option<Channel>,
    pub department_hint: Option<String>,
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub job_id: JobId,
    pub record_id: RecordId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Processing,
    Completed,
    Failed,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JobStatus {
    pub state: JobState,
    pub progress: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendStatus {
    pub available: bool,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Backend,
    Demo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeInfo {
    pub mode: Mode,
    pub features: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportRow {
    title: String,
    status: String,
    score: i64,
    department: String,
    priority: String,
    sla_hours: u32,
}

#[derive(Debug, Clone)]
struct ProcessingJob {
    record_id: RecordId,
    state: JobState,
    progress: u8,
    due_at: Timestamp,
    options: SubmitOptions,
}

// ── Service ──────────────────────────────────────────────────────────────────

pub struct CivilService {
    config: DeskConfig,
    clock: Arc<dyn Clock>,
    rng: DeskRng,
    /// Oldest first.
    records: Vec<CivilRecord>,
    jobs: BTreeMap<JobId, ProcessingJob>,
}

impl CivilService {
    pub fn new(config: DeskConfig, clock: Arc<dyn Clock>, rng: DeskRng) -> Self {
        Self {
            config,
            clock,
            rng,
            records: Vec::new(),
            jobs: BTreeMap::new(),
        }
    }

    /// Build and seed in one step.
    pub fn seeded(config: DeskConfig, clock: Arc<dyn Clock>, rng: DeskRng) -> Self {
        let mut service = Self::new(config, clock, rng);
        service.seed_mock();
        service
    }

    /// Replace the record list with the five demo complaints.
    pub fn seed_mock(&mut self) {
        let seeds = [
            ("Illegal parking report (school front)", RecordState::Resolved),
            ("Streetlight outage inquiry", RecordState::InProgress),
            ("Road surface damage risk", RecordState::InReview),
            ("Sewer odor complaint", RecordState::Received),
            ("Construction noise and vibration", RecordState::Rejected),
        ];
        let records: Vec<CivilRecord> = seeds
            .iter()
            .map(|(title, state)| self.make_demo_record(title, *state))
            .collect();
        self.records = records;
        self.jobs.clear();
        log::info!("civil service seeded with {} demo complaints", self.records.len());
    }

    pub fn records(&self) -> &[CivilRecord] {
        &self.records
    }

    pub fn backend_status(&self) -> BackendStatus {
        BackendStatus { available: false, url: DEMO_BACKEND_URL.into() }
    }

    pub fn mode_info(&self) -> ModeInfo {
        ModeInfo { mode: Mode::Demo, features: DEMO_FEATURES.to_vec() }
    }

    /// There is no backend to reach; always stays in demo mode.
    pub fn retry_connection(&self) -> bool {
        log::info!("backend connection attempt to {DEMO_BACKEND_URL}: not available (demo)");
        false
    }

    /// Register a new complaint. It stays in progress until
    /// `processing_delay_secs` have passed and `process_due_jobs` runs.
    ///
    /// Fails with `InvalidConfig`, before recording anything, when the
    /// delay cannot be added to the current time.
    pub fn submit_complaint(&mut self, title: &str, options: SubmitOptions) -> DeskResult<Submission> {
        let now = self.clock.now();
        let delay = self.config.processing_delay_secs;
        let due_at = Duration::try_seconds(delay)
            .and_then(|d| now.checked_add_signed(d))
            .ok_or_else(|| DeskError::InvalidConfig {
                reason: format!("processing_delay_secs {delay} overflows the submission due time"),
            })?;

        let record_id = self.rng.short_id();
        let job_id = self.rng.short_id();

        let title = match title.trim() {
            "" => format!("Complaint-{record_id}"),
            t => t.to_string(),
        };

        self.records.push(CivilRecord {
            id: record_id.clone(),
            title,
            submitted_at: now,
            state: RecordState::InProgress,
            analysis: None,
            satisfaction_score: None,
        });

        self.jobs.insert(
            job_id.clone(),
            ProcessingJob {
                record_id: record_id.clone(),
                state: JobState::Processing,
                progress: 0,
                due_at,
                options,
            },
        );

        log::debug!("submitted complaint {record_id} as job {job_id}, due {due_at}");
        Ok(Submission { job_id, record_id })
    }

    /// Complete every processing job whose due time has passed.
    /// Returns how many jobs finished.
    pub fn process_due_jobs(&mut self) -> usize {
        let now = self.clock.now();

        let mut due: Vec<(Timestamp, JobId)> = self
            .jobs
            .iter()
            .filter(|(_, job)| job.state == JobState::Processing && job.due_at <= now)
            .map(|(id, job)| (job.due_at, id.clone()))
            .collect();
        due.sort();

        let mut completed = 0;
        for (_, job_id) in due {
            let Some(job) = self.jobs.get(&job_id).cloned() else {
                continue;
            };
            let finished = self.finish_processing(&job.record_id, &job.options, now);
            if let Some(job) = self.jobs.get_mut(&job_id) {
                if finished {
                    job.state = JobState::Completed;
                    job.progress = 100;
                    completed += 1;
                    log::info!("job {job_id}: complaint {} resolved", job.record_id);
                } else {
                    job.state = JobState::Failed;
                    log::warn!("job {job_id}: complaint {} vanished before processing", job.record_id);
                }
            }
        }
        completed
    }

    pub fn analysis_status(&self, job_id: &str) -> JobStatus {
        match self.jobs.get(job_id) {
            Some(job) => JobStatus { state: job.state, progress: Some(job.progress) },
            None => JobStatus { state: JobState::Unknown, progress: None },
        }
    }

    pub fn complaint_details(&self, record_id: &str) -> DeskResult<CivilAnalysis> {
        let record = self
            .records
            .iter()
            .find(|r| r.id == record_id)
            .ok_or_else(|| DeskError::RecordNotFound { id: record_id.into() })?;
        record
            .analysis
            .clone()
            .ok_or_else(|| DeskError::AnalysisPending { id: record_id.into() })
    }

    /// Dashboard view of every record, newest first.
    pub fn all_complaints(&self) -> Vec<RawComplaint> {
        self.records.iter().rev().map(to_raw).collect()
    }

    pub fn export_summary(&self, ids: &[&str], format: ExportFormat) -> DeskResult<String> {
        let rows: Vec<ExportRow> = ids
            .iter()
            .map(|id| {
                let record = self.records.iter().find(|r| r.id == *id);
                let analysis = record.and_then(|r| r.analysis.as_ref());
                ExportRow {
                    title: record.map(|r| r.title.clone()).unwrap_or_else(|| "N/A".into()),
                    status: record.map(|r| r.state.as_str().to_string()).unwrap_or_else(|| "N/A".into()),
                    score: analysis.map(|a| a.overall_score).unwrap_or(0),
                    department: analysis
                        .map(|a| a.routing.department.clone())
                        .unwrap_or_else(|| "N/A".into()),
                    priority: analysis
                        .map(|a| a.routing.priority.as_str().to_string())
                        .unwrap_or_else(|| "N/A".into()),
                    sla_hours: analysis.map(|a| a.routing.sla_hours).unwrap_or(0),
                }
            })
            .collect();

        match format {
            ExportFormat::Json => Ok(serde_json::to_string_pretty(&rows)?),
            ExportFormat::Csv => {
                let mut lines = vec!["title,status,score,department,priority,slaHours".to_string()];
                lines.extend(rows.iter().map(|r| {
                    format!(
                        "{},{},{},{},{},{}",
                        r.title, r.status, r.score, r.department, r.priority, r.sla_hours
                    )
                }));
                Ok(lines.join("\n"))
            }
        }
    }

    // ── Internal generation ──────────────────────────────────────────────────

    fn make_demo_record(&mut self, title: &str, state: RecordState) -> CivilRecord {
        let now = self.clock.now();
        let id = self.rng.short_id();
        let submitted_at = now - Duration::days(self.rng.int_inclusive(1, 14));

        let mut analysis = self.make_analysis(now, None);
        analysis.timeline = vec![
            TimelineEntry {
                at: now - Duration::hours(self.rng.int_inclusive(1, 5)),
                action: TimelineAction::Received,
                note: None,
            },
            TimelineEntry {
                at: now - Duration::hours(self.rng.int_inclusive(1, 4)),
                action: TimelineAction::Reviewing,
                note: None,
            },
        ];
        match state {
            RecordState::Resolved => analysis.timeline.push(TimelineEntry {
                at: now - Duration::minutes(self.rng.int_inclusive(10, 60)),
                action: TimelineAction::Completed,
                note: Some("Repair work completed".into()),
            }),
            RecordState::Rejected => analysis.timeline.push(TimelineEntry {
                at: now - Duration::minutes(self.rng.int_inclusive(10, 60)),
                action: TimelineAction::Rejected,
                note: Some("Duplicate complaint".into()),
            }),
            _ => {}
        }

        let satisfaction_score = match state {
            RecordState::Resolved => Some(self.satisfaction_roll()),
            _ => None,
        };

        CivilRecord {
            id,
            title: title.to_string(),
            submitted_at,
            state,
            analysis: Some(analysis),
            satisfaction_score,
        }
    }

    fn make_analysis(&mut self, now: Timestamp, options: Option<&SubmitOptions>) -> CivilAnalysis {
        let base_score = self.rng.int_inclusive(62, 94);
        let tags = self.pick_tags();
        let department = options
            .and_then(|o| o.department_hint.clone())
            .unwrap_or_else(|| route_by_tags(&tags).to_string());

        let sections = vec![
            section("Intake accuracy", base_score + self.rng.int_inclusive(-5, 5), Grade::Good),
            section("Classification fit", base_score + self.rng.int_inclusive(-5, 5), Grade::Good),
            section("SLA compliance", base_score + self.rng.int_inclusive(-10, 3), Grade::Average),
            section("Duplicate check", self.rng.int_inclusive(70, 98), Grade::Good),
        ];

        let priority = options.and_then(|o| o.priority).unwrap_or_else(|| {
            *self.rng.pick(&[Priority::Normal, Priority::High, Priority::Urgent])
        });
        let channel = options.and_then(|o| o.channel.clone()).unwrap_or_else(|| {
            self.rng.pick(&[Channel::Web, Channel::Mobile, Channel::Phone]).clone()
        });

        CivilAnalysis {
            overall_score: base_score,
            reporter: Reporter {
                name: self
                    .rng
                    .pick(&["Kim Minsu", "Lee Seoyeon", "Park Jihu", "Choi Yujin", "Jung Haneul"])
                    .to_string(),
                phone: "010-1234-5678".into(),
                email: Some("reporter@example.com".into()),
                address: Some(
                    self.rng
                        .pick(&["Jangjeon-dong, Geumjeong-gu", "Daeyeon-dong, Nam-gu", "Yeonsan-dong, Yeonje-gu"])
                        .to_string(),
                ),
            },
            sections,
            tags,
            routing: Routing {
                sla_hours: sla_by_department(&department),
                handler: Some(self.rng.pick(&["Hong Gildong", "Kim Officer", "Lee Manager"]).to_string()),
                department,
                priority,
            },
            timeline: Vec::new(),
            location: self
                .rng
                .pick(&["Near district office", "Jangjeon station exit 3", "Oncheoncheon trail"])
                .to_string(),
            channel,
            attachments: self.rng.int_inclusive(0, 3) as u32,
            analysis_date: now - Duration::hours(self.rng.int_inclusive(0, 2)),
            text_length: self.rng.int_inclusive(400, 1400) as u32,
        }
    }

    fn finish_processing(&mut self, record_id: &str, options: &SubmitOptions, now: Timestamp) -> bool {
        let Some(idx) = self.records.iter().position(|r| r.id == record_id) else {
            return false;
        };

        let mut analysis = self.make_analysis(now, Some(options));
        analysis.overall_score = self.rng.int_inclusive(70, 95);
        if options.priority.is_none() {
            analysis.routing.priority = *self.rng.pick(&[Priority::Normal, Priority::High]);
        }
        analysis.timeline = vec![
            TimelineEntry { at: now - Duration::minutes(120), action: TimelineAction::Received, note: None },
            TimelineEntry { at: now - Duration::minutes(90), action: TimelineAction::Reviewing, note: None },
            TimelineEntry { at: now - Duration::minutes(45), action: TimelineAction::Processing, note: None },
            TimelineEntry {
                at: now,
                action: TimelineAction::Completed,
                note: Some("Temporary repair after site visit".into()),
            },
        ];
        analysis.analysis_date = now;
        let satisfaction = self.satisfaction_roll();

        let record = &mut self.records[idx];
        record.state = RecordState::Resolved;
        record.analysis = Some(analysis);
        record.satisfaction_score = Some(satisfaction);
        true
    }

    /// 3 to 5 distinct tags from the pool.
    fn pick_tags(&mut self) -> Vec<Tag> {
        let mut pool = tag_pool();
        self.rng.shuffle(&mut pool);
        let n = self.rng.int_inclusive(3, 5) as usize;
        pool.truncate(n);
        pool
    }

    /// 3.2 to 4.9, one decimal.
    fn satisfaction_roll(&mut self) -> f64 {
        ((3.2 + self.rng.next_f64() * 1.7) * 10.0).round() / 10.0
    }
}

impl ComplaintSource for CivilService {
    fn name(&self) -> &'static str {
        "civil_service"
    }

    fn fetch(&mut self) -> DeskResult<Vec<RawComplaint>> {
        self.process_due_jobs();
        Ok(self.all_complaints())
    }
}

// ── Mapping helpers ──────────────────────────────────────────────────────────

fn section(name: &str, score: i64, grade: Grade) -> SectionScore {
    SectionScore { name: name.into(), score, grade, found: true }
}

fn tag_pool() -> Vec<Tag> {
    vec![
        Tag { name: "road_damage", confidence: 0.90, category: "traffic_roads" },
        Tag { name: "illegal_parking", confidence: 0.88, category: "traffic_roads" },
        Tag { name: "streetlight_outage", confidence: 0.86, category: "safety" },
        Tag { name: "noise", confidence: 0.80, category: "environment" },
        Tag { name: "odor", confidence: 0.78, category: "environment" },
        Tag { name: "illegal_dumping", confidence: 0.83, category: "sanitation" },
        Tag { name: "sidewalk_damage", confidence: 0.85, category: "traffic_roads" },
    ]
}

fn route_by_tags(tags: &[Tag]) -> &'static str {
    let has = |category: &str| tags.iter().any(|t| t.category == category);
    if has("traffic_roads") {
        "Road Management"
    } else if has("environment") || has("sanitation") {
        "Environment Management"
    } else if has("safety") {
        "Safety Division"
    } else {
        "Civil Affairs Team"
    }
}

fn sla_by_department(department: &str) -> u32 {
    match department {
        "Road Management" => 48,
        "Environment Management" => 36,
        "Safety Division" => 24,
        _ => 72,
    }
}

/// Dashboard category from the most confident tag.
fn category_from_tags(tags: &[Tag]) -> Option<String> {
    // Ties keep the earlier tag.
    let top = tags.iter().fold(None::<&Tag>, |best, t| match best {
        Some(b) if b.confidence >= t.confidence => Some(b),
        _ => Some(t),
    })?;
    let label = match top.name {
        "road_damage" | "illegal_parking" | "sidewalk_damage" => "Traffic & roads",
        "streetlight_outage" => "Safety & facilities",
        "noise" => "Environment & noise",
        "odor" => "Environment & odor",
        "illegal_dumping" => "Sanitation & environment",
        _ => top.category,
    };
    Some(label.to_string())
}

fn category_from_department(department: &str) -> String {
    match department {
        "Road Management" => "Traffic & roads",
        "Environment Management" => "Environment & hygiene",
        "Safety Division" => "Safety & facilities",
        "Civil Affairs Team" => "General",
        _ => "Other",
    }
    .to_string()
}

/// First reviewing/processing entry, and the last completion entry.
fn extract_times(timeline: &[TimelineEntry]) -> (Option<Timestamp>, Option<Timestamp>) {
    let first_response = timeline
        .iter()
        .find(|t| matches!(t.action, TimelineAction::Reviewing | TimelineAction::Processing))
        .map(|t| t.at);
    let resolved = timeline
        .iter()
        .rev()
        .find(|t| t.action == TimelineAction::Completed)
        .map(|t| t.at);
    (first_response, resolved)
}

fn to_raw(record: &CivilRecord) -> RawComplaint {
    let analysis = record.analysis.as_ref();
    let (first_response, resolved) = analysis
        .map(|a| extract_times(&a.timeline))
        .unwrap_or((None, None));

    let category = analysis
        .and_then(|a| category_from_tags(&a.tags))
        .or_else(|| analysis.map(|a| category_from_department(&a.routing.department)))
        .unwrap_or_else(|| "Other".into());

    RawComplaint {
        title: Some(record.title.clone()),
        category: Some(category),
        priority: analysis.map(|a| a.routing.priority.as_str().to_string()),
        channel: analysis.map(|a| a.channel.as_str().to_string()),
        created_at: Some(record.submitted_at.to_rfc3339()),
        updated_at: analysis.map(|a| a.analysis_date.to_rfc3339()),
        first_response_at: first_response.map(|t| t.to_rfc3339()),
        resolved_at: resolved.map(|t| t.to_rfc3339()),
        status: Some(record.state.as_str().to_string()),
        satisfaction_score: record.satisfaction_score,
        ..RawComplaint::with_id(record.id.clone())
    }
}
