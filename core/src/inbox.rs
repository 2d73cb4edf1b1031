//! Complaints inbox: conversation threads routed to departments.
//!
//! Holds the thread list, filters it by department, status and free text,
//! and marks threads resolved. `generate_threads` builds a deterministic
//! set of dummy threads for demo mode.

use crate::{rng::DeskRng, types::Timestamp};
use chrono::Duration;
use serde::Serialize;

const TITLE_LIMIT: usize = 50;
const SUMMARY_LIMIT: usize = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InboxStatus {
    Received,
    InProgress,
    Resolved,
    OnHold,
}

impl InboxStatus {
    pub const ALL: [InboxStatus; 4] = [Self::Received, Self::InProgress, Self::Resolved, Self::OnHold];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Received => "Received",
            Self::InProgress => "In progress",
            Self::Resolved => "Resolved",
            Self::OnHold => "On hold",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Department {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub static DEPARTMENTS: [Department; 26] = [
    Department { id: "a", name: "Planning & Budget", description: "Strategic planning, performance management, budgeting" },
    Department { id: "b", name: "Audit & Legal", description: "Audit, integrity, litigation and legal advice" },
    Department { id: "c", name: "Administrative Support", description: "HR, organization, records and facilities" },
    Department { id: "d", name: "Civil Service Desk", description: "Certificates and complaint intake" },
    Department { id: "e", name: "Finance", description: "Accounting, contracts, property" },
    Department { id: "f", name: "Tax Division 1", description: "Local tax assessment, collection, arrears" },
    Department { id: "g", name: "Tax Division 2", description: "Acquisition and registration taxes" },
    Department { id: "h", name: "Culture & Tourism", description: "Culture and tourism policy, festivals" },
    Department { id: "i", name: "Education & Sports", description: "Education support, schools and sports facilities" },
    Department { id: "j", name: "Welfare Policy", description: "Welfare planning and delivery" },
    Department { id: "k", name: "Children & Youth", description: "Childcare, children and youth" },
    Department { id: "l", name: "Resident Welfare", description: "Welfare benefits and case management" },
    Department { id: "m", name: "Livelihood Security", description: "Living, medical, housing and education benefits" },
    Department { id: "n", name: "Senior & Disability Welfare", description: "Services for seniors and people with disabilities" },
    Department { id: "o", name: "Jobs & Economy", description: "Employment, startups, small business" },
    Department { id: "p", name: "Economy & Industry", description: "Local industry, business support, markets" },
    Department { id: "q", name: "Environmental Hygiene", description: "Living environment, food and public hygiene" },
    Department { id: "r", name: "Resource Recycling", description: "Waste, recycling and collection" },
    Department { id: "s", name: "Parks & Greenery", description: "Parks, green spaces, urban forests" },
    Department { id: "t", name: "Land Information", description: "Cadastre, land prices, surveying" },
    Department { id: "u", name: "Safety Management", description: "Disasters, civil defense, safety" },
    Department { id: "v", name: "Transport Administration", description: "Public transit, parking, enforcement" },
    Department { id: "w", name: "Urban Management", description: "Urban planning, renewal, public facilities" },
    Department { id: "x", name: "Construction", description: "Road and river works and maintenance" },
    Department { id: "y", name: "Building Permits", description: "Building permits, illegal structures" },
    Department { id: "z", name: "Public Health Administration", description: "Health center administration, infectious disease" },
];

pub fn department(id: &str) -> Option<&'static Department> {
    DEPARTMENTS.iter().find(|d| d.id == id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Citizen,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadMessage {
    pub speaker: Speaker,
    pub content: String,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxItem {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub department_id: String,
    pub status: InboxStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadDetail {
    pub history: Vec<ThreadMessage>,
    /// Primary department first.
    pub related_departments: Vec<&'static str>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboxFilter {
    pub department: Option<String>,
    pub status: Option<InboxStatus>,
    pub query: Option<String>,
}

impl InboxFilter {
    pub fn matches(&self, item: &InboxItem) -> bool {
        if let Some(dept) = self.department.as_deref().filter(|d| !d.is_empty()) {
            if item.department_id != dept {
                return false;
            }
        }
        if let Some(status) = self.status {
            if item.status != status {
                return false;
            }
        }
        if let Some(q) = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            return item.title.contains(q) || item.summary.contains(q) || item.id.contains(q);
        }
        true
    }
}

#[derive(Debug, Clone, Default)]
pub struct Inbox {
    items: Vec<InboxItem>,
    details: Vec<(String, ThreadDetail)>,
}

impl Inbox {
    pub fn new(items: Vec<InboxItem>) -> Self {
        Self { items, details: Vec::new() }
    }

    /// Dummy threads, newest activity first.
    pub fn generated(count: usize, rng: &mut DeskRng, now: Timestamp) -> Self {
        let (items, details): (Vec<_>, Vec<_>) =
            generate_threads(count, rng, now).into_iter().unzip();
        Self { items, details }
    }

    /// Put an item at the top of the list (e.g. a live thread).
    pub fn push_front(&mut self, item: InboxItem) {
        self.items.insert(0, item);
    }

    pub fn items(&self) -> &[InboxItem] {
        &self.items
    }

    pub fn filtered(&self, filter: &InboxFilter) -> Vec<&InboxItem> {
        self.items.iter().filter(|i| filter.matches(i)).collect()
    }

    pub fn get(&self, id: &str) -> Option<&InboxItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn detail(&self, id: &str) -> Option<&ThreadDetail> {
        self.details.iter().find(|(i, _)| i == id).map(|(_, d)| d)
    }

    /// Mark a thread resolved. Returns false for unknown ids.
    pub fn resolve(&mut self, id: &str, now: Timestamp) -> bool {
        match self.items.iter_mut().find(|i| i.id == id) {
            Some(item) => {
                item.status = InboxStatus::Resolved;
                item.updated_at = now;
                true
            }
            None => false,
        }
    }
}

const SUBJECTS: [&str; 13] = [
    "Road damage report",
    "Illegal parking report",
    "Delayed household waste pickup",
    "Construction noise complaint",
    "Playground safety inspection request",
    "Tax notice inquiry",
    "Arrears notice correction request",
    "Festival traffic control inquiry",
    "Sports facility booking unavailable",
    "Illegal signage near school",
    "Vaccination booking error",
    "Cadastral correction request",
    "Park tree pruning request",
];

const PLACES: [&str; 7] = [
    "Main Rd", "Riverside St", "Yeoksam-dong", "Gayang-dong", "Gwangjin-gu", "Cheonho-daero", "near City Hall",
];

/// Deterministic dummy threads with ids `DUMMY-1..=count`, newest update first.
pub fn generate_threads(
    count: usize,
    rng: &mut DeskRng,
    now: Timestamp,
) -> Vec<(InboxItem, (String, ThreadDetail))> {
    let mut threads: Vec<(InboxItem, (String, ThreadDetail))> =
        (1..=count).map(|n| make_thread(n, rng, now)).collect();
    threads.sort_by(|a, b| b.0.updated_at.cmp(&a.0.updated_at));
    threads
}

fn make_thread(n: usize, rng: &mut DeskRng, now: Timestamp) -> (InboxItem, (String, ThreadDetail)) {
    let dept = *rng.pick(&DEPARTMENTS);
    let status = *rng.pick(&InboxStatus::ALL);
    let created_at =
        now - Duration::days(rng.int_inclusive(1, 28)) - Duration::hours(rng.int_inclusive(0, 23));
    let updated_at = created_at + Duration::hours(rng.int_inclusive(1, 72));

    let title = format!(
        "{} - {} {}",
        rng.pick(&SUBJECTS),
        rng.pick(&PLACES),
        rng.int_inclusive(1, 99)
    );
    let summary = format!(
        "Explained the handling procedure and the responsible department ({}). Status: {}",
        dept.name,
        status.label()
    );

    let turns = rng.int_inclusive(3, 7) as usize;
    let mut history = Vec::with_capacity(turns);
    let mut at = created_at;
    for i in 0..turns {
        let citizen = i % 2 == 0;
        let content = if citizen {
            match i % 4 {
                0 => format!("Hello, I am writing about: {title}."),
                1 => format!("The location is near {}.", rng.pick(&PLACES)),
                2 => "I attached photos, please check them.".to_string(),
                _ => "It is not urgent, but I would appreciate a quick response.".to_string(),
            }
        } else {
            match i % 4 {
                0 => format!("Your complaint was received. {} is reviewing it.", dept.name),
                1 => "We will contact you after an on-site check if further action is needed.".to_string(),
                2 => "Expected handling time is 3 to 5 days.".to_string(),
                _ => "Please upload the original photos if you have them.".to_string(),
            }
        };
        at += Duration::minutes(rng.int_inclusive(10, 180));
        history.push(ThreadMessage {
            speaker: if citizen { Speaker::Citizen } else { Speaker::Assistant },
            content,
            timestamp: at,
        });
    }

    let related = rng.int_inclusive(1, 3) as usize;
    let mut others: Vec<&Department> = DEPARTMENTS.iter().filter(|d| d.id != dept.id).collect();
    rng.shuffle(&mut others);
    let related_departments: Vec<&'static str> = std::iter::once(dept.id)
        .chain(others.into_iter().map(|d| d.id))
        .take(related)
        .collect();

    let id = format!("DUMMY-{n}");
    let item = InboxItem {
        id: id.clone(),
        title: ellipsize(&title, TITLE_LIMIT),
        summary: ellipsize(&summary, SUMMARY_LIMIT),
        department_id: dept.id.to_string(),
        status,
        created_at,
        updated_at,
    };
    (item, (id, ThreadDetail { history, related_departments }))
}

/// Cut to `limit` characters, adding `…` when something was removed.
pub fn ellipsize(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(limit).collect();
    cut.push('…');
    cut
}
