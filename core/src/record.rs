//! Complaint record model: the raw wire shape and the typed form.
//!
//! `RawComplaint` is what a complaint source hands over: loosely typed,
//! every field optional except the id. `ComplaintRecord` is what the
//! aggregation engine reads. Conversion lives in `normalize.rs`.

use crate::types::{RecordId, Timestamp};
use serde::{Deserialize, Serialize, Serializer};

// ── Raw (source boundary) ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl RawId {
    pub fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }
}

impl From<&str> for RawId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawComplaint {
    pub id: RawId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_response_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub satisfaction_score: Option<f64>,
}

impl RawComplaint {
    /// A raw complaint carrying only an id. Fill the rest with struct update syntax.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: RawId::Text(id.into()),
            title: None,
            category: None,
            priority: None,
            channel: None,
            created_at: None,
            updated_at: None,
            first_response_at: None,
            resolved_at: None,
            status: None,
            satisfaction_score: None,
        }
    }
}

// ── Typed ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComplaintStatus {
    Received,
    InProgress,
    Pending,
    Resolved,
    Rejected,
    /// Anything unrecognized, kept verbatim (e.g. `in_review`, `unknown`).
    Other(String),
}

impl ComplaintStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Received => "received",
            Self::InProgress => "in_progress",
            Self::Pending => "pending",
            Self::Resolved => "resolved",
            Self::Rejected => "rejected",
            Self::Other(raw) => raw,
        }
    }

    /// Display label used for the status breakdown.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Received => "Received",
            Self::InProgress => "In progress",
            Self::Pending => "Pending",
            Self::Resolved => "Resolved",
            Self::Rejected => "Rejected",
            Self::Other(_) => "Other",
        }
    }

    /// Still requires attention.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Received | Self::InProgress | Self::Pending)
    }
}

impl Serialize for ComplaintStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Channel {
    Web,
    Mobile,
    Phone,
    Visit,
    Other(String),
}

impl Channel {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Web => "web",
            Self::Mobile => "mobile",
            Self::Phone => "phone",
            Self::Visit => "visit",
            Self::Other(raw) => raw,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Web => "Web",
            Self::Mobile => "Mobile",
            Self::Phone => "Phone",
            Self::Visit => "Visit",
            Self::Other(_) => "Other",
        }
    }
}

impl Serialize for Channel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Category label used when a record carries none.
pub const OTHER_CATEGORY: &str = "Other";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintRecord {
    pub id: RecordId,
    pub title: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub channel: Channel,
    pub status: ComplaintStatus,
    /// `None` when the source timestamp was missing or unparseable.
    pub created_at: Option<Timestamp>,
    pub first_response_at: Option<Timestamp>,
    pub resolved_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
    pub satisfaction_score: Option<f64>,
    /// `resolvedAt` was supplied but could not be parsed.
    #[serde(skip)]
    pub resolved_at_invalid: bool,
    /// `updatedAt` was supplied but could not be parsed.
    #[serde(skip)]
    pub updated_at_invalid: bool,
}

impl ComplaintRecord {
    /// Category with the "Other" sentinel applied.
    pub fn category_label(&self) -> &str {
        self.category.as_deref().unwrap_or(OTHER_CATEGORY)
    }

    /// Title, else category, else `Complaint #<id>`.
    pub fn display_label(&self) -> String {
        self.title
            .clone()
            .or_else(|| self.category.clone())
            .unwrap_or_else(|| format!("Complaint #{}", self.id))
    }

    /// When the record was completed, for resolved-per-month counting.
    ///
    /// Falls back from `resolved_at` to `updated_at` to `created_at`, but
    /// only past fields that were missing. A field that was supplied and
    /// unreadable ends the chain with `None`.
    pub fn completion_time(&self) -> Option<Timestamp> {
        if self.resolved_at.is_some() || self.resolved_at_invalid {
            return self.resolved_at;
        }
        if self.updated_at.is_some() || self.updated_at_invalid {
            return self.updated_at;
        }
        self.created_at
    }
}
