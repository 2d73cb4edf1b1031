//! Shared primitive types used across the whole crate.

use chrono::{DateTime, Utc};

/// A stable, unique identifier for a complaint within one batch.
pub type RecordId = String;

/// Identifier of a demo processing job.
pub type JobId = String;

/// All timestamps are normalized to UTC at the boundary.
pub type Timestamp = DateTime<Utc>;
