//! Complaint sources: where raw complaint lists come from.

use crate::{error::DeskResult, record::RawComplaint};
use std::path::PathBuf;

/// The contract every upstream supplier fulfills.
pub trait ComplaintSource {
    /// Unique stable name, used in logs.
    fn name(&self) -> &'static str;

    /// Return the current complaint list. An empty list is a valid answer.
    fn fetch(&mut self) -> DeskResult<Vec<RawComplaint>>;
}

/// Reads a JSON array of raw complaints from disk on every fetch.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ComplaintSource for JsonFileSource {
    fn name(&self) -> &'static str {
        "json_file"
    }

    fn fetch(&mut self) -> DeskResult<Vec<RawComplaint>> {
        let content = std::fs::read_to_string(&self.path)?;
        let complaints: Vec<RawComplaint> = serde_json::from_str(&content)?;
        log::debug!("read {} complaints from {}", complaints.len(), self.path.display());
        Ok(complaints)
    }
}

/// A fixed list, handed out again on every fetch.
pub struct StaticSource {
    complaints: Vec<RawComplaint>,
}

impl StaticSource {
    pub fn new(complaints: Vec<RawComplaint>) -> Self {
        Self { complaints }
    }
}

impl ComplaintSource for StaticSource {
    fn name(&self) -> &'static str {
        "static"
    }

    fn fetch(&mut self) -> DeskResult<Vec<RawComplaint>> {
        Ok(self.complaints.clone())
    }
}
