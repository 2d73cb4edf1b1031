//! Civic Desk core: complaint records in, dashboard statistics out.
//!
//! Pipeline: `source::ComplaintSource::fetch` → `normalize::normalize_batch`
//! → `aggregate::compute_statistics` → optional `demo::augment_for_demo`.

pub mod aggregate;
pub mod clock;
pub mod config;
pub mod demo;
pub mod error;
pub mod inbox;
pub mod normalize;
pub mod record;
pub mod refresh;
pub mod rng;
pub mod service;
pub mod source;
pub mod types;
