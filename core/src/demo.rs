//! Demo augmentation: fills empty chart series so a fresh demo looks alive.
//!
//! RULE: This runs only AFTER `compute_statistics`, on its output.
//! It never touches records and never feeds back into aggregation.
//! Every fabricated value is flagged so "no data" stays distinguishable
//! from "made-up data".

use crate::{
    aggregate::{CategorySlice, DerivedStatistics},
    config::DeskConfig,
    rng::DeskRng,
};
use serde::Serialize;
use std::ops::Range;

const FABRICATED_COUNT: Range<u64> = 10..40;
const FABRICATED_RESOLVED: Range<u64> = 5..25;

const PLACEHOLDER_CATEGORIES: [(&str, u64); 5] = [
    ("Facilities & environment", 18),
    ("Traffic & roads", 14),
    ("Welfare", 12),
    ("Public safety", 9),
    ("Other", 7),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BucketFlags {
    pub count_fabricated: bool,
    pub resolved_fabricated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AugmentedStatistics {
    #[serde(flatten)]
    pub stats: DerivedStatistics,
    /// One entry per monthly bucket, same order.
    pub monthly_flags: Vec<BucketFlags>,
    pub category_placeholder: bool,
}

impl AugmentedStatistics {
    pub fn any_fabricated(&self) -> bool {
        self.category_placeholder
            || self
                .monthly_flags
                .iter()
                .any(|f| f.count_fabricated || f.resolved_fabricated)
    }
}

pub fn augment_for_demo(
    mut stats: DerivedStatistics,
    config: &DeskConfig,
    rng: &mut DeskRng,
) -> AugmentedStatistics {
    let mut monthly_flags = Vec::with_capacity(stats.monthly_buckets.len());
    for bucket in &mut stats.monthly_buckets {
        let mut flags = BucketFlags::default();
        if bucket.count == 0 {
            bucket.count = roll(rng, FABRICATED_COUNT);
            flags.count_fabricated = true;
        }
        if bucket.resolved == 0 {
            bucket.resolved = roll(rng, FABRICATED_RESOLVED);
            flags.resolved_fabricated = true;
        }
        monthly_flags.push(flags);
    }

    let category_placeholder = stats.category_distribution.is_empty();
    if category_placeholder {
        stats.category_distribution = PLACEHOLDER_CATEGORIES
            .iter()
            .enumerate()
            .map(|(rank, (name, value))| CategorySlice {
                name: name.to_string(),
                value: *value,
                color: config
                    .palette
                    .get(rank)
                    .cloned()
                    .unwrap_or_else(|| config.fallback_color.clone()),
            })
            .collect();
    }

    let augmented = AugmentedStatistics { stats, monthly_flags, category_placeholder };
    if augmented.any_fabricated() {
        log::debug!("demo augmentation filled empty series (placeholder categories: {category_placeholder})");
    }
    augmented
}

fn roll(rng: &mut DeskRng, range: Range<u64>) -> u64 {
    range.start + rng.next_u64_below(range.end - range.start)
}
