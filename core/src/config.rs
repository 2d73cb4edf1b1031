use crate::error::{DeskError, DeskResult};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Longest accepted processing delay for demo submissions: one day.
pub const MAX_PROCESSING_DELAY_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MonthWindow {
    /// Jan through Jun.
    Half,
    /// Jan through Dec.
    Full,
}

impl MonthWindow {
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            Self::Half => &MONTH_NAMES[..6],
            Self::Full => &MONTH_NAMES[..],
        }
    }
}

/// One closed score range `[min, max]` of the satisfaction histogram.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreBin {
    pub name: String,
    pub min: f64,
    pub max: f64,
}

impl ScoreBin {
    pub fn new(name: &str, min: f64, max: f64) -> Self {
        Self { name: name.into(), min, max }
    }

    pub fn contains(&self, score: f64) -> bool {
        score >= self.min && score <= self.max
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    pub seed: u64,
    pub recent_limit: usize,
    pub queue_limit: usize,
    pub category_top_n: usize,
    pub channel_top_n: usize,
    pub month_window: MonthWindow,
    /// Offset applied before reading a timestamp's calendar month.
    pub utc_offset_minutes: i32,
    /// Category colors, indexed by rank.
    pub palette: Vec<String>,
    pub fallback_color: String,
    pub satisfaction_bins: Vec<ScoreBin>,
    pub refresh_interval_secs: u64,
    /// How long a submitted demo complaint stays "processing".
    pub processing_delay_secs: i64,
    pub demo_augmentation: bool,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            recent_limit: 4,
            queue_limit: 8,
            category_top_n: 5,
            channel_top_n: 5,
            month_window: MonthWindow::Half,
            utc_offset_minutes: 0,
            palette: ["#D1D5DB", "#9CA3AF", "#6B7280", "#4B5563", "#374151"]
                .into_iter()
                .map(String::from)
                .collect(),
            fallback_color: "#6B7280".into(),
            satisfaction_bins: vec![
                ScoreBin::new("1", 1.0, 1.9),
                ScoreBin::new("2", 2.0, 2.9),
                ScoreBin::new("3", 3.0, 3.9),
                ScoreBin::new("4", 4.0, 4.5),
                ScoreBin::new("5", 4.6, 5.1),
            ],
            refresh_interval_secs: 30,
            processing_delay_secs: 3,
            demo_augmentation: false,
        }
    }
}

impl DeskConfig {
    /// Load from a JSON file. Missing keys take their defaults.
    /// In tests, use DeskConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: DeskConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with a fixed seed and no demo augmentation.
    pub fn default_test() -> Self {
        Self {
            seed: 0xC0FF_EE00,
            demo_augmentation: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> DeskResult<()> {
        if self.palette.is_empty() {
            return Err(invalid("palette must contain at least one color"));
        }
        if let Some(bin) = self.satisfaction_bins.iter().find(|b| b.min > b.max) {
            return Err(invalid(&format!(
                "satisfaction bin '{}' has min {} > max {}",
                bin.name, bin.min, bin.max
            )));
        }
        if self.utc_offset().is_none() {
            return Err(invalid(&format!(
                "utc_offset_minutes {} is outside ±18h",
                self.utc_offset_minutes
            )));
        }
        if self.refresh_interval_secs == 0 {
            return Err(invalid("refresh_interval_secs must be > 0"));
        }
        if !(0..=MAX_PROCESSING_DELAY_SECS).contains(&self.processing_delay_secs) {
            return Err(invalid(&format!(
                "processing_delay_secs {} must be within 0..={MAX_PROCESSING_DELAY_SECS}",
                self.processing_delay_secs
            )));
        }
        Ok(())
    }

    pub fn utc_offset(&self) -> Option<FixedOffset> {
        if self.utc_offset_minutes.abs() > 18 * 60 {
            return None;
        }
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
    }

    pub fn month_labels(&self) -> &'static [&'static str] {
        self.month_window.labels()
    }
}

fn invalid(reason: &str) -> DeskError {
    DeskError::InvalidConfig { reason: reason.into() }
}
