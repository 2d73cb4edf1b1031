//! desk-runner: headless dashboard runner for Civic Desk.
//!
//! Usage:
//!   desk-runner --seed 12345 --refreshes 3 --interval-secs 30
//!   desk-runner --input complaints.json --months 12 --demo
//!   desk-runner --config desk.json --submit "Pothole on Main Rd"

use anyhow::Result;
use civic_core::{
    clock::SystemClock,
    config::{DeskConfig, MonthWindow},
    refresh::Dashboard,
    rng::{RngBank, StreamSlot},
    service::{CivilService, SubmitOptions},
    source::{ComplaintSource, JsonFileSource},
};
use std::env;
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut config = match find_arg(&args, "--config") {
        Some(path) => DeskConfig::load(path)?,
        None => DeskConfig::default(),
    };
    config.seed = parse_arg(&args, "--seed", config.seed);
    config.refresh_interval_secs = parse_arg(&args, "--interval-secs", config.refresh_interval_secs);
    config.month_window = match parse_arg(&args, "--months", 0u32) {
        12 => MonthWindow::Full,
        6 => MonthWindow::Half,
        _ => config.month_window,
    };
    if args.iter().any(|a| a == "--demo") {
        config.demo_augmentation = true;
    }
    config.validate()?;

    let refreshes = parse_arg(&args, "--refreshes", 1u64);
    let quiet = args.iter().any(|a| a == "--quiet");
    let input = find_arg(&args, "--input");

    if !quiet {
        eprintln!("Civic Desk — desk-runner");
        eprintln!("  seed:       {}", config.seed);
        eprintln!("  source:     {}", input.unwrap_or("demo service"));
        eprintln!("  refreshes:  {refreshes}");
        eprintln!("  interval:   {}s", config.refresh_interval_secs);
        eprintln!("  months:     {}", config.month_labels().len());
        eprintln!("  demo fill:  {}", config.demo_augmentation);
        eprintln!();
    }

    let bank = RngBank::new(config.seed);
    match input {
        Some(path) => {
            let source = JsonFileSource::new(path);
            run_loop(Dashboard::new(source, config, &bank), refreshes)
        }
        None => {
            let mut service = CivilService::seeded(
                config.clone(),
                Arc::new(SystemClock),
                bank.for_stream(StreamSlot::Service),
            );
            if let Some(title) = find_arg(&args, "--submit") {
                let submission = service.submit_complaint(title, SubmitOptions::default())?;
                log::info!(
                    "submitted demo complaint {} (job {})",
                    submission.record_id,
                    submission.job_id
                );
            }
            run_loop(Dashboard::new(service, config, &bank), refreshes)
        }
    }
}

/// Re-fetch and re-aggregate `refreshes` times, sleeping the configured
/// interval between runs. Each applied result is printed as one JSON line.
fn run_loop<S: ComplaintSource>(mut dashboard: Dashboard<S>, refreshes: u64) -> Result<()> {
    let interval = Duration::from_secs(dashboard.config().refresh_interval_secs);
    for i in 0..refreshes {
        if i > 0 {
            std::thread::sleep(interval);
        }
        // Sequential refreshes always apply; only overlapping prepare/apply can go stale.
        match dashboard.refresh() {
            Ok(_) => {
                if let Some(stats) = dashboard.current() {
                    println!("{}", serde_json::to_string(stats)?);
                }
            }
            Err(e) => log::error!("refresh {i} failed: {e}"),
        }
    }
    Ok(())
}

fn find_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
