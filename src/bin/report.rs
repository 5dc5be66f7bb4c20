// Seed-to-snapshot report runner. Loads a JSON seed file, runs the
// aggregators, and prints the dashboard snapshot plus lead funnel metrics as
// pretty JSON.
//
// Usage: salesiq-report <seed.json> [timezone]

use std::path::Path;
use std::process::ExitCode;

use chrono::Utc;
use chrono_tz::Tz;

use salesiq::json_loader;
use salesiq::services::{dashboard, leads};

fn main() -> ExitCode {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed_path = match args.next() {
        Some(p) => p,
        None => {
            eprintln!("usage: salesiq-report <seed.json> [timezone]");
            return ExitCode::FAILURE;
        }
    };
    let tz: Tz = match args.next().as_deref().unwrap_or("America/New_York").parse() {
        Ok(tz) => tz,
        Err(e) => {
            eprintln!("invalid timezone: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let now = Utc::now();
    let store = match json_loader::load_seed(Path::new(&seed_path))
        .and_then(|doc| json_loader::populate(doc, now))
    {
        Ok(store) => store,
        Err(e) => {
            eprintln!("seed error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let snapshot = dashboard::snapshot(&store);
    let funnel = leads::metrics(&store, now, tz);

    let report = serde_json::json!({
        "dashboard": snapshot,
        "leadMetrics": funnel,
    });
    match serde_json::to_string_pretty(&report) {
        Ok(out) => {
            println!("{}", out);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("serialization error: {}", e);
            ExitCode::FAILURE
        }
    }
}
