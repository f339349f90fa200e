//! Convert a merged-results file to leaderboard.json.
//!
//! Usage: convert [merged_results_file]
//!
//! With no argument the highest-versioned merged_results_v*.json under the
//! data directory is used. CVE publish dates come from
//! data/cve_publish_dates.json.

use std::path::PathBuf;

use livecve_leaderboard::logging::{log, obj, today, v_num, v_str, Domain, Level};
use livecve_leaderboard::submission::{convert_merged, load_json, save_json};

fn main() {
    let data_dir = PathBuf::from(
        std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()),
    );

    let merged_path = match std::env::args().nth(1) {
        Some(path) => PathBuf::from(path),
        None => match latest_merged(&data_dir) {
            Some(path) => {
                println!("Using latest: {}", path.display());
                path
            }
            None => {
                eprintln!("no merged_results file found in {}", data_dir.display());
                std::process::exit(1);
            }
        },
    };

    let merged = match load_json(&merged_path) {
        Ok(v) => v,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    };
    let dates_path = data_dir.join("cve_publish_dates.json");
    let cve_dates = load_json(&dates_path).unwrap_or_else(|_| serde_json::json!({"cves": []}));

    let (board, warnings) = match convert_merged(&merged, &cve_dates, &today()) {
        Ok(out) => out,
        Err(err) => {
            eprintln!("convert failed: {}", err);
            std::process::exit(1);
        }
    };
    for warning in &warnings {
        eprintln!("warning: {}", warning);
    }

    let out_path = data_dir.join("leaderboard.json");
    if let Err(err) = save_json(&out_path, &board) {
        eprintln!("{}", err);
        std::process::exit(1);
    }

    let cves = board["cves"].as_array().map(|a| a.len()).unwrap_or(0);
    println!("Generated {}", out_path.display());
    println!("  - {} CVEs", cves);
    log(
        Level::Info,
        Domain::Submission,
        "converted",
        obj(&[
            ("out", v_str(&out_path.display().to_string())),
            ("cves", v_num(cves as f64)),
            ("warnings", v_num(warnings.len() as f64)),
        ]),
    );
}

fn latest_merged(data_dir: &std::path::Path) -> Option<PathBuf> {
    let mut best: Option<(u32, PathBuf)> = None;
    for entry in std::fs::read_dir(data_dir).ok()?.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if let Some(rest) = name.strip_prefix("merged_results_v") {
            if let Some(version) = rest.strip_suffix(".json") {
                if let Ok(v) = version.parse::<u32>() {
                    if best.as_ref().map_or(true, |(b, _)| v > *b) {
                        best = Some((v, entry.path()));
                    }
                }
            }
        }
    }
    best.map(|(_, p)| p)
}
