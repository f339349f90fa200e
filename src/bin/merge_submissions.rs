//! Merge all submission files in a directory into a versioned
//! merged_results file under the data directory.
//!
//! Usage: merge_submissions [submissions_dir]

use std::path::{Path, PathBuf};

use livecve_leaderboard::logging::{log, obj, ts_now, v_num, v_str, Domain, Level};
use livecve_leaderboard::submission::{merge_submission_dir, next_merged_version, save_json};

fn main() {
    let dir = std::env::args().nth(1).unwrap_or_else(|| "submissions".to_string());
    let data_dir = PathBuf::from(
        std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()),
    );

    let outcome = match merge_submission_dir(Path::new(&dir), &ts_now()) {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("merge failed: {}", err);
            std::process::exit(1);
        }
    };

    for note in &outcome.skipped {
        eprintln!("skipped {}", note);
    }
    println!("Successfully loaded: {} submissions", outcome.loaded);

    let version = next_merged_version(&data_dir);
    let out_path = data_dir.join(format!("merged_results_v{}.json", version));
    if let Err(err) = save_json(&out_path, &outcome.merged) {
        eprintln!("{}", err);
        std::process::exit(1);
    }

    println!("Generated: {}", out_path.display());
    println!("Next step: run convert");
    log(
        Level::Info,
        Domain::Submission,
        "merged_dir",
        obj(&[
            ("out", v_str(&out_path.display().to_string())),
            ("loaded", v_num(outcome.loaded as f64)),
            ("skipped", v_num(outcome.skipped.len() as f64)),
        ]),
    );
}
