//! Validate a submission file and merge it into the leaderboard.
//!
//! Usage:
//!   process_submission <file>              validate and merge one file
//!   process_submission --all               process every file in SUBMISSIONS_DIR
//!   process_submission --validate <file>   validate only, no merge

use serde_json::Value;
use std::path::{Path, PathBuf};

use livecve_leaderboard::logging::{log, obj, today, v_num, v_str, Domain, Level};
use livecve_leaderboard::submission::{
    empty_leaderboard, load_json, merge_into_leaderboard, save_json, validate_submission,
};

fn leaderboard_file() -> PathBuf {
    PathBuf::from(
        std::env::var("LEADERBOARD_FILE").unwrap_or_else(|_| "data/leaderboard.json".to_string()),
    )
}

fn submissions_dir() -> PathBuf {
    PathBuf::from(std::env::var("SUBMISSIONS_DIR").unwrap_or_else(|_| "submissions".to_string()))
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let code = match args.first().map(String::as_str) {
        Some("--all") => process_all(),
        Some("--validate") => match args.get(1) {
            Some(path) => process_file(Path::new(path), true),
            None => {
                eprintln!("usage: process_submission --validate <file>");
                2
            }
        },
        Some(path) => process_file(Path::new(path), false),
        None => {
            eprintln!("usage: process_submission <file> | --all | --validate <file>");
            2
        }
    };
    std::process::exit(code);
}

fn process_file(path: &Path, validate_only: bool) -> i32 {
    println!("Processing: {}", path.display());
    let submission = match load_json(path) {
        Ok(v) => v,
        Err(err) => {
            eprintln!("  error: {}", err);
            return 1;
        }
    };

    let report = validate_submission(&submission);
    for warning in &report.warnings {
        println!("  warning: {}", warning);
    }
    if !report.ok() {
        eprintln!("  validation failed:");
        for error in &report.errors {
            eprintln!("    - {}", error);
        }
        return 1;
    }
    println!("  validation passed");
    if validate_only {
        return 0;
    }

    if merge(&submission).is_err() {
        return 1;
    }
    0
}

fn merge(submission: &Value) -> Result<(), ()> {
    let board_path = leaderboard_file();
    let mut board = if board_path.exists() {
        match load_json(&board_path) {
            Ok(v) => v,
            Err(err) => {
                eprintln!("  error loading leaderboard: {}", err);
                return Err(());
            }
        }
    } else {
        empty_leaderboard(&today())
    };

    let warnings = match merge_into_leaderboard(&mut board, submission, &today()) {
        Ok(w) => w,
        Err(err) => {
            eprintln!("  merge failed: {}", err);
            return Err(());
        }
    };
    for warning in &warnings {
        println!("  warning: {}", warning);
    }

    if let Err(err) = save_json(&board_path, &board) {
        eprintln!("  {}", err);
        return Err(());
    }
    println!("  saved to {}", board_path.display());
    log(
        Level::Info,
        Domain::Submission,
        "merged",
        obj(&[
            ("leaderboard", v_str(&board_path.display().to_string())),
            ("warnings", v_num(warnings.len() as f64)),
        ]),
    );
    Ok(())
}

fn process_all() -> i32 {
    let dir = submissions_dir();
    let mut paths: Vec<PathBuf> = match std::fs::read_dir(&dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().map_or(false, |ext| ext == "json"))
            .collect(),
        Err(err) => {
            eprintln!("cannot read {}: {}", dir.display(), err);
            return 1;
        }
    };
    paths.sort();

    if paths.is_empty() {
        eprintln!("no submission files found in {}", dir.display());
        return 1;
    }

    let mut succeeded = 0u32;
    let mut failed = 0u32;
    for path in &paths {
        if process_file(path, false) == 0 {
            succeeded += 1;
        } else {
            failed += 1;
        }
    }
    println!("Results: {} succeeded, {} failed", succeeded, failed);
    if failed > 0 {
        1
    } else {
        0
    }
}
