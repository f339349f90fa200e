//! Submission intake: validation, leaderboard merge, directory merge, and
//! conversion of merged results into the leaderboard dataset.
//!
//! Validation and merging operate on `serde_json::Value` so every problem in
//! a file can be collected and reported at once instead of failing on the
//! first bad field.

use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::dataset::{cve_id_year, TAB_CVE_DESCRIPTION, TAB_USER_REPORT};

pub const REQUIRED_FIELDS: [&str; 5] = ["model", "agent", "modelType", "agentType", "cve_results"];

/// `CVE-<4-digit year>-<4+ digit sequence>`
pub fn valid_cve_id(id: &str) -> bool {
    let mut parts = id.split('-');
    let prefix = parts.next();
    let year = parts.next();
    let seq = parts.next();
    if parts.next().is_some() {
        return false;
    }
    prefix == Some("CVE")
        && year.map_or(false, |y| y.len() == 4 && y.bytes().all(|b| b.is_ascii_digit()))
        && seq.map_or(false, |s| s.len() >= 4 && s.bytes().all(|b| b.is_ascii_digit()))
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn validate_submission(submission: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();

    let obj = match submission.as_object() {
        Some(obj) => obj,
        None => {
            report.errors.push("submission must be a JSON object".to_string());
            return report;
        }
    };

    for field in REQUIRED_FIELDS {
        if !obj.contains_key(field) {
            report.errors.push(format!("Missing required field: {}", field));
        }
    }
    if !report.errors.is_empty() {
        return report;
    }

    for field in ["modelType", "agentType"] {
        match obj[field].as_str() {
            Some("open") | Some("closed") => {}
            other => report.errors.push(format!(
                "{} must be 'open' or 'closed', got: {}",
                field,
                other.map(str::to_string).unwrap_or_else(|| obj[field].to_string())
            )),
        }
    }

    if let Some(it) = obj.get("instruction_type").and_then(Value::as_str) {
        if it != TAB_CVE_DESCRIPTION && it != TAB_USER_REPORT {
            report.warnings.push(format!("unknown instruction_type: {}", it));
        }
    }

    let results = match obj["cve_results"].as_object() {
        Some(results) => results,
        None => {
            report.errors.push("cve_results must be an object".to_string());
            return report;
        }
    };
    if results.is_empty() {
        report.errors.push("cve_results cannot be empty".to_string());
    }

    for (cve_id, result) in results {
        if !valid_cve_id(cve_id) {
            report.errors.push(format!("Invalid CVE ID format: {}", cve_id));
            continue;
        }
        let result = match result.as_object() {
            Some(r) => r,
            None => {
                report.errors.push(format!("{}: result must be an object", cve_id));
                continue;
            }
        };
        match result.get("success") {
            None => report.errors.push(format!("{}: missing 'success' field", cve_id)),
            Some(v) if !v.is_boolean() => {
                report.errors.push(format!("{}: 'success' must be a boolean", cve_id))
            }
            _ => {}
        }
        for field in ["turns", "tokens"] {
            match result.get(field) {
                None => report.errors.push(format!("{}: missing '{}' field", cve_id, field)),
                Some(v) => match v.as_f64() {
                    Some(n) if n >= 0.0 => {}
                    _ => report.errors.push(format!(
                        "{}: '{}' must be a non-negative number",
                        cve_id, field
                    )),
                },
            }
        }
    }

    report
}

// ---------------------------------------------------------------------------
// Leaderboard merge
// ---------------------------------------------------------------------------

pub fn empty_leaderboard(today: &str) -> Value {
    json!({
        "metadata": {"lastUpdated": today, "version": "1.0.0"},
        "cves": [],
        "results": {TAB_CVE_DESCRIPTION: [], TAB_USER_REPORT: []}
    })
}

fn submission_tab(submission: &Value) -> &'static str {
    match submission.get("instruction_type").and_then(Value::as_str) {
        Some(TAB_USER_REPORT) => TAB_USER_REPORT,
        _ => TAB_CVE_DESCRIPTION,
    }
}

/// Upsert a validated submission into a leaderboard document. The entry is
/// keyed by (model, agent) within the submission's tab; per-CVE results
/// overwrite any previous result for the same id. Returns merge warnings.
pub fn merge_into_leaderboard(
    board: &mut Value,
    submission: &Value,
    today: &str,
) -> Result<Vec<String>, String> {
    let model = submission
        .get("model")
        .and_then(Value::as_str)
        .ok_or("submission missing model")?
        .to_string();
    let agent = submission
        .get("agent")
        .and_then(Value::as_str)
        .ok_or("submission missing agent")?
        .to_string();
    let sub_results = submission
        .get("cve_results")
        .and_then(Value::as_object)
        .ok_or("submission missing cve_results")?
        .clone();
    let tab = submission_tab(submission);

    let known_ids: BTreeSet<String> = board
        .get("cves")
        .and_then(Value::as_array)
        .map(|cves| {
            cves.iter()
                .filter_map(|c| c.get("id").and_then(Value::as_str).map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    let mut warnings = Vec::new();
    for id in sub_results.keys() {
        if !known_ids.contains(id) {
            warnings.push(format!("CVE not in catalog, add its date: {}", id));
        }
    }

    let board_obj = board.as_object_mut().ok_or("leaderboard must be an object")?;
    let results = board_obj
        .entry("results")
        .or_insert_with(|| json!({}))
        .as_object_mut()
        .ok_or("results must be an object")?;
    let entries = results
        .entry(tab)
        .or_insert_with(|| json!([]))
        .as_array_mut()
        .ok_or("tab results must be an array")?;

    let existing = entries.iter_mut().find(|e| {
        e.get("model").and_then(Value::as_str) == Some(model.as_str())
            && e.get("agent").and_then(Value::as_str) == Some(agent.as_str())
    });

    match existing {
        Some(entry) => {
            let entry = entry.as_object_mut().ok_or("entry must be an object")?;
            entry.insert("modelType".to_string(), submission["modelType"].clone());
            entry.insert("agentType".to_string(), submission["agentType"].clone());
            let merged = entry
                .entry("cve_results")
                .or_insert_with(|| json!({}))
                .as_object_mut()
                .ok_or("cve_results must be an object")?;
            for (id, result) in sub_results {
                merged.insert(id, result);
            }
        }
        None => {
            entries.push(json!({
                "model": model,
                "agent": agent,
                "modelType": submission["modelType"],
                "agentType": submission["agentType"],
                "cve_results": Value::Object(sub_results),
            }));
        }
    }

    let metadata = board_obj
        .entry("metadata")
        .or_insert_with(|| json!({}))
        .as_object_mut()
        .ok_or("metadata must be an object")?;
    metadata.insert("lastUpdated".to_string(), json!(today));

    Ok(warnings)
}

// ---------------------------------------------------------------------------
// Directory merge
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct MergeOutcome {
    pub merged: Value,
    pub loaded: usize,
    pub skipped: Vec<String>,
}

/// Merge every `*.json` submission under `dir` into one merged-results
/// document. Invalid files are skipped with a note, not fatal.
pub fn merge_submission_dir(dir: &Path, generated_at: &str) -> Result<MergeOutcome, String> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| format!("cannot read {}: {}", dir.display(), e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension().map_or(false, |ext| ext == "json")
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .map_or(false, |n| !n.starts_with('.'))
        })
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(format!("no submission files found in {}", dir.display()));
    }

    let mut results = Vec::new();
    let mut all_cves = BTreeSet::new();
    let mut skipped = Vec::new();

    for path in &paths {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("?").to_string();
        let submission = match load_json(path) {
            Ok(v) => v,
            Err(err) => {
                skipped.push(format!("{}: {}", name, err));
                continue;
            }
        };
        let report = validate_submission(&submission);
        if !report.ok() {
            skipped.push(format!("{}: {}", name, report.errors.join("; ")));
            continue;
        }
        if let Some(ids) = submission.get("cve_results").and_then(Value::as_object) {
            all_cves.extend(ids.keys().cloned());
        }
        results.push(submission);
    }

    let loaded = results.len();
    let merged = json!({
        "generated_at": generated_at,
        "total_cves": all_cves.len(),
        "total_combinations": loaded,
        "results": results,
    });

    Ok(MergeOutcome { merged, loaded, skipped })
}

/// Next version for `merged_results_vN.json` in the data directory.
pub fn next_merged_version(data_dir: &Path) -> u32 {
    let mut max = 0u32;
    if let Ok(entries) = std::fs::read_dir(data_dir) {
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(rest) = name.strip_prefix("merged_results_v") {
                if let Some(version) = rest.strip_suffix(".json") {
                    if let Ok(v) = version.parse::<u32>() {
                        max = max.max(v);
                    }
                }
            }
        }
    }
    max + 1
}

// ---------------------------------------------------------------------------
// Convert merged results to the leaderboard dataset
// ---------------------------------------------------------------------------

/// Build leaderboard.json from a merged-results document and a CVE
/// publish-date lookup (`{"cves": [{"id", "date"}]}`). CVEs without a known
/// date fall back to January 1st of the year embedded in their id.
pub fn convert_merged(
    merged: &Value,
    cve_dates: &Value,
    today: &str,
) -> Result<(Value, Vec<String>), String> {
    let results = merged
        .get("results")
        .and_then(Value::as_array)
        .ok_or("merged results must contain a results array")?;

    let date_lookup: BTreeMap<String, String> = cve_dates
        .get("cves")
        .and_then(Value::as_array)
        .map(|cves| {
            cves.iter()
                .filter_map(|c| {
                    let id = c.get("id").and_then(Value::as_str)?;
                    let date = c.get("date").and_then(Value::as_str)?;
                    Some((id.to_string(), date.to_string()))
                })
                .collect()
        })
        .unwrap_or_default();

    let mut all_cves = BTreeSet::new();
    for result in results {
        if let Some(ids) = result.get("cve_results").and_then(Value::as_object) {
            all_cves.extend(ids.keys().cloned());
        }
    }

    let mut warnings = Vec::new();
    let mut cve_list: Vec<(String, String)> = Vec::with_capacity(all_cves.len());
    for id in all_cves {
        let date = match date_lookup.get(&id) {
            Some(date) => date.clone(),
            None => {
                warnings.push(format!("missing publish date, using fallback: {}", id));
                format!("{}-01-01", cve_id_year(&id).unwrap_or(1970))
            }
        };
        cve_list.push((id, date));
    }
    cve_list.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

    let mut cve_description = Vec::new();
    let mut user_report = Vec::new();
    for result in results {
        let converted = json!({
            "model": result.get("model").cloned().unwrap_or(Value::Null),
            "agent": result.get("agent").cloned().unwrap_or(Value::Null),
            "modelType": result.get("modelType").cloned().unwrap_or(Value::Null),
            "agentType": result.get("agentType").cloned().unwrap_or(Value::Null),
            "cve_results": result.get("cve_results").cloned().unwrap_or(json!({})),
        });
        if submission_tab(result) == TAB_USER_REPORT {
            user_report.push(converted);
        } else {
            cve_description.push(converted);
        }
    }

    let board = json!({
        "metadata": {"lastUpdated": today, "version": "1.0.0"},
        "cves": cve_list
            .into_iter()
            .map(|(id, date)| json!({"id": id, "date": date}))
            .collect::<Vec<Value>>(),
        "results": {
            TAB_CVE_DESCRIPTION: cve_description,
            TAB_USER_REPORT: user_report,
        }
    });

    Ok((board, warnings))
}

pub fn load_json(path: &Path) -> Result<Value, String> {
    let body = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    serde_json::from_str(&body).map_err(|e| format!("invalid JSON: {}", e))
}

pub fn save_json(path: &Path, value: &Value) -> Result<(), String> {
    let body = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    std::fs::write(path, body).map_err(|e| format!("cannot write {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn good_submission() -> Value {
        json!({
            "model": "GPT-4o",
            "agent": "OpenHands",
            "modelType": "closed",
            "agentType": "open",
            "instruction_type": "cve_description",
            "cve_results": {
                "CVE-2025-1234": {"success": true, "turns": 12, "tokens": 3000},
                "CVE-2025-5678": {"success": false, "turns": 40, "tokens": 9000}
            }
        })
    }

    #[test]
    fn cve_id_format() {
        assert!(valid_cve_id("CVE-2025-1234"));
        assert!(valid_cve_id("CVE-2024-123456"));
        assert!(!valid_cve_id("CVE-25-1234"));
        assert!(!valid_cve_id("CVE-2025-123"));
        assert!(!valid_cve_id("cve-2025-1234"));
        assert!(!valid_cve_id("CVE-2025-1234-x"));
    }

    #[test]
    fn valid_submission_passes() {
        let report = validate_submission(&good_submission());
        assert!(report.ok(), "{:?}", report.errors);
    }

    #[test]
    fn collects_all_errors() {
        let bad = json!({
            "model": "m",
            "agent": "a",
            "modelType": "proprietary",
            "agentType": "open",
            "cve_results": {
                "CVE-bad": {"success": true, "turns": 1, "tokens": 1},
                "CVE-2025-9999": {"success": "yes", "turns": -1}
            }
        });
        let report = validate_submission(&bad);
        assert!(!report.ok());
        assert!(report.errors.iter().any(|e| e.contains("modelType")));
        assert!(report.errors.iter().any(|e| e.contains("Invalid CVE ID")));
        assert!(report.errors.iter().any(|e| e.contains("'success' must be a boolean")));
        assert!(report.errors.iter().any(|e| e.contains("'turns' must be a non-negative")));
        assert!(report.errors.iter().any(|e| e.contains("missing 'tokens'")));
    }

    #[test]
    fn missing_fields_short_circuit() {
        let report = validate_submission(&json!({"model": "m"}));
        assert_eq!(report.errors.len(), 4);
    }

    #[test]
    fn empty_results_rejected() {
        let mut sub = good_submission();
        sub["cve_results"] = json!({});
        assert!(!validate_submission(&sub).ok());
    }

    #[test]
    fn merge_adds_then_overwrites() {
        let mut board = empty_leaderboard("2025-08-01");
        let warnings = merge_into_leaderboard(&mut board, &good_submission(), "2025-08-02").unwrap();
        // Neither CVE is in the (empty) catalog yet.
        assert_eq!(warnings.len(), 2);
        assert_eq!(board["results"][TAB_CVE_DESCRIPTION].as_array().unwrap().len(), 1);
        assert_eq!(board["metadata"]["lastUpdated"], "2025-08-02");

        // Resubmission for the same pair overwrites per-CVE results in place.
        let mut update = good_submission();
        update["cve_results"] = json!({
            "CVE-2025-1234": {"success": false, "turns": 99, "tokens": 1}
        });
        merge_into_leaderboard(&mut board, &update, "2025-08-03").unwrap();
        let entries = board["results"][TAB_CVE_DESCRIPTION].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        let results = entries[0]["cve_results"].as_object().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results["CVE-2025-1234"]["success"], json!(false));
        assert_eq!(results["CVE-2025-5678"]["success"], json!(false));
    }

    #[test]
    fn merge_routes_user_report_tab() {
        let mut board = empty_leaderboard("2025-08-01");
        let mut sub = good_submission();
        sub["instruction_type"] = json!("user_report");
        merge_into_leaderboard(&mut board, &sub, "2025-08-02").unwrap();
        assert_eq!(board["results"][TAB_USER_REPORT].as_array().unwrap().len(), 1);
        assert_eq!(board["results"][TAB_CVE_DESCRIPTION].as_array().unwrap().len(), 0);
    }

    #[test]
    fn convert_sorts_catalog_and_falls_back_on_dates() {
        let merged = json!({
            "results": [good_submission()]
        });
        let dates = json!({"cves": [{"id": "CVE-2025-5678", "date": "2025-03-10"}]});
        let (board, warnings) = convert_merged(&merged, &dates, "2025-08-24").unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("CVE-2025-1234"));
        let cves = board["cves"].as_array().unwrap();
        // Fallback date 2025-01-01 sorts before the known 2025-03-10.
        assert_eq!(cves[0]["id"], "CVE-2025-1234");
        assert_eq!(cves[0]["date"], "2025-01-01");
        assert_eq!(cves[1]["id"], "CVE-2025-5678");
        assert_eq!(board["metadata"]["lastUpdated"], "2025-08-24");
    }
}
