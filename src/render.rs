//! Plain-text table rendering for the CLI. The engine stays presentation-free;
//! everything here is string assembly over derived rows.

use crate::dataset::Dataset;
use crate::format::{
    format_accuracy, format_value, rank_badge, score_band, ScoreScale, ValueKind,
};
use crate::stats::DerivedRow;

pub const LOAD_FAILURE_MSG: &str = "Failed to load leaderboard data";
pub const EMPTY_RESULT_MSG: &str = "No results match the current filters";

pub fn render_load_failure() -> String {
    format!("  {}", LOAD_FAILURE_MSG)
}

pub fn render_header(dataset: &Dataset, active_cves: usize) -> String {
    format!(
        "Last updated: {} | Active CVEs: {}",
        dataset.metadata.last_updated, active_cves
    )
}

pub fn render_table(rows: &[DerivedRow], scale: ScoreScale) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>4}  {:<28} {:<18} {:>6}/{:<6} {:>8} {:>5}  {:>7} {:>10}  {:>7} {:>10}  {}\n",
        "Rank", "Model", "Agent", "MType", "AType", "Acc", "CVEs", "S.Turns", "S.Tokens",
        "F.Turns", "F.Tokens", "Band"
    ));
    if rows.is_empty() {
        out.push_str(&format!("  {}\n", EMPTY_RESULT_MSG));
        return out;
    }
    for row in rows {
        out.push_str(&format!(
            "{:>4}  {:<28} {:<18} {:>6}/{:<6} {:>8} {:>5}  {:>7} {:>10}  {:>7} {:>10}  {}\n",
            row.original_rank,
            row.model,
            row.agent,
            row.model_type.as_str(),
            row.agent_type.as_str(),
            format_accuracy(row.accuracy),
            row.total_cves,
            format_value(row.success.turns, ValueKind::Turns),
            format_value(row.success.tokens, ValueKind::Tokens),
            format_value(row.failed.turns, ValueKind::Turns),
            format_value(row.failed.tokens, ValueKind::Tokens),
            score_band(row.accuracy, scale).class_name(),
        ));
    }
    out
}

/// Tooltip body for a row's missing-CVE marker.
pub fn missing_tooltip(row: &DerivedRow) -> String {
    if row.missing_cves.is_empty() {
        return "Tested against every CVE in the active range".to_string();
    }
    format!(
        "Missing {} CVEs: {}",
        row.missing_cves.len(),
        row.missing_cves.join(", ")
    )
}

/// Rank cell with its badge class, as the page renders it.
pub fn rank_cell(rank: usize) -> String {
    format!("{} [{}]", rank, rank_badge(rank))
}
