//! Per-record aggregation against the active CVE subset.

use crate::dataset::{AccessType, Cve, Record};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PartitionMeans {
    pub turns: f64,
    pub tokens: f64,
}

/// One leaderboard row, rebuilt from scratch on every filter or sort event.
#[derive(Debug, Clone)]
pub struct DerivedRow {
    pub model: String,
    pub agent: String,
    pub model_type: AccessType,
    pub agent_type: AccessType,
    pub accuracy: f64,
    pub success: PartitionMeans,
    pub failed: PartitionMeans,
    pub total_cves: usize,
    /// Active-subset ids this record never tested, in subset order.
    pub missing_cves: Vec<String>,
    /// Competition rank, assigned once and untouched by display sorting.
    pub original_rank: usize,
}

/// Collapse one record's results over the active subset. Returns `None` when
/// the record tests nothing in the subset; such rows are excluded from output
/// entirely.
pub fn aggregate(record: &Record, active: &[&Cve]) -> Option<DerivedRow> {
    let mut tested = 0usize;
    let mut score_sum = 0.0;
    let mut success_count = 0usize;
    let mut success_turns = 0.0;
    let mut success_tokens = 0.0;
    let mut failed_count = 0usize;
    let mut failed_turns = 0.0;
    let mut failed_tokens = 0.0;
    let mut missing = Vec::new();

    for cve in active {
        match record.cve_results.get(&cve.id) {
            Some(outcome) => {
                tested += 1;
                score_sum += outcome.score;
                if outcome.success {
                    success_count += 1;
                    success_turns += outcome.turns;
                    success_tokens += outcome.tokens;
                } else {
                    failed_count += 1;
                    failed_turns += outcome.turns;
                    failed_tokens += outcome.tokens;
                }
            }
            None => missing.push(cve.id.clone()),
        }
    }

    if tested == 0 {
        return None;
    }

    Some(DerivedRow {
        model: record.model.clone(),
        agent: record.agent.clone(),
        model_type: record.model_type,
        agent_type: record.agent_type,
        accuracy: score_sum / tested as f64,
        success: PartitionMeans {
            turns: mean(success_turns, success_count),
            tokens: mean(success_tokens, success_count),
        },
        failed: PartitionMeans {
            turns: mean(failed_turns, failed_count),
            tokens: mean(failed_tokens, failed_count),
        },
        total_cves: tested,
        missing_cves: missing,
        original_rank: 0,
    })
}

fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
