//! Competition ranking: equal accuracy shares a rank, the next distinct
//! accuracy takes its 1-indexed position (1,1,1,4).

use std::cmp::Ordering;

use crate::stats::DerivedRow;

/// Stamp `original_rank` onto every row. Ordering for rank purposes is
/// accuracy descending, ties broken by ascending mean success tokens (fewer
/// tokens ranks higher). The rows' own order is left untouched.
pub fn assign_ranks(rows: &mut [DerivedRow]) {
    let mut order: Vec<usize> = (0..rows.len()).collect();
    order.sort_by(|&a, &b| {
        rows[b]
            .accuracy
            .partial_cmp(&rows[a].accuracy)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                rows[a]
                    .success
                    .tokens
                    .partial_cmp(&rows[b].success.tokens)
                    .unwrap_or(Ordering::Equal)
            })
    });

    let mut prev_accuracy = f64::NAN;
    let mut prev_rank = 0usize;
    for (position, &idx) in order.iter().enumerate() {
        let rank = if position > 0 && rows[idx].accuracy == prev_accuracy {
            prev_rank
        } else {
            position + 1
        };
        prev_accuracy = rows[idx].accuracy;
        prev_rank = rank;
        rows[idx].original_rank = rank;
    }
}
