//! Display formatting: stat cells, score banding, rank badges.

/// Which scale a dataset's accuracy values should be banded on. Legacy flat
/// datasets kept 0-100 task scores with the old 70/50 thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreScale {
    Unit,
    Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Turns,
    Tokens,
}

/// Render a mean stat for a table cell.
///
/// Zero, negative, and NaN all collapse to "-". A legitimately-zero mean is
/// therefore indistinguishable from "no data"; the deployed page behaves this
/// way and the behavior is kept as-is.
pub fn format_value(value: f64, kind: ValueKind) -> String {
    if !value.is_finite() || value <= 0.0 {
        return "-".to_string();
    }
    match kind {
        ValueKind::Tokens => group_thousands(value.round() as i64),
        ValueKind::Turns => format!("{:.1}", value),
    }
}

fn group_thousands(n: i64) -> String {
    let digits = n.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    let offset = digits.len() % 3;
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (i + 3 - offset) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if n < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

pub fn format_accuracy(accuracy: f64) -> String {
    format!("{:.1}%", accuracy * 100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    High,
    Medium,
    Low,
}

impl ScoreBand {
    pub fn class_name(&self) -> &'static str {
        match self {
            ScoreBand::High => "score-high",
            ScoreBand::Medium => "score-medium",
            ScoreBand::Low => "score-low",
        }
    }
}

/// Band an accuracy value (always stored in [0,1]) for color classes.
pub fn score_band(accuracy: f64, scale: ScoreScale) -> ScoreBand {
    match scale {
        ScoreScale::Unit => {
            if accuracy >= 0.70 {
                ScoreBand::High
            } else if accuracy >= 0.40 {
                ScoreBand::Medium
            } else {
                ScoreBand::Low
            }
        }
        ScoreScale::Percent => {
            let pct = accuracy * 100.0;
            if pct >= 70.0 {
                ScoreBand::High
            } else if pct >= 50.0 {
                ScoreBand::Medium
            } else {
                ScoreBand::Low
            }
        }
    }
}

pub fn rank_badge(rank: usize) -> &'static str {
    match rank {
        1 => "rank-1",
        2 => "rank-2",
        3 => "rank-3",
        _ => "rank-default",
    }
}
