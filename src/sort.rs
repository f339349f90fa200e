//! Display sorting: user-selected field and direction over derived rows.

use std::cmp::Ordering;

use crate::stats::DerivedRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Rank,
    Model,
    Agent,
    Accuracy,
    TotalCves,
    SuccessTurns,
    SuccessTokens,
    FailedTurns,
    FailedTokens,
}

impl SortField {
    /// Column keys as emitted by the table headers. Anything unrecognized
    /// falls back to accuracy.
    pub fn from_key(key: &str) -> Self {
        match key {
            "rank" => SortField::Rank,
            "model" => SortField::Model,
            "agent" => SortField::Agent,
            "accuracy" => SortField::Accuracy,
            "total_cves" | "totalCVEs" => SortField::TotalCves,
            "success_turns" => SortField::SuccessTurns,
            "success_tokens" => SortField::SuccessTokens,
            "failed_turns" => SortField::FailedTurns,
            "failed_tokens" => SortField::FailedTokens,
            _ => SortField::Accuracy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Rank => "rank",
            SortField::Model => "model",
            SortField::Agent => "agent",
            SortField::Accuracy => "accuracy",
            SortField::TotalCves => "total_cves",
            SortField::SuccessTurns => "success_turns",
            SortField::SuccessTokens => "success_tokens",
            SortField::FailedTurns => "failed_turns",
            SortField::FailedTokens => "failed_tokens",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggle(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn from_key(key: &str) -> Self {
        match key {
            "asc" => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self { field: SortField::Accuracy, direction: SortDirection::Desc }
    }
}

impl SortState {
    /// Header-click behavior: clicking the active column toggles direction,
    /// clicking a new column selects it descending.
    pub fn click(&mut self, field: SortField) {
        if self.field == field {
            self.direction = self.direction.toggle();
        } else {
            self.field = field;
            self.direction = SortDirection::Desc;
        }
    }
}

enum SortValue {
    Num(f64),
    Text(String),
}

fn sort_value(row: &DerivedRow, field: SortField) -> SortValue {
    match field {
        SortField::Rank => SortValue::Num(row.original_rank as f64),
        SortField::Model => SortValue::Text(row.model.to_lowercase()),
        SortField::Agent => SortValue::Text(row.agent.to_lowercase()),
        SortField::Accuracy => SortValue::Num(row.accuracy),
        SortField::TotalCves => SortValue::Num(row.total_cves as f64),
        SortField::SuccessTurns => SortValue::Num(row.success.turns),
        SortField::SuccessTokens => SortValue::Num(row.success.tokens),
        SortField::FailedTurns => SortValue::Num(row.failed.turns),
        SortField::FailedTokens => SortValue::Num(row.failed.tokens),
    }
}

fn cmp_values(a: &SortValue, b: &SortValue) -> Ordering {
    match (a, b) {
        (SortValue::Text(x), SortValue::Text(y)) => x.cmp(y),
        (SortValue::Num(x), SortValue::Num(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        // A field extracts one value kind; mixed comparison never happens.
        _ => Ordering::Equal,
    }
}

/// Stable display sort; never touches `original_rank`.
pub fn sort_rows(rows: &mut [DerivedRow], sort: &SortState) {
    rows.sort_by(|a, b| {
        let ord = cmp_values(&sort_value(a, sort.field), &sort_value(b, sort.field));
        match sort.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::AccessType;
    use crate::stats::PartitionMeans;

    fn row(model: &str, agent: &str, accuracy: f64, tokens: f64, rank: usize) -> DerivedRow {
        DerivedRow {
            model: model.to_string(),
            agent: agent.to_string(),
            model_type: AccessType::Open,
            agent_type: AccessType::Open,
            accuracy,
            success: PartitionMeans { turns: 1.0, tokens },
            failed: PartitionMeans::default(),
            total_cves: 5,
            missing_cves: Vec::new(),
            original_rank: rank,
        }
    }

    fn models(rows: &[DerivedRow]) -> Vec<String> {
        rows.iter().map(|r| r.model.clone()).collect()
    }

    #[test]
    fn numeric_sort_and_direction() {
        let mut rows = vec![
            row("a", "x", 0.2, 1.0, 3),
            row("b", "x", 0.9, 1.0, 1),
            row("c", "x", 0.5, 1.0, 2),
        ];
        sort_rows(&mut rows, &SortState { field: SortField::Accuracy, direction: SortDirection::Desc });
        assert_eq!(models(&rows), vec!["b", "c", "a"]);
        sort_rows(&mut rows, &SortState { field: SortField::Accuracy, direction: SortDirection::Asc });
        assert_eq!(models(&rows), vec!["a", "c", "b"]);
    }

    #[test]
    fn string_sort_is_case_insensitive() {
        let mut rows = vec![
            row("claude", "x", 0.1, 1.0, 1),
            row("Llama", "x", 0.2, 1.0, 2),
            row("GPT-4o", "x", 0.3, 1.0, 3),
        ];
        sort_rows(&mut rows, &SortState { field: SortField::Model, direction: SortDirection::Asc });
        assert_eq!(models(&rows), vec!["claude", "GPT-4o", "Llama"]);
    }

    #[test]
    fn unknown_key_falls_back_to_accuracy() {
        assert_eq!(SortField::from_key("bogus"), SortField::Accuracy);
        assert_eq!(SortField::from_key("success_tokens"), SortField::SuccessTokens);
    }

    #[test]
    fn sorting_twice_is_idempotent() {
        let sort = SortState { field: SortField::SuccessTokens, direction: SortDirection::Desc };
        let mut rows = vec![
            row("a", "x", 0.1, 300.0, 1),
            row("b", "x", 0.2, 100.0, 2),
            row("c", "x", 0.3, 200.0, 3),
        ];
        sort_rows(&mut rows, &sort);
        let first = models(&rows).join(",");
        sort_rows(&mut rows, &sort);
        assert_eq!(models(&rows).join(","), first);
    }

    #[test]
    fn toggling_reverses_strictly_ordered_rows() {
        let mut rows = vec![
            row("a", "x", 0.1, 1.0, 3),
            row("b", "x", 0.2, 1.0, 2),
            row("c", "x", 0.3, 1.0, 1),
        ];
        let mut state = SortState { field: SortField::Accuracy, direction: SortDirection::Desc };
        sort_rows(&mut rows, &state);
        let desc = models(&rows);
        state.click(SortField::Accuracy);
        sort_rows(&mut rows, &state);
        let asc = models(&rows);
        let mut reversed = desc.clone();
        reversed.reverse();
        assert_eq!(asc, reversed);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut rows = vec![
            row("first", "x", 0.5, 1.0, 1),
            row("second", "x", 0.5, 1.0, 1),
            row("third", "x", 0.5, 1.0, 1),
        ];
        sort_rows(&mut rows, &SortState { field: SortField::Accuracy, direction: SortDirection::Desc });
        assert_eq!(models(&rows), vec!["first", "second", "third"]);
    }

    #[test]
    fn display_sort_leaves_ranks_alone() {
        let mut rows = vec![row("a", "x", 0.1, 1.0, 2), row("b", "x", 0.9, 1.0, 1)];
        sort_rows(&mut rows, &SortState { field: SortField::Model, direction: SortDirection::Asc });
        assert_eq!(rows[0].original_rank, 2);
        assert_eq!(rows[1].original_rank, 1);
    }

    #[test]
    fn click_new_column_selects_desc() {
        let mut state = SortState::default();
        state.click(SortField::Model);
        assert_eq!(state.field, SortField::Model);
        assert_eq!(state.direction, SortDirection::Desc);
        state.click(SortField::Model);
        assert_eq!(state.direction, SortDirection::Asc);
    }
}
