//! Engine façade: one pure function from (dataset, view state) to the ordered
//! row list. Every UI event rebuilds its view state and calls this again;
//! nothing is cached across renders.

use crate::dataset::{Dataset, InstructionType};
use crate::filter::{active_cves, candidate_records, FilterState, Timeline};
use crate::rank::assign_ranks;
use crate::sort::{sort_rows, SortState};
use crate::stats::{aggregate, DerivedRow};

#[derive(Debug, Clone)]
pub struct ViewState {
    pub tab: InstructionType,
    pub filters: FilterState,
    pub sort: SortState,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            tab: InstructionType::CveDescription,
            filters: FilterState::default(),
            sort: SortState::default(),
        }
    }
}

pub fn compute_display_rows(dataset: &Dataset, view: &ViewState) -> Vec<DerivedRow> {
    let active = active_cves(&dataset.cves, &view.filters.timeline);
    let candidates = candidate_records(dataset.records(view.tab), &active, &view.filters);
    let mut rows: Vec<DerivedRow> = candidates
        .into_iter()
        .filter_map(|r| aggregate(r, &active))
        .collect();
    assign_ranks(&mut rows);
    sort_rows(&mut rows, &view.sort);
    rows
}

/// Count for the header and timeline caption.
pub fn active_cve_count(dataset: &Dataset, timeline: &Timeline) -> usize {
    active_cves(&dataset.cves, timeline).len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::parse_dataset;
    use crate::sort::{SortDirection, SortField};

    fn dataset() -> Dataset {
        parse_dataset(
            r#"{
                "metadata": {"lastUpdated": "2025-06-01"},
                "cves": [
                    {"id": "CVE-2024-0001", "date": "2024-03-01"},
                    {"id": "CVE-2025-0002", "date": "2025-02-01"},
                    {"id": "CVE-2025-0003", "date": "2025-08-01"}
                ],
                "results": {
                    "cve_description": [
                        {"model": "GPT-4o", "agent": "OpenHands",
                         "modelType": "closed", "agentType": "open",
                         "cve_results": {
                            "CVE-2024-0001": {"success": true, "turns": 10, "tokens": 1000},
                            "CVE-2025-0002": {"success": false, "turns": 40, "tokens": 9000}
                         }},
                        {"model": "Llama-3", "agent": "SWE-agent",
                         "modelType": "open", "agentType": "open",
                         "cve_results": {
                            "CVE-2025-0003": {"success": true, "turns": 25, "tokens": 5000}
                         }}
                    ],
                    "user_report": [
                        {"model": "GPT-4o", "agent": "OpenHands",
                         "modelType": "closed", "agentType": "open",
                         "cve_results": {
                            "CVE-2025-0002": {"success": true, "turns": 8, "tokens": 800}
                         }}
                    ]
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn full_pipeline_over_default_view() {
        let ds = dataset();
        let rows = compute_display_rows(&ds, &ViewState::default());
        assert_eq!(rows.len(), 2);
        // Llama-3 has 1/1, GPT-4o 1/2; accuracy desc puts Llama-3 first.
        assert_eq!(rows[0].model, "Llama-3");
        assert_eq!(rows[0].original_rank, 1);
        assert_eq!(rows[1].original_rank, 2);
        assert_eq!(rows[1].missing_cves, vec!["CVE-2025-0003".to_string()]);
    }

    #[test]
    fn tab_switch_changes_record_set() {
        let ds = dataset();
        let view = ViewState { tab: InstructionType::UserReport, ..ViewState::default() };
        let rows = compute_display_rows(&ds, &view);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].model, "GPT-4o");
        assert_eq!(rows[0].accuracy, 1.0);
    }

    #[test]
    fn timeline_restricts_rows_and_stats() {
        let ds = dataset();
        let mut view = ViewState::default();
        view.filters.timeline = Timeline::Year(2024);
        let rows = compute_display_rows(&ds, &view);
        // Only GPT-4o tested a 2024 CVE; its accuracy over that subset is 1.
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].model, "GPT-4o");
        assert_eq!(rows[0].accuracy, 1.0);
        assert_eq!(rows[0].total_cves, 1);
        assert_eq!(active_cve_count(&ds, &Timeline::Year(2024)), 1);
    }

    #[test]
    fn display_sort_does_not_move_ranks() {
        let ds = dataset();
        let view = ViewState {
            sort: SortState { field: SortField::Model, direction: SortDirection::Asc },
            ..ViewState::default()
        };
        let rows = compute_display_rows(&ds, &view);
        assert_eq!(rows[0].model, "GPT-4o");
        assert_eq!(rows[0].original_rank, 2);
        assert_eq!(rows[1].model, "Llama-3");
        assert_eq!(rows[1].original_rank, 1);
    }

    #[test]
    fn empty_filter_result_is_empty_not_error() {
        let ds = dataset();
        let mut view = ViewState::default();
        view.filters.model = Some("nonexistent".to_string());
        assert!(compute_display_rows(&ds, &view).is_empty());
    }
}
