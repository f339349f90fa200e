//! Environment-driven configuration and view-state construction.

use crate::dataset::{AccessType, InstructionType};
use crate::engine::ViewState;
use crate::filter::{FilterState, Timeline};
use crate::sort::{SortDirection, SortField, SortState};

#[derive(Debug, Clone)]
pub struct Config {
    pub data_path: String,
    pub data_url: Option<String>,
    pub ttl_days: i64,
    pub tab: InstructionType,
    pub model: Option<String>,
    pub agent: Option<String>,
    pub model_type: Option<AccessType>,
    pub agent_type: Option<AccessType>,
    pub timeline_year: Option<i32>,
    pub timeline_start_pct: Option<f64>,
    pub timeline_end_pct: Option<f64>,
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
    pub show_missing: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            data_path: std::env::var("DATA_PATH").unwrap_or_else(|_| "data/leaderboard.json".to_string()),
            data_url: std::env::var("DATA_URL").ok().filter(|v| !v.is_empty()),
            ttl_days: std::env::var("DATA_TTL_DAYS").ok().and_then(|v| v.parse().ok()).unwrap_or(90),
            tab: InstructionType::from_key(&std::env::var("TAB").unwrap_or_default()),
            model: std::env::var("MODEL_FILTER").ok().filter(|v| !v.is_empty() && v != "all"),
            agent: std::env::var("AGENT_FILTER").ok().filter(|v| !v.is_empty() && v != "all"),
            model_type: std::env::var("MODEL_TYPE_FILTER").ok().and_then(|v| AccessType::from_key(&v)),
            agent_type: std::env::var("AGENT_TYPE_FILTER").ok().and_then(|v| AccessType::from_key(&v)),
            timeline_year: std::env::var("TIMELINE_YEAR").ok().and_then(|v| v.parse().ok()),
            timeline_start_pct: std::env::var("TIMELINE_START_PCT").ok().and_then(|v| v.parse().ok()),
            timeline_end_pct: std::env::var("TIMELINE_END_PCT").ok().and_then(|v| v.parse().ok()),
            sort_field: SortField::from_key(&std::env::var("SORT_FIELD").unwrap_or_default()),
            sort_direction: SortDirection::from_key(&std::env::var("SORT_DIR").unwrap_or_default()),
            show_missing: std::env::var("SHOW_MISSING")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }

    /// Slider positions take precedence over a year pick, mirroring the page:
    /// dragging the range control replaces the year selection.
    pub fn timeline(&self) -> Timeline {
        match (self.timeline_start_pct, self.timeline_end_pct, self.timeline_year) {
            (Some(start), Some(end), _) => Timeline::slider_range(start, end),
            (_, _, Some(year)) => Timeline::Year(year),
            _ => Timeline::All,
        }
    }

    pub fn view_state(&self) -> ViewState {
        ViewState {
            tab: self.tab,
            filters: FilterState {
                model: self.model.clone(),
                agent: self.agent.clone(),
                model_type: self.model_type,
                agent_type: self.agent_type,
                timeline: self.timeline(),
            },
            sort: SortState { field: self.sort_field, direction: self.sort_direction },
        }
    }
}
