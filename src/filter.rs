//! Filter pipeline: timeline selection and row-level predicate filters.
//!
//! Pure functions of (records, catalog, filter state); the dataset is never
//! mutated.

use chrono::{Datelike, Duration, NaiveDate};

use crate::dataset::{AccessType, Cve, Record};

/// The calendar year the range sliders span.
pub const SLIDER_YEAR: i32 = 2025;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeline {
    All,
    Year(i32),
    Range { start: NaiveDate, end: NaiveDate },
}

impl Timeline {
    pub fn contains(&self, date: NaiveDate) -> bool {
        match self {
            Timeline::All => true,
            Timeline::Year(year) => date.year() == *year,
            Timeline::Range { start, end } => *start <= date && date <= *end,
        }
    }

    /// Map two 0-100 slider positions onto the slider year, inclusive on both
    /// ends. Positions arrive in either order.
    pub fn slider_range(start_pct: f64, end_pct: f64) -> Timeline {
        let a = slider_day(start_pct);
        let b = slider_day(end_pct);
        if a <= b {
            Timeline::Range { start: a, end: b }
        } else {
            Timeline::Range { start: b, end: a }
        }
    }

    pub fn label(&self) -> String {
        match self {
            Timeline::All => "all time".to_string(),
            Timeline::Year(year) => year.to_string(),
            Timeline::Range { start, end } => format!("{} to {}", start, end),
        }
    }
}

fn slider_day(pct: f64) -> NaiveDate {
    let clamped = if pct.is_finite() { pct.clamp(0.0, 100.0) } else { 0.0 };
    let offset = (clamped / 100.0 * 364.0).round() as i64;
    NaiveDate::from_ymd_opt(SLIDER_YEAR, 1, 1).unwrap_or_default() + Duration::days(offset)
}

#[derive(Debug, Clone)]
pub struct FilterState {
    pub model: Option<String>,
    pub agent: Option<String>,
    pub model_type: Option<AccessType>,
    pub agent_type: Option<AccessType>,
    pub timeline: Timeline,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            model: None,
            agent: None,
            model_type: None,
            agent_type: None,
            timeline: Timeline::All,
        }
    }
}

/// The CVEs currently selected by the timeline, in catalog order.
pub fn active_cves<'a>(catalog: &'a [Cve], timeline: &Timeline) -> Vec<&'a Cve> {
    catalog.iter().filter(|c| timeline.contains(c.date)).collect()
}

/// Records surviving the field filters. A record must also have tested at
/// least one CVE in the active subset; one with zero overlap is dropped
/// outright rather than shown with empty stats.
pub fn candidate_records<'a>(
    records: &'a [Record],
    active: &[&Cve],
    filters: &FilterState,
) -> Vec<&'a Record> {
    records
        .iter()
        .filter(|r| {
            if let Some(model) = &filters.model {
                if &r.model != model {
                    return false;
                }
            }
            if let Some(agent) = &filters.agent {
                if &r.agent != agent {
                    return false;
                }
            }
            if let Some(mt) = filters.model_type {
                if r.model_type != mt {
                    return false;
                }
            }
            if let Some(at) = filters.agent_type {
                if r.agent_type != at {
                    return false;
                }
            }
            active.iter().any(|c| r.cve_results.contains_key(&c.id))
        })
        .collect()
}
