//! LiveCVE leaderboard engine: loads a JSON benchmark dataset and computes
//! filtered, aggregated, ranked, and sorted leaderboard rows, plus the
//! submission pipeline that produces the dataset in the first place.

pub mod dataset;
pub mod engine;
pub mod filter;
pub mod format;
pub mod logging;
pub mod rank;
pub mod render;
pub mod sort;
pub mod state;
pub mod stats;
pub mod submission;
