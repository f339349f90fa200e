//! Both wire shapes must normalize into the canonical dataset and drive the
//! engine identically.

use livecve_leaderboard::dataset::{parse_dataset, InstructionType};
use livecve_leaderboard::engine::{compute_display_rows, ViewState};
use livecve_leaderboard::format::{score_band, ScoreBand, ScoreScale};

const TABBED: &str = r#"{
    "metadata": {"lastUpdated": "2025-08-01"},
    "cves": [
        {"id": "CVE-2025-0001", "date": "2025-01-10"},
        {"id": "CVE-2025-0002", "date": "2025-02-20"}
    ],
    "results": {
        "cve_description": [
            {"model": "GPT-4o", "agent": "OpenHands",
             "modelType": "closed", "agentType": "open",
             "cve_results": {
                "CVE-2025-0001": {"success": true, "turns": 10, "tokens": 1000},
                "CVE-2025-0002": {"success": true, "turns": 12, "tokens": 1400}
             }}
        ],
        "user_report": []
    }
}"#;

const FLAT: &str = r#"{
    "metadata": {"lastUpdated": "2024-03-15", "totalCVEs": 30},
    "models": [
        {"name": "GPT-4", "org": "OpenAI", "type": "closed",
         "scores": {"detection": 78.5, "localization": 62.2, "patching": 34.7}},
        {"name": "Llama-3-70B", "org": "Meta", "type": "open",
         "scores": {"detection": 65.0, "localization": 48.9, "patching": 21.3}}
    ]
}"#;

#[test]
fn tabbed_shape_round_trip() {
    let ds = parse_dataset(TABBED).unwrap();
    assert_eq!(ds.scale, ScoreScale::Unit);
    let rows = compute_display_rows(&ds, &ViewState::default());
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].accuracy, 1.0);
    assert_eq!(rows[0].total_cves, 2);
    assert_eq!(score_band(rows[0].accuracy, ds.scale), ScoreBand::High);
}

#[test]
fn flat_shape_drives_the_same_engine() {
    let ds = parse_dataset(FLAT).unwrap();
    assert_eq!(ds.scale, ScoreScale::Percent);
    assert_eq!(ds.cves.len(), 3);
    assert!(ds.records(InstructionType::UserReport).is_empty());

    let rows = compute_display_rows(&ds, &ViewState::default());
    assert_eq!(rows.len(), 2);

    // Default sort is accuracy descending; GPT-4's mean normalized score
    // (78.5+62.2+34.7)/300 beats Llama's.
    assert_eq!(rows[0].model, "GPT-4");
    assert_eq!(rows[0].agent, "OpenAI");
    let expected = (78.5 + 62.2 + 34.7) / 300.0;
    assert!((rows[0].accuracy - expected).abs() < 1e-9);
    assert_eq!(rows[0].original_rank, 1);
    assert_eq!(rows[1].original_rank, 2);

    // Legacy banding: Llama's 45.1 mean is low on the old 70/50 scale but
    // would be medium on the unit 0.70/0.40 scale. The dataset's own scale
    // must be used.
    assert_eq!(score_band(rows[0].accuracy, ds.scale), ScoreBand::Medium);
    assert_eq!(score_band(rows[1].accuracy, ds.scale), ScoreBand::Low);
    assert_eq!(score_band(rows[1].accuracy, ScoreScale::Unit), ScoreBand::Medium);
}

#[test]
fn flat_rows_have_no_turn_or_token_data() {
    let ds = parse_dataset(FLAT).unwrap();
    let rows = compute_display_rows(&ds, &ViewState::default());
    for row in &rows {
        assert_eq!(row.success.turns, 0.0);
        assert_eq!(row.success.tokens, 0.0);
        assert!(row.missing_cves.is_empty());
    }
}
