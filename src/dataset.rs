//! Dataset model, normalization, and quality reporting.
//!
//! Two wire shapes are accepted: the current tabbed leaderboard
//! (`results.cve_description` / `results.user_report` keyed by CVE id) and the
//! legacy flat model table (`models` with 0-100 task scores). Both normalize
//! into one canonical [`Dataset`] at load time so the engine only ever sees a
//! single record shape.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::format::ScoreScale;

pub const TAB_CVE_DESCRIPTION: &str = "cve_description";
pub const TAB_USER_REPORT: &str = "user_report";

/// Task columns of the legacy flat shape, promoted to pseudo catalog entries.
pub const LEGACY_TASKS: [&str; 3] = ["detection", "localization", "patching"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessType {
    Open,
    Closed,
}

impl AccessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessType::Open => "open",
            AccessType::Closed => "closed",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "open" => Some(AccessType::Open),
            "closed" => Some(AccessType::Closed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InstructionType {
    CveDescription,
    UserReport,
}

impl InstructionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstructionType::CveDescription => TAB_CVE_DESCRIPTION,
            InstructionType::UserReport => TAB_USER_REPORT,
        }
    }

    /// Unknown keys fall back to the default tab.
    pub fn from_key(key: &str) -> Self {
        match key {
            TAB_USER_REPORT => InstructionType::UserReport,
            _ => InstructionType::CveDescription,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cve {
    pub id: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CveOutcome {
    pub success: bool,
    /// Unit-interval contribution to accuracy: 1.0/0.0 for pass-fail results,
    /// normalized task score for legacy datasets.
    pub score: f64,
    pub turns: f64,
    pub tokens: f64,
}

impl CveOutcome {
    pub fn pass_fail(success: bool, turns: f64, tokens: f64) -> Self {
        Self {
            success,
            score: if success { 1.0 } else { 0.0 },
            turns,
            tokens,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Record {
    pub model: String,
    pub agent: String,
    pub model_type: AccessType,
    pub agent_type: AccessType,
    pub cve_results: BTreeMap<String, CveOutcome>,
}

#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub last_updated: String,
    pub version: Option<String>,
    pub total_cves: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub metadata: Metadata,
    /// Catalog order is the enumeration order for missing-CVE reporting.
    pub cves: Vec<Cve>,
    pub results: BTreeMap<InstructionType, Vec<Record>>,
    pub scale: ScoreScale,
}

impl Dataset {
    pub fn records(&self, tab: InstructionType) -> &[Record] {
        self.results.get(&tab).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn record_count(&self) -> usize {
        self.results.values().map(|v| v.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawMetadata {
    #[serde(rename = "lastUpdated")]
    last_updated: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(rename = "totalCVEs", default)]
    total_cves: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawCve {
    id: String,
    date: String,
}

#[derive(Debug, Deserialize)]
struct RawOutcome {
    success: bool,
    turns: f64,
    tokens: f64,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    model: String,
    agent: String,
    #[serde(rename = "modelType")]
    model_type: AccessType,
    #[serde(rename = "agentType")]
    agent_type: AccessType,
    cve_results: BTreeMap<String, RawOutcome>,
}

#[derive(Debug, Deserialize, Default)]
struct RawTabbedResults {
    #[serde(default)]
    cve_description: Vec<RawRecord>,
    #[serde(default)]
    user_report: Vec<RawRecord>,
}

#[derive(Debug, Deserialize)]
struct RawTabbed {
    metadata: RawMetadata,
    cves: Vec<RawCve>,
    results: RawTabbedResults,
}

#[derive(Debug, Deserialize)]
struct RawScores {
    detection: f64,
    localization: f64,
    patching: f64,
}

#[derive(Debug, Deserialize)]
struct RawModelRow {
    name: String,
    org: String,
    #[serde(rename = "type")]
    access: AccessType,
    scores: RawScores,
}

#[derive(Debug, Deserialize)]
struct RawFlat {
    metadata: RawMetadata,
    models: Vec<RawModelRow>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDataset {
    Tabbed(RawTabbed),
    Flat(RawFlat),
}

// ---------------------------------------------------------------------------
// Parsing & normalization
// ---------------------------------------------------------------------------

pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("bad date {:?}: {}", s, e))
}

pub fn parse_dataset(body: &str) -> Result<Dataset, String> {
    let raw: RawDataset = serde_json::from_str(body)
        .map_err(|e| format!("unrecognized dataset shape: {}", e))?;
    match raw {
        RawDataset::Tabbed(t) => normalize_tabbed(t),
        RawDataset::Flat(f) => normalize_flat(f),
    }
}

fn normalize_metadata(raw: RawMetadata) -> Metadata {
    Metadata {
        last_updated: raw.last_updated,
        version: raw.version,
        total_cves: raw.total_cves,
    }
}

fn normalize_record(raw: RawRecord) -> Record {
    let cve_results = raw
        .cve_results
        .into_iter()
        .map(|(id, o)| (id, CveOutcome::pass_fail(o.success, o.turns, o.tokens)))
        .collect();
    Record {
        model: raw.model,
        agent: raw.agent,
        model_type: raw.model_type,
        agent_type: raw.agent_type,
        cve_results,
    }
}

fn normalize_tabbed(raw: RawTabbed) -> Result<Dataset, String> {
    let mut cves = Vec::with_capacity(raw.cves.len());
    for c in raw.cves {
        let date = parse_date(&c.date).map_err(|e| format!("cve {}: {}", c.id, e))?;
        cves.push(Cve { id: c.id, date });
    }

    let mut results = BTreeMap::new();
    results.insert(
        InstructionType::CveDescription,
        raw.results.cve_description.into_iter().map(normalize_record).collect(),
    );
    results.insert(
        InstructionType::UserReport,
        raw.results.user_report.into_iter().map(normalize_record).collect(),
    );

    Ok(Dataset {
        metadata: normalize_metadata(raw.metadata),
        cves,
        results,
        scale: ScoreScale::Unit,
    })
}

fn normalize_flat(raw: RawFlat) -> Result<Dataset, String> {
    // Legacy rows have no per-CVE data; each task column becomes a pseudo
    // catalog entry dated the snapshot day so the timeline stays inert.
    let date = parse_date(&raw.metadata.last_updated).unwrap_or_default();
    let cves = LEGACY_TASKS
        .iter()
        .map(|task| Cve { id: (*task).to_string(), date })
        .collect();

    let mut records = Vec::with_capacity(raw.models.len());
    for row in raw.models {
        let mut cve_results = BTreeMap::new();
        for (task, value) in [
            ("detection", row.scores.detection),
            ("localization", row.scores.localization),
            ("patching", row.scores.patching),
        ] {
            cve_results.insert(
                task.to_string(),
                CveOutcome {
                    success: value >= 50.0,
                    score: (value / 100.0).clamp(0.0, 1.0),
                    turns: 0.0,
                    tokens: 0.0,
                },
            );
        }
        records.push(Record {
            model: row.name,
            agent: row.org,
            model_type: row.access,
            agent_type: row.access,
            cve_results,
        });
    }

    let mut results = BTreeMap::new();
    results.insert(InstructionType::CveDescription, records);
    results.insert(InstructionType::UserReport, Vec::new());

    Ok(Dataset {
        metadata: normalize_metadata(raw.metadata),
        cves,
        results,
        scale: ScoreScale::Percent,
    })
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

pub fn load_file(path: &Path) -> Result<Dataset, String> {
    let body = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    parse_dataset(&body)
}

pub async fn fetch_dataset(url: &str) -> anyhow::Result<Dataset> {
    let body = reqwest::get(url).await?.error_for_status()?.text().await?;
    parse_dataset(&body).map_err(anyhow::Error::msg)
}

// ---------------------------------------------------------------------------
// Manifest & quality report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetManifest {
    pub path: String,
    pub hash_sha256: String,
    pub cve_count: u64,
    pub record_counts: BTreeMap<String, u64>,
    pub duplicate_cve_ids: Vec<String>,
    pub unknown_cve_refs: u64,
    pub empty_records: u64,
    pub warnings: Vec<String>,
    pub ttl_days: i64,
    pub stale: bool,
    pub generated_on: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataQualityReport {
    pub records: u64,
    pub cves: u64,
    pub duplicate_cve_ids: Vec<String>,
    pub unknown_cve_refs: u64,
    pub empty_records: u64,
    pub stale: bool,
    pub warnings: Vec<String>,
}

/// Pure consistency checks over a normalized dataset. `today` is injected so
/// staleness is testable.
pub fn quality_report(dataset: &Dataset, ttl_days: i64, today: NaiveDate) -> DataQualityReport {
    let mut warnings = Vec::new();

    let mut seen = BTreeSet::new();
    let mut duplicates = Vec::new();
    for cve in &dataset.cves {
        if !seen.insert(cve.id.as_str()) {
            duplicates.push(cve.id.clone());
            warnings.push(format!("duplicate_cve_id: {}", cve.id));
        }
    }

    let mut unknown_refs = 0u64;
    let mut empty_records = 0u64;
    for (tab, records) in &dataset.results {
        for record in records {
            if record.cve_results.is_empty() {
                empty_records += 1;
                warnings.push(format!(
                    "empty_record: {} + {} in {}",
                    record.model,
                    record.agent,
                    tab.as_str()
                ));
            }
            for id in record.cve_results.keys() {
                if !seen.contains(id.as_str()) {
                    unknown_refs += 1;
                    warnings.push(format!(
                        "unknown_cve_ref: {} in {} + {}",
                        id, record.model, record.agent
                    ));
                }
            }
        }
    }

    let stale = match parse_date(&dataset.metadata.last_updated) {
        Ok(updated) => (today - updated).num_days() > ttl_days,
        Err(err) => {
            warnings.push(format!("bad_last_updated: {}", err));
            true
        }
    };

    DataQualityReport {
        records: dataset.record_count() as u64,
        cves: dataset.cves.len() as u64,
        duplicate_cve_ids: duplicates,
        unknown_cve_refs: unknown_refs,
        empty_records,
        stale,
        warnings,
    }
}

/// Manifest for a file-backed dataset: quality report plus a content hash for
/// change detection.
pub fn build_manifest(
    path: &Path,
    dataset: &Dataset,
    ttl_days: i64,
    today: NaiveDate,
) -> Result<DatasetManifest, String> {
    let hash = file_sha256(path)?;
    let report = quality_report(dataset, ttl_days, today);
    let record_counts = dataset
        .results
        .iter()
        .map(|(tab, records)| (tab.as_str().to_string(), records.len() as u64))
        .collect();
    Ok(DatasetManifest {
        path: path.display().to_string(),
        hash_sha256: hash,
        cve_count: report.cves,
        record_counts,
        duplicate_cve_ids: report.duplicate_cve_ids,
        unknown_cve_refs: report.unknown_cve_refs,
        empty_records: report.empty_records,
        warnings: report.warnings,
        ttl_days,
        stale: report.stale,
        generated_on: today.format("%Y-%m-%d").to_string(),
    })
}

pub fn file_sha256(path: &Path) -> Result<String, String> {
    let mut file = File::open(path).map_err(|e| e.to_string())?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf).map_err(|e| e.to_string())?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// CVE ids carry their publication year: `CVE-2024-12345` → 2024.
pub fn cve_id_year(id: &str) -> Option<i32> {
    id.split('-').nth(1).and_then(|y| y.parse().ok())
}
