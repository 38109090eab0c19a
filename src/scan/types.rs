// src/scan/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel the extraction prompt tells the model to use for unknown fields.
pub const NOT_SPECIFIED: &str = "Not specified";

/// A configured funding-opportunities page. Loaded once, read-only for the
/// whole scan.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub url: String,
    pub category: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Normalized page text, alive between fetch and extraction.
#[derive(Debug)]
pub struct RawContent {
    pub source_name: String,
    pub text: String,
    pub fetched_at: DateTime<Utc>,
}

/// One candidate funding opportunity as extracted from a page. Provenance
/// fields (`source`, `source_url`, `discovered_at`, `specific_url`) are
/// attached by the scanner after extraction; nothing is mutated afterwards.
/// Duplicates across chunks or sources are accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GrantRecord {
    pub title: String,
    pub organization: String,
    pub amount: String,
    /// ISO date or the `Not specified` sentinel.
    pub deadline: String,
    /// ISO date or the `Not specified` sentinel.
    pub published_date: String,
    pub description: String,
    pub eligibility: String,
    pub url: String,
    /// 1-10, self-assessed by the model. Absent when the model omitted it.
    pub relevance_score: Option<u8>,
    pub country: String,
    pub language: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub discovered_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specific_url: Option<String>,
}

/// Terminal output of one scan cycle.
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    pub timestamp: String,
    pub sources_processed: usize,
    pub total_sources: usize,
    pub grants_found: usize,
    pub scan_duration_seconds: f64,
    pub notification_sent: bool,
    /// First 5 ranked records, for the run-summary artifact.
    pub top_grants: Vec<GrantRecord>,
}
