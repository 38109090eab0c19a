// src/scan/config.rs
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::scan::types::Source;

const ENV_PATH: &str = "GRANTS_CONFIG_PATH";
const DEFAULT_PATH: &str = "config/sources.toml";

/// Static scan configuration: the source list, the keyword list steering the
/// extraction prompt, and chunking settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    pub sources: Vec<Source>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub extraction: ExtractionSettings,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    /// Chunk size in bytes, snapped to char boundaries when splitting.
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// At most this many chunks per document are analyzed.
    pub max_chunks: usize,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            chunk_size: 4000,
            chunk_overlap: 200,
            max_chunks: 5,
        }
    }
}

impl ScanConfig {
    /// Load from $GRANTS_CONFIG_PATH, falling back to `config/sources.toml`.
    pub fn load_default() -> Result<Self> {
        let path = std::env::var(ENV_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_PATH));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading scan config from {}", path.display()))?;
        let cfg: ScanConfig = toml::from_str(&content)
            .with_context(|| format!("parsing scan config from {}", path.display()))?;
        Ok(cfg)
    }

    /// Comma-joined keyword list, interpolated into the extraction prompt.
    pub fn keyword_line(&self) -> String {
        self.keywords.join(", ")
    }
}
