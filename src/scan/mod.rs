// src/scan/mod.rs
pub mod chunk;
pub mod config;
pub mod fetch;
pub mod normalize;
pub mod types;

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{info, warn};

use crate::digest;
use crate::extract::client::DynChatModel;
use crate::extract::discover::{self, Discoverer};
use crate::extract::Extractor;
use crate::notify::DynNotifier;
use crate::rank;
use config::ScanConfig;
use fetch::{Fetcher, Sleeper, DEFAULT_MAX_RETRIES, PRIMARY_TIMEOUT, SECONDARY_TIMEOUT};
use types::{GrantRecord, RawContent, ScanSummary, Source};

/// Pause after each source, politeness toward the scraped portals.
const SOURCE_PAUSE: Duration = Duration::from_secs(2);
/// Pause between discovered-URL fetches within one source.
const SECONDARY_PAUSE: Duration = Duration::from_secs(1);

/// Drives one full scan cycle: fetch each active source, extract grants,
/// rank, render the digest, notify, and produce the run summary. Strictly
/// sequential; the only shared state is the accumulating record list owned
/// here.
pub struct Scanner {
    config: ScanConfig,
    fetcher: Fetcher,
    extractor: Extractor,
    discoverer: Discoverer,
    notifier: DynNotifier,
    sleeper: Arc<dyn Sleeper>,
}

impl Scanner {
    pub fn new(
        config: ScanConfig,
        model: DynChatModel,
        notifier: DynNotifier,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            fetcher: Fetcher::new(sleeper.clone()),
            extractor: Extractor::new(model.clone(), config.extraction),
            discoverer: Discoverer::new(model),
            config,
            notifier,
            sleeper,
        }
    }

    /// A single source's total failure never aborts the cycle; a summary is
    /// always produced, even when every source fails.
    pub async fn run(&self) -> ScanSummary {
        let started = Instant::now();
        info!(sources = self.config.sources.len(), "starting grants scan");

        let keywords = self.config.keyword_line();
        let total_sources = self.config.sources.iter().filter(|s| s.active).count();
        let mut grants: Vec<GrantRecord> = Vec::new();
        let mut sources_processed = 0usize;

        for source in &self.config.sources {
            if !source.active {
                info!(source = %source.name, "skipping inactive source");
                continue;
            }
            if let Some(batch) = self.process_source(source, &keywords).await {
                sources_processed += 1;
                if batch.is_empty() {
                    info!(source = %source.name, "no relevant grants found");
                } else {
                    info!(source = %source.name, count = batch.len(), "grants found");
                }
                grants.extend(batch);
            }
            self.sleeper.sleep(SOURCE_PAUSE).await;
        }

        rank::rank(&mut grants);

        let notification_sent = self.notify(&grants).await;

        let scan_duration_seconds =
            (started.elapsed().as_secs_f64() * 100.0).round() / 100.0;
        info!(
            sources_processed,
            grants_found = grants.len(),
            scan_duration_seconds,
            notification_sent,
            "scan complete"
        );

        ScanSummary {
            timestamp: Utc::now().to_rfc3339(),
            sources_processed,
            total_sources,
            grants_found: grants.len(),
            scan_duration_seconds,
            notification_sent,
            top_grants: grants.iter().take(5).cloned().collect(),
        }
    }

    /// Fetch, normalize, discover, and extract a single source. `None` means
    /// the source yielded no usable content and does not count as processed.
    async fn process_source(&self, source: &Source, keywords: &str) -> Option<Vec<GrantRecord>> {
        info!(source = %source.name, url = %source.url, "scanning source");

        let html = match self
            .fetcher
            .fetch(&source.url, PRIMARY_TIMEOUT, DEFAULT_MAX_RETRIES)
            .await
        {
            Ok(html) => html,
            Err(e) => {
                warn!(source = %source.name, error = ?e, "fetch failed, skipping source");
                return None;
            }
        };

        let raw = RawContent {
            source_name: source.name.clone(),
            text: normalize::normalize(&html),
            fetched_at: Utc::now(),
        };
        if raw.text.is_empty() {
            warn!(source = %source.name, "no text content after normalization");
            return None;
        }
        info!(source = %source.name, chars = raw.text.len(), "page normalized");

        let specific_urls = if discover::wants_discovery(source) {
            self.discoverer.discover_urls(source, &raw.text).await
        } else {
            Vec::new()
        };

        let mut grants = self.extractor.extract(&raw.text, &raw.source_name, keywords).await;

        for url in &specific_urls {
            grants.extend(self.process_secondary(source, url, keywords).await);
            self.sleeper.sleep(SECONDARY_PAUSE).await;
        }

        let discovered_at = Utc::now().to_rfc3339();
        for g in &mut grants {
            g.source = source.name.clone();
            g.source_url = source.url.clone();
            g.discovered_at = discovered_at.clone();
        }
        Some(grants)
    }

    async fn process_secondary(
        &self,
        source: &Source,
        url: &str,
        keywords: &str,
    ) -> Vec<GrantRecord> {
        info!(source = %source.name, url, "analyzing discovered url");

        let html = match self
            .fetcher
            .fetch(url, SECONDARY_TIMEOUT, DEFAULT_MAX_RETRIES)
            .await
        {
            Ok(html) => html,
            Err(e) => {
                warn!(url, error = ?e, "discovered url fetch failed, skipping");
                return Vec::new();
            }
        };

        let text = normalize::normalize(&html);
        if text.is_empty() {
            return Vec::new();
        }

        let label = format!("{} - Specific Page", source.name);
        let mut grants = self.extractor.extract(&text, &label, keywords).await;
        for g in &mut grants {
            g.specific_url = Some(url.to_string());
        }
        grants
    }

    /// Zero grants: nothing to post, counted as sent (matches the summary
    /// semantics of a quiet week). Otherwise failures are logged and recorded.
    async fn notify(&self, grants: &[GrantRecord]) -> bool {
        if grants.is_empty() {
            info!("no grants found, skipping notification");
            return true;
        }

        let message = digest::format(grants, Utc::now().date_naive());
        match self.notifier.send(&message).await {
            Ok(()) => {
                info!(
                    sink = self.notifier.name(),
                    grants = grants.len(),
                    "notification sent"
                );
                true
            }
            Err(e) => {
                warn!(sink = self.notifier.name(), error = ?e, "notification failed");
                false
            }
        }
    }
}
