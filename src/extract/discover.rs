// src/extract/discover.rs
use serde_json::Value;
use tracing::{info, warn};
use url::Url;

use super::client::DynChatModel;
use super::strip_code_fences;
use crate::scan::types::Source;

/// Aggregator pages worth a secondary discovery pass, matched on source name.
const DISCOVERY_SOURCES: &[&str] = &["bpifrance", "anr", "france relance"];

/// Discovered URLs must land on one of these domains.
const TRUSTED_DOMAINS: &[&str] = &["bpifrance", "anr.fr", "economie.gouv", "boamp.fr"];

const MAX_URLS: usize = 5;
const DISCOVERY_INPUT_CHARS: usize = 3000;

pub fn wants_discovery(source: &Source) -> bool {
    let name = source.name.to_lowercase();
    DISCOVERY_SOURCES.iter().any(|k| name.contains(k))
}

/// Finds individual grant-detail URLs on listing pages via one model call.
pub struct Discoverer {
    model: DynChatModel,
}

impl Discoverer {
    pub fn new(model: DynChatModel) -> Self {
        Self { model }
    }

    /// Failures degrade to an empty list; the main-page extraction still runs.
    pub async fn discover_urls(&self, source: &Source, page_text: &str) -> Vec<String> {
        let head = truncate_chars(page_text, DISCOVERY_INPUT_CHARS);
        let prompt = build_discovery_prompt(&source.name, &source.url, head);
        let raw = match self.model.complete(&prompt).await {
            Ok(r) => r,
            Err(e) => {
                warn!(source = %source.name, error = ?e, "url discovery failed");
                return Vec::new();
            }
        };
        let urls = parse_urls(&raw, &source.url);
        info!(source = %source.name, count = urls.len(), "discovered grant urls");
        urls
    }
}

fn build_discovery_prompt(source_name: &str, source_url: &str, content: &str) -> String {
    format!(
        r#"You are an expert at finding specific grant and funding opportunity URLs.

From the following webpage content from "{source_name}", extract all specific URLs that lead to individual grants, calls for proposals, or funding opportunities.

Focus on URLs that are likely to contain grants related to:
- Healthcare technology and AI
- Digital innovation and automation
- Startup and SME funding
- Research and development
- Administrative technology

Look for patterns like:
- "appel à projets"
- "concours"
- "financement"
- "subvention"
- Individual grant program names
- Specific deadline dates

Return ONLY a JSON array of URLs. Each URL should be complete and valid.
If you find relative URLs, convert them to absolute URLs using the base: {source_url}

Example format: ["https://example.com/grant1", "https://example.com/grant2"]

Content to analyze:
{content}

JSON Response:
"#
    )
}

/// Parse and validate a model response: absolute http(s) URLs on trusted
/// domains only, relative entries joined against the source URL, capped at 5.
pub fn parse_urls(raw: &str, base_url: &str) -> Vec<String> {
    let value: Value = match serde_json::from_str(strip_code_fences(raw)) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "discovery response is not valid JSON");
            return Vec::new();
        }
    };
    let Value::Array(items) = value else {
        return Vec::new();
    };

    let base = Url::parse(base_url).ok();
    let mut out = Vec::new();
    for item in &items {
        let Some(s) = item.as_str() else { continue };
        let Some(absolute) = resolve(s.trim(), base.as_ref()) else {
            continue;
        };
        if is_trusted(&absolute) {
            out.push(absolute);
        }
        if out.len() == MAX_URLS {
            break;
        }
    }
    out
}

fn resolve(s: &str, base: Option<&Url>) -> Option<String> {
    if s.starts_with("http") {
        return Some(s.to_string());
    }
    base?.join(s).ok().map(|u| u.to_string())
}

fn is_trusted(url: &str) -> bool {
    url.starts_with("http") && TRUSTED_DOMAINS.iter().any(|d| url.contains(d))
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}
