// src/extract/mod.rs
pub mod client;
pub mod discover;

use serde_json::Value;
use tracing::{debug, warn};

use crate::scan::chunk;
use crate::scan::config::ExtractionSettings;
use crate::scan::types::{GrantRecord, NOT_SPECIFIED};
use client::DynChatModel;

/// Records scoring below this never reach aggregation. The prompt asks the
/// model to apply the same rule, but model compliance is best-effort, so the
/// coercion boundary re-applies it.
pub const RELEVANCE_THRESHOLD: u8 = 6;

/// Titles the model emits when a page defeated it.
const JUNK_TITLES: &[&str] = &["unable to extract", "page not found", "error loading"];

/// LLM-driven extraction of structured grant records from normalized page
/// text. Model and parse failures degrade to zero records per chunk.
pub struct Extractor {
    model: DynChatModel,
    settings: ExtractionSettings,
}

impl Extractor {
    pub fn new(model: DynChatModel, settings: ExtractionSettings) -> Self {
        Self { model, settings }
    }

    /// One model call per chunk, at most `max_chunks` chunks per document.
    /// Content past the last analyzed chunk is silently not analyzed.
    pub async fn extract(
        &self,
        text: &str,
        source_name: &str,
        keywords: &str,
    ) -> Vec<GrantRecord> {
        let mut grants = Vec::new();
        let chunks =
            chunk::split(text, self.settings.chunk_size, self.settings.chunk_overlap)
                .take(self.settings.max_chunks);
        for (i, piece) in chunks.enumerate() {
            let prompt = build_extraction_prompt(piece, source_name, keywords);
            match self.model.complete(&prompt).await {
                Ok(raw) => {
                    let parsed = parse_grants(&raw);
                    debug!(
                        source = source_name,
                        chunk = i + 1,
                        count = parsed.len(),
                        "chunk analyzed"
                    );
                    grants.extend(parsed);
                }
                Err(e) => {
                    warn!(
                        source = source_name,
                        chunk = i + 1,
                        error = ?e,
                        "model call failed, skipping chunk"
                    );
                }
            }
        }
        grants
    }
}

fn build_extraction_prompt(text: &str, source_name: &str, keywords: &str) -> String {
    format!(
        r#"You are an expert grant analyst who speaks multiple languages (English, French, German, etc.).

Extract funding opportunities from the following text from "{source_name}".

Focus on grants that match these keywords: {keywords}

For EACH grant found, return a JSON object with these fields:
- "title": Grant name/title (translate to English if needed)
- "organization": Funding organization or agency
- "amount": Funding amount as number + currency (extract specific amounts like "€2M", "$500K", or "Not specified")
- "deadline": Application deadline in YYYY-MM-DD format if possible (or "Not specified")
- "published_date": Date when this grant was published/announced in YYYY-MM-DD format (look for "publié le", "published on", "date de publication", etc.)
- "description": Brief description (2-3 sentences max, translate to English if needed)
- "eligibility": Who can apply (companies, universities, individuals, etc.)
- "url": Any specific URL mentioned for this grant
- "relevance_score": Rate 1-10 how relevant this is for tech/innovation/research projects
- "country": Country/region this grant is for
- "language": Original language of the grant announcement

IMPORTANT EXTRACTION RULES:
1. Look for keywords like: "funding", "grant", "call for proposals", "appel à projets", "financement", "subvention", "concours", "bourse"
2. Extract specific monetary amounts when mentioned
3. Look for dates and deadlines carefully
4. Only include grants with relevance_score >= 6
5. If text is in French/other languages, translate key info to English but note original language
6. Look for innovation, technology, research, startup, SME funding specifically

Return ONLY a valid JSON array. If no relevant grants found, return: []

Text to analyze:
{text}

JSON Response:
"#
    )
}

/// Strip a Markdown code-fence wrapper if present.
pub fn strip_code_fences(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Parse a model response into grant records. Anything that is not a JSON
/// array coerces to zero records.
pub fn parse_grants(raw: &str) -> Vec<GrantRecord> {
    let value: Value = match serde_json::from_str(strip_code_fences(raw)) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "model response is not valid JSON");
            return Vec::new();
        }
    };
    let Value::Array(items) = value else {
        return Vec::new();
    };
    items.iter().filter_map(coerce_grant).collect()
}

/// Single boundary turning an untyped model object into a `GrantRecord`.
/// Fields are coerced best-effort; objects without a usable title and records
/// scoring below `RELEVANCE_THRESHOLD` are dropped here.
fn coerce_grant(value: &Value) -> Option<GrantRecord> {
    let obj = value.as_object()?;

    let title = str_field(obj, "title")?;
    let lower = title.to_lowercase();
    if JUNK_TITLES.iter().any(|junk| lower.contains(junk)) {
        warn!(title = %title, "dropping junk extraction result");
        return None;
    }

    let relevance_score = coerce_score(obj.get("relevance_score"));
    if matches!(relevance_score, Some(s) if s < RELEVANCE_THRESHOLD) {
        return None;
    }

    Some(GrantRecord {
        title,
        organization: str_field_or(obj, "organization", NOT_SPECIFIED),
        amount: str_field_or(obj, "amount", NOT_SPECIFIED),
        deadline: str_field_or(obj, "deadline", NOT_SPECIFIED),
        published_date: str_field_or(obj, "published_date", NOT_SPECIFIED),
        description: str_field_or(obj, "description", "No description"),
        eligibility: str_field_or(obj, "eligibility", NOT_SPECIFIED),
        url: str_field(obj, "url").unwrap_or_default(),
        relevance_score,
        country: str_field_or(obj, "country", NOT_SPECIFIED),
        language: str_field_or(obj, "language", NOT_SPECIFIED),
        source: String::new(),
        source_url: String::new(),
        discovered_at: String::new(),
        specific_url: None,
    })
}

fn str_field(obj: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    let s = obj.get(key)?.as_str()?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn str_field_or(obj: &serde_json::Map<String, Value>, key: &str, default: &str) -> String {
    str_field(obj, key).unwrap_or_else(|| default.to_string())
}

/// Accepts integers, floats, and numeric strings; clamps into 1-10.
fn coerce_score(value: Option<&Value>) -> Option<u8> {
    let v = value?;
    let n = if let Some(i) = v.as_i64() {
        i as f64
    } else if let Some(f) = v.as_f64() {
        f
    } else {
        v.as_str()?.trim().parse::<f64>().ok()?
    };
    Some((n.round().clamp(1.0, 10.0)) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fence_variants_are_stripped() {
        assert_eq!(strip_code_fences("```json\n[]\n```"), "[]");
        assert_eq!(strip_code_fences("```\n[]\n```"), "[]");
        assert_eq!(strip_code_fences("  [] "), "[]");
    }

    #[test]
    fn non_array_coerces_to_empty() {
        assert!(parse_grants(r#"{"title": "not a list"}"#).is_empty());
        assert!(parse_grants("no json here at all").is_empty());
        assert!(parse_grants("[]").is_empty());
    }

    #[test]
    fn full_object_is_coerced() {
        let raw = json!([{
            "title": "SBIR Phase I",
            "organization": "NSF",
            "amount": "$500K",
            "deadline": "2026-03-15",
            "published_date": "2026-08-01",
            "description": "Early-stage funding for small businesses.",
            "eligibility": "Small businesses under 500 employees",
            "url": "https://www.nsf.gov/sbir",
            "relevance_score": 8,
            "country": "USA",
            "language": "English"
        }])
        .to_string();
        let grants = parse_grants(&raw);
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].title, "SBIR Phase I");
        assert_eq!(grants[0].relevance_score, Some(8));
        assert_eq!(grants[0].url, "https://www.nsf.gov/sbir");
    }

    #[test]
    fn score_coercion_accepts_strings_and_floats() {
        let raw = json!([
            {"title": "A", "relevance_score": "7"},
            {"title": "B", "relevance_score": 9.4},
            {"title": "C", "relevance_score": 25}
        ])
        .to_string();
        let grants = parse_grants(&raw);
        assert_eq!(grants[0].relevance_score, Some(7));
        assert_eq!(grants[1].relevance_score, Some(9));
        assert_eq!(grants[2].relevance_score, Some(10), "clamped into 1-10");
    }

    #[test]
    fn low_score_records_are_dropped_at_the_boundary() {
        let raw = json!([
            {"title": "Relevant", "relevance_score": 6},
            {"title": "Noise", "relevance_score": 3}
        ])
        .to_string();
        let grants = parse_grants(&raw);
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].title, "Relevant");
    }

    #[test]
    fn missing_score_passes_through() {
        let grants = parse_grants(&json!([{"title": "No score given"}]).to_string());
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].relevance_score, None);
        assert_eq!(grants[0].amount, NOT_SPECIFIED);
        assert_eq!(grants[0].description, "No description");
    }

    #[test]
    fn junk_and_untitled_objects_are_dropped() {
        let raw = json!([
            {"title": "Unable to extract content", "relevance_score": 8},
            {"organization": "No title here"},
            {"title": "   "},
            {"title": 42}
        ])
        .to_string();
        assert!(parse_grants(&raw).is_empty());
    }
}
