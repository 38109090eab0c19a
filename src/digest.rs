// src/digest.rs
use chrono::NaiveDate;

use crate::rank::split_recent;
use crate::scan::types::{GrantRecord, NOT_SPECIFIED};

/// Hard cap on the rendered message, enforced as the final step.
pub const MAX_MESSAGE_CHARS: usize = 4000;
const TRUNCATE_AT_CHARS: usize = 3900;
const TRUNCATION_MARKER: &str = "\n\n...(truncated for length)";

const MAX_ENTRIES: usize = 10;
const MAX_DESCRIPTION_CHARS: usize = 150;

/// Render the ranked record set as a Slack mrkdwn digest. Always well-formed,
/// including for an empty set; output length never exceeds
/// `MAX_MESSAGE_CHARS`.
pub fn format(records: &[GrantRecord], today: NaiveDate) -> String {
    let mut msg = format!(
        "🎯 *Weekly Grants Digest* - {}\n\n",
        today.format("%B %d, %Y")
    );

    if records.is_empty() {
        msg.push_str("No relevant funding opportunities were found in this scan.\n");
        return msg;
    }

    let (recent, older) = split_recent(records, today);
    msg.push_str(&format!(
        "Found *{}* relevant funding opportunities:\n",
        records.len()
    ));
    if !recent.is_empty() {
        msg.push_str(&format!(
            "🆕 *{} new* (published in last 7 days)\n",
            recent.len()
        ));
    }
    if !older.is_empty() {
        msg.push_str(&format!("📋 {} ongoing opportunities\n", older.len()));
    }
    msg.push('\n');

    for (i, g) in records.iter().take(MAX_ENTRIES).enumerate() {
        push_entry(&mut msg, i + 1, g);
    }

    cap(msg)
}

fn push_entry(msg: &mut String, index: usize, g: &GrantRecord) {
    msg.push_str(&format!("*{index}. {}*\n", g.title));
    msg.push_str(&format!("💰 Amount: {}\n", g.amount));
    msg.push_str(&format!("🏢 Organization: {}\n", g.organization));
    msg.push_str(&format!("📅 Deadline: {}\n", g.deadline));
    msg.push_str(&format!("📰 Published: {}\n", g.published_date));
    msg.push_str(&format!("📝 {}\n", truncate_description(&g.description)));
    match g.relevance_score {
        Some(score) => msg.push_str(&format!("⭐ Relevance: {score}/10\n")),
        None => msg.push_str("⭐ Relevance: N/A\n"),
    }
    msg.push_str(&format!("🌍 Source: {}\n", g.source));
    if let Some(link) = link_line(g) {
        msg.push_str(&link);
    }
    msg.push_str("\n---\n\n");
}

fn truncate_description(description: &str) -> String {
    if description.chars().count() <= MAX_DESCRIPTION_CHARS {
        return description.to_string();
    }
    let cut: String = description.chars().take(MAX_DESCRIPTION_CHARS).collect();
    format!("{cut}...")
}

/// Slack hyperlink for the record: `url` when present and well-formed, else
/// the source page, else nothing.
fn link_line(g: &GrantRecord) -> Option<String> {
    let url = g.url.trim();
    if !url.is_empty() && url != NOT_SPECIFIED && url.starts_with("http") {
        // a stray pipe would break Slack's <url|label> syntax
        let url = url.split('|').next().unwrap_or(url);
        return Some(format!("🔗 <{url}|Apply Here>\n"));
    }
    let source_url = g.source_url.trim();
    if !source_url.is_empty() {
        return Some(format!("🔗 <{source_url}|View Source>\n"));
    }
    None
}

fn cap(msg: String) -> String {
    if msg.chars().count() <= MAX_MESSAGE_CHARS {
        return msg;
    }
    let cut: String = msg.chars().take(TRUNCATE_AT_CHARS).collect();
    format!("{cut}{TRUNCATION_MARKER}")
}
