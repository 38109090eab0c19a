// src/rank.rs
use chrono::{Duration, NaiveDate};

use crate::scan::types::{GrantRecord, NOT_SPECIFIED};

/// Newest first: primary key is the parsed publication date (missing or
/// unparseable dates sink to the end), secondary key is relevance score
/// (missing treated as 0). The sort is stable.
pub fn rank(records: &mut [GrantRecord]) {
    records.sort_by(|a, b| sort_key(b).cmp(&sort_key(a)));
}

fn sort_key(g: &GrantRecord) -> (NaiveDate, u8) {
    (
        parse_published(g).unwrap_or(NaiveDate::MIN),
        g.relevance_score.unwrap_or(0),
    )
}

pub fn parse_published(g: &GrantRecord) -> Option<NaiveDate> {
    let s = g.published_date.trim();
    if s.is_empty() || s == NOT_SPECIFIED {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Published within the last 7 days counts as recent; everything else,
/// including parse failures, is older.
pub fn split_recent<'a>(
    records: &'a [GrantRecord],
    today: NaiveDate,
) -> (Vec<&'a GrantRecord>, Vec<&'a GrantRecord>) {
    let cutoff = today - Duration::days(7);
    let mut recent = Vec::new();
    let mut older = Vec::new();
    for g in records {
        match parse_published(g) {
            Some(d) if d >= cutoff => recent.push(g),
            _ => older.push(g),
        }
    }
    (recent, older)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(title: &str, published: &str, score: Option<u8>) -> GrantRecord {
        GrantRecord {
            title: title.to_string(),
            organization: NOT_SPECIFIED.to_string(),
            amount: NOT_SPECIFIED.to_string(),
            deadline: NOT_SPECIFIED.to_string(),
            published_date: published.to_string(),
            description: "d".to_string(),
            eligibility: NOT_SPECIFIED.to_string(),
            url: String::new(),
            relevance_score: score,
            country: NOT_SPECIFIED.to_string(),
            language: NOT_SPECIFIED.to_string(),
            source: "Test".to_string(),
            source_url: String::new(),
            discovered_at: String::new(),
            specific_url: None,
        }
    }

    #[test]
    fn newer_date_wins_regardless_of_score() {
        let mut records = vec![
            grant("old-high", "2026-01-01", Some(10)),
            grant("new-low", "2026-08-01", Some(6)),
        ];
        rank(&mut records);
        assert_eq!(records[0].title, "new-low");
    }

    #[test]
    fn score_breaks_date_ties_and_missing_dates_sink() {
        let mut records = vec![
            grant("no-date-low", NOT_SPECIFIED, Some(6)),
            grant("same-day-low", "2026-08-01", Some(6)),
            grant("no-date-high", "garbage date", Some(9)),
            grant("same-day-high", "2026-08-01", Some(9)),
            grant("no-date-none", "", None),
        ];
        rank(&mut records);
        let titles: Vec<&str> = records.iter().map(|g| g.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "same-day-high",
                "same-day-low",
                "no-date-high",
                "no-date-low",
                "no-date-none"
            ]
        );
    }

    #[test]
    fn recency_split_uses_seven_day_window() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let records = vec![
            grant("today", "2026-08-07", Some(8)),
            grant("six-days", "2026-08-01", Some(8)),
            grant("eight-days", "2026-07-30", Some(8)),
            grant("unparseable", "soon", Some(8)),
            grant("unspecified", NOT_SPECIFIED, Some(8)),
        ];
        let (recent, older) = split_recent(&records, today);
        let recent_titles: Vec<&str> = recent.iter().map(|g| g.title.as_str()).collect();
        assert_eq!(recent_titles, vec!["today", "six-days"]);
        assert_eq!(older.len(), 3);
    }
}
