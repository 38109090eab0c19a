// src/scan/normalize.rs
use once_cell::sync::OnceCell;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Semantic selectors tried in order for an explicit main-content region.
const CONTENT_SELECTORS: &[&str] = &[
    "main",
    r#"[role="main"]"#,
    ".main-content",
    "#main-content",
    ".content",
    "#content",
    "article",
    ".article",
];

/// Structural elements whose subtrees carry no page content.
const SKIP_TAGS: &[&str] = &[
    "script", "style", "nav", "footer", "header", "aside", "iframe", "noscript",
];

/// Strip markup and collapse whitespace into a compact text blob.
///
/// This is a deliberately lossy compaction, not a general HTML-to-text
/// converter: fragments of 2 chars or fewer are discarded.
pub fn normalize(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut text = String::new();
    collect_text(content_root(&doc), &mut text);
    compact(&text)
}

/// First matching content selector, else `body`, else the whole document.
fn content_root(doc: &Html) -> ElementRef<'_> {
    for sel in CONTENT_SELECTORS {
        if let Some(el) = Selector::parse(sel)
            .ok()
            .and_then(|s| doc.select(&s).next())
        {
            return el;
        }
    }
    if let Some(body) = Selector::parse("body")
        .ok()
        .and_then(|s| doc.select(&s).next())
    {
        return body;
    }
    doc.root_element()
}

fn collect_text(el: ElementRef<'_>, out: &mut String) {
    if SKIP_TAGS.contains(&el.value().name()) {
        return;
    }
    for child in el.children() {
        if let Some(t) = child.value().as_text() {
            out.push_str(t);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            out.push('\n');
            collect_text(child_el, out);
        }
    }
}

/// Split into lines, re-split on runs of 2+ spaces, drop fragments of 2 chars
/// or fewer, join the rest with single spaces.
fn compact(text: &str) -> String {
    static RE_MULTISPACE: OnceCell<Regex> = OnceCell::new();
    let re = RE_MULTISPACE.get_or_init(|| Regex::new(r" {2,}").unwrap());

    let mut fragments: Vec<&str> = Vec::new();
    for line in text.lines() {
        for piece in re.split(line.trim()) {
            let piece = piece.trim();
            if piece.chars().count() > 2 {
                fragments.push(piece);
            }
        }
    }
    fragments.join(" ")
}
