//! Document skeleton: title, declared type and number, articles.

use std::sync::LazyLock;

use lexscan_catalog::Catalog;
use lexscan_model::{Article, DocumentStructure, Extraction};
use regex::Regex;

use crate::extractor::collapse_whitespace;

/// Longest title kept, in characters.
pub const MAX_TITLE_CHARS: usize = 300;

static DECLARED_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\bn[°º]|\bno\.?\s|رقم)\s*(\d{2,4}-\d{1,4})\b")
        .expect("Invalid declared number regex")
});

/// Trailing markers left on an identifying match (`n°`, `du`, `رقم`, `مؤرخ`).
static TYPE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+(?:n[°º]|no\.?|du|رقم|مؤرخ)\s*$").expect("Invalid type suffix regex")
});

static ARTICLE_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[ \t]*(?:(?:article|art\.)[ \t]*(?P<fr>\d+|premier|1er)\b|المادة[ \t]+(?P<ar>\d+|الأولى))[ \t.:\-–—]*",
    )
    .expect("Invalid article heading regex")
});

pub fn analyze(text: &str, extraction: &Extraction, catalog: &Catalog) -> DocumentStructure {
    let title = text
        .lines()
        .map(collapse_whitespace)
        .find(|line| !line.is_empty())
        .map(|line| truncate_chars(&line, MAX_TITLE_CHARS));

    let declared_type = catalog
        .template(&extraction.document_type)
        .and_then(|template| template.identify(text, extraction.language))
        .map(|hit| clean_declared_type(&text[hit.first.start..hit.first.end]))
        .filter(|value| !value.is_empty());

    let declared_number = title.as_deref().and_then(declared_number);

    DocumentStructure {
        title,
        declared_type,
        declared_number,
        articles: split_articles(text),
    }
}

/// First `NN-NNN` number after a `n°` / `رقم` marker.
pub fn declared_number(title: &str) -> Option<String> {
    DECLARED_NUMBER
        .captures(title)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn clean_declared_type(raw: &str) -> String {
    collapse_whitespace(&TYPE_SUFFIX.replace(raw.trim(), ""))
}

/// Split the text at article headings; `premier`, `1er` and `الأولى` become `1`.
pub fn split_articles(text: &str) -> Vec<Article> {
    let headings: Vec<(String, usize, usize)> = ARTICLE_HEADING
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let raw = caps.name("fr").or_else(|| caps.name("ar"))?;
            Some((article_number(raw.as_str()), whole.start(), whole.end()))
        })
        .collect();

    headings
        .iter()
        .enumerate()
        .map(|(idx, (number, _, body_start))| {
            let body_end = headings
                .get(idx + 1)
                .map_or(text.len(), |(_, next_start, _)| *next_start);
            Article {
                number: number.clone(),
                content: text[*body_start..body_end].trim().to_string(),
            }
        })
        .collect()
}

fn article_number(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    match lowered.as_str() {
        "premier" | "1er" | "الأولى" => "1".to_string(),
        digits => digits
            .parse::<u32>()
            .map_or_else(|_| digits.to_string(), |n| n.to_string()),
    }
}

fn truncate_chars(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((idx, _)) => value[..idx].trim_end().to_string(),
        None => value.to_string(),
    }
}
