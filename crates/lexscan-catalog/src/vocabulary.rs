//! Calendar month names and keyword lists.

use regex::Regex;
use serde::Deserialize;

use crate::error::{CatalogError, Result};
use crate::text::{alternation, normalize_key};

const VOCABULARY_SCHEMA: &str = "lexscan.vocabulary";
const VOCABULARY_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MonthName {
    pub number: u32,
    pub canonical: String,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Keywords {
    #[serde(default)]
    amendment: Vec<String>,
    #[serde(default)]
    official_journal: Vec<String>,
    #[serde(default)]
    document_type: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct StatusDef {
    value: String,
    keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct VocabularyHeader {
    schema: String,
    schema_version: u32,
    default_status: String,
}

#[derive(Debug, Deserialize)]
struct VocabularyFile {
    vocabulary: VocabularyHeader,
    #[serde(rename = "gregorian_month")]
    gregorian: Vec<MonthName>,
    #[serde(rename = "hijri_month")]
    hijri: Vec<MonthName>,
    #[serde(default)]
    keywords: Keywords,
    #[serde(default, rename = "status")]
    statuses: Vec<StatusDef>,
}

/// Calendar a date entity carries a component of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Calendar {
    Gregorian,
    Hijri,
}

/// A keyword hit in document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordHit<'a> {
    pub value: &'a str,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone)]
pub struct Vocabulary {
    gregorian: Vec<MonthName>,
    hijri: Vec<MonthName>,
    default_status: String,
    statuses: Vec<(String, Regex)>,
    amendment: Option<Regex>,
    official_journal: Option<Regex>,
    document_type: Option<Regex>,
}

impl Vocabulary {
    pub fn parse(source: &str, origin: &str) -> Result<Self> {
        let file: VocabularyFile = toml::from_str(source).map_err(|source| CatalogError::Toml {
            origin: origin.to_string(),
            source,
        })?;
        let header = &file.vocabulary;
        if header.schema != VOCABULARY_SCHEMA || header.schema_version != VOCABULARY_SCHEMA_VERSION
        {
            return Err(CatalogError::UnsupportedSchema {
                origin: origin.to_string(),
                found: format!("{} v{}", header.schema, header.schema_version),
                expected: VOCABULARY_SCHEMA,
                version: VOCABULARY_SCHEMA_VERSION,
            });
        }
        check_months("gregorian", &file.gregorian)?;
        check_months("hijri", &file.hijri)?;

        let mut statuses = Vec::with_capacity(file.statuses.len());
        for status in &file.statuses {
            let context = format!("status {}", status.value);
            if let Some(regex) = keyword_regex(&status.keywords, &context)? {
                statuses.push((status.value.clone(), regex));
            }
        }

        Ok(Self {
            gregorian: file.gregorian,
            hijri: file.hijri,
            default_status: header.default_status.clone(),
            statuses,
            amendment: keyword_regex(&file.keywords.amendment, "amendment keywords")?,
            official_journal: keyword_regex(
                &file.keywords.official_journal,
                "official journal keywords",
            )?,
            document_type: keyword_regex(&file.keywords.document_type, "document type keywords")?,
        })
    }

    pub fn gregorian_months(&self) -> &[MonthName] {
        &self.gregorian
    }

    pub fn hijri_months(&self) -> &[MonthName] {
        &self.hijri
    }

    /// Month number for a Gregorian month name or a numeric month (`3`, `03`).
    pub fn gregorian_month(&self, name: &str) -> Option<u32> {
        let trimmed = name.trim();
        if let Ok(number) = trimmed.parse::<u32>() {
            return (1..=12).contains(&number).then_some(number);
        }
        find_month(&self.gregorian, trimmed).map(|month| month.number)
    }

    pub fn hijri_month(&self, name: &str) -> Option<&MonthName> {
        find_month(&self.hijri, name.trim())
    }

    /// Which calendar a month name belongs to; Gregorian wins for names in both lists.
    pub fn calendar_of(&self, month: &str) -> Option<Calendar> {
        if self.gregorian_month(month).is_some() {
            Some(Calendar::Gregorian)
        } else if self.hijri_month(month).is_some() {
            Some(Calendar::Hijri)
        } else {
            None
        }
    }

    /// Regex alternation used to expand `{gregorian_months}`.
    pub fn gregorian_alternation(&self) -> String {
        alternation(self.gregorian.iter().flat_map(|m| m.names.iter().map(String::as_str)))
    }

    /// Regex alternation used to expand `{hijri_months}`.
    pub fn hijri_alternation(&self) -> String {
        alternation(self.hijri.iter().flat_map(|m| m.names.iter().map(String::as_str)))
    }

    pub fn default_status(&self) -> &str {
        &self.default_status
    }

    /// First status whose keywords occur in `text`, in declaration order of the statuses.
    pub fn status_in(&self, text: &str) -> Option<KeywordHit<'_>> {
        self.statuses.iter().find_map(|(value, regex)| {
            regex.find(text).map(|m| KeywordHit {
                value: value.as_str(),
                start: m.start(),
                end: m.end(),
            })
        })
    }

    /// Earliest amendment phrase (`modifiant`, `complétant`, ...) in `text`.
    pub fn find_amendment<'t>(&self, text: &'t str) -> Option<regex::Match<'t>> {
        self.amendment.as_ref().and_then(|regex| regex.find(text))
    }

    /// Earliest official-journal marker in `text`.
    pub fn find_official_journal<'t>(&self, text: &'t str) -> Option<regex::Match<'t>> {
        self.official_journal
            .as_ref()
            .and_then(|regex| regex.find(text))
    }

    /// True when `value` mentions a law/decree/order keyword.
    pub fn mentions_document_type(&self, value: &str) -> bool {
        self.document_type
            .as_ref()
            .is_some_and(|regex| regex.is_match(value))
    }
}

fn find_month<'a>(months: &'a [MonthName], name: &str) -> Option<&'a MonthName> {
    let key = normalize_key(name);
    if key.is_empty() {
        return None;
    }
    months
        .iter()
        .find(|month| month.names.iter().any(|n| normalize_key(n) == key))
}

fn check_months(calendar: &str, months: &[MonthName]) -> Result<()> {
    if months.len() != 12 {
        return Err(CatalogError::invalid(format!(
            "{calendar} calendar lists {} months, expected 12",
            months.len()
        )));
    }
    for (idx, month) in months.iter().enumerate() {
        if month.number as usize != idx + 1 {
            return Err(CatalogError::invalid(format!(
                "{calendar} month {} is out of order (position {})",
                month.number,
                idx + 1
            )));
        }
        if month.names.iter().all(|name| name.trim().is_empty()) {
            return Err(CatalogError::invalid(format!(
                "{calendar} month {} has no names",
                month.number
            )));
        }
    }
    Ok(())
}

/// Case-insensitive, word-bounded alternation; `None` for an empty list.
fn keyword_regex(keywords: &[String], context: &str) -> Result<Option<Regex>> {
    let alt = alternation(keywords.iter().map(String::as_str));
    if alt.is_empty() {
        return Ok(None);
    }
    Regex::new(&format!(r"(?i)\b(?:{alt})\b"))
        .map(Some)
        .map_err(|source| CatalogError::InvalidPattern {
            context: context.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedded::VOCABULARY_TOML;

    fn vocabulary() -> Vocabulary {
        Vocabulary::parse(VOCABULARY_TOML, "embedded").unwrap()
    }

    #[test]
    fn resolves_month_names_in_both_scripts() {
        let vocab = vocabulary();
        assert_eq!(vocab.gregorian_month("Mars"), Some(3));
        assert_eq!(vocab.gregorian_month("aout"), Some(8));
        assert_eq!(vocab.gregorian_month("مارس"), Some(3));
        assert_eq!(vocab.gregorian_month("03"), Some(3));
        assert_eq!(vocab.gregorian_month("13"), None);
        assert_eq!(
            vocab.hijri_month("RAMADHAN").map(|m| m.canonical.as_str()),
            Some("Ramadhan")
        );
        assert_eq!(vocab.hijri_month("جمادى الاولى").map(|m| m.number), Some(5));
    }

    #[test]
    fn calendar_of_distinguishes_month_vocabularies() {
        let vocab = vocabulary();
        assert_eq!(vocab.calendar_of("juillet"), Some(Calendar::Gregorian));
        assert_eq!(vocab.calendar_of("Chaoual"), Some(Calendar::Hijri));
        assert_eq!(vocab.calendar_of("lundi"), None);
    }

    #[test]
    fn status_keywords_are_word_bounded() {
        let vocab = vocabulary();
        let hit = vocab
            .status_in("Le décret n° 98-12 est abrogé.")
            .expect("status");
        assert_eq!(hit.value, "repealed");
        assert!(vocab.status_in("abrogeant les dispositions").is_none());
        assert_eq!(
            vocab
                .status_in("Le présent décret entre en vigueur")
                .map(|h| h.value),
            Some("in force")
        );
    }

    #[test]
    fn rejects_incomplete_calendars() {
        let source = r#"
[vocabulary]
schema = "lexscan.vocabulary"
schema_version = 1
default_status = "in force"

[[gregorian_month]]
number = 1
canonical = "janvier"
names = ["janvier"]

[[hijri_month]]
number = 1
canonical = "Moharram"
names = ["moharram"]
"#;
        let err = Vocabulary::parse(source, "inline").unwrap_err();
        assert!(matches!(err, CatalogError::InvalidCatalog { .. }));
    }
}
