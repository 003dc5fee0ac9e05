//! Compiled pattern rules.

use lexscan_model::{EntityKind, Language};
use regex::Regex;

use crate::error::{CatalogError, Result};
use crate::text::alternation;
use crate::vocabulary::Vocabulary;

pub const GREGORIAN_MONTHS_PLACEHOLDER: &str = "{gregorian_months}";
pub const HIJRI_MONTHS_PLACEHOLDER: &str = "{hijri_months}";

/// Base confidence of institution entities produced from template fragments.
pub const INSTITUTION_FRAGMENT_CONFIDENCE: f32 = 0.85;

/// Language restriction of a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LangTag {
    #[default]
    Any,
    Only(Language),
}

impl LangTag {
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        match raw.map(str::trim) {
            None | Some("") | Some("any") => Ok(LangTag::Any),
            Some(code) => match code.parse::<Language>()? {
                Language::Unknown => Ok(LangTag::Any),
                language => Ok(LangTag::Only(language)),
            },
        }
    }

    /// Tagged patterns run for their language, and for every language when it is unknown.
    pub fn applies_to(&self, language: Language) -> bool {
        match self {
            LangTag::Any => true,
            LangTag::Only(tag) => language == Language::Unknown || *tag == language,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PatternRule {
    /// Pattern as written in the catalog, before placeholder expansion.
    pub source: String,
    pub regex: Regex,
    pub confidence: f32,
    pub lang: LangTag,
}

impl PatternRule {
    pub fn compile(
        source: &str,
        confidence: f32,
        lang: LangTag,
        vocabulary: &Vocabulary,
        context: &str,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(CatalogError::InvalidConfidence {
                context: context.to_string(),
                value: confidence,
            });
        }
        let expanded = expand_placeholders(source, vocabulary);
        let regex = Regex::new(&expanded).map_err(|source| CatalogError::InvalidPattern {
            context: context.to_string(),
            source,
        })?;
        Ok(Self {
            source: source.to_string(),
            regex,
            confidence,
            lang,
        })
    }

    pub fn applies_to(&self, language: Language) -> bool {
        self.lang.applies_to(language)
    }
}

#[derive(Debug, Clone)]
pub struct EntityPattern {
    pub kind: EntityKind,
    pub rule: PatternRule,
}

/// Replace month placeholders with the vocabulary alternations.
pub fn expand_placeholders(pattern: &str, vocabulary: &Vocabulary) -> String {
    let mut out = pattern.to_string();
    if out.contains(GREGORIAN_MONTHS_PLACEHOLDER) {
        out = out.replace(
            GREGORIAN_MONTHS_PLACEHOLDER,
            &format!("(?:{})", vocabulary.gregorian_alternation()),
        );
    }
    if out.contains(HIJRI_MONTHS_PLACEHOLDER) {
        out = out.replace(
            HIJRI_MONTHS_PLACEHOLDER,
            &format!("(?:{})", vocabulary.hijri_alternation()),
        );
    }
    out
}

/// One case-insensitive alternation over a template's institution fragments.
pub(crate) fn fragment_pattern(fragments: &[String]) -> Option<String> {
    let alt = alternation(fragments.iter().map(String::as_str));
    (!alt.is_empty()).then(|| format!(r"(?i)\b(?:{alt})\b"))
}
