//! Document type templates.

use std::collections::BTreeMap;

use lexscan_model::{DocumentTypeId, FormSchema, Language, Span};
use regex::Regex;

use crate::pattern::{EntityPattern, PatternRule};
use crate::rules::ValidationRule;
use crate::text::normalize_key;

/// Compiled `extraction_rules` and `validation` of one schema field.
#[derive(Debug, Clone, Default)]
pub struct FieldPatterns {
    pub extraction: Vec<Regex>,
    pub validation: Option<Regex>,
}

/// Where a template's identifying patterns hit a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identification {
    /// Earliest identifying match.
    pub first: Span,
    /// Number of identifying matches across all patterns.
    pub matches: usize,
}

/// Everything the pipeline knows about one document type. Immutable after load.
#[derive(Debug, Clone)]
pub struct DocumentTypeTemplate {
    pub id: DocumentTypeId,
    pub type_name: String,
    pub aliases: Vec<String>,
    pub identifying_patterns: Vec<PatternRule>,
    /// Institution fragments first, then the template's own patterns, then shared sets.
    pub entity_patterns: Vec<EntityPattern>,
    pub form_schema: FormSchema,
    pub institution_patterns: Vec<String>,
    pub validation_rules: Vec<ValidationRule>,
    pub(crate) field_patterns: BTreeMap<String, FieldPatterns>,
    pub(crate) name_keys: Vec<String>,
}

impl DocumentTypeTemplate {
    /// Type name followed by aliases.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.type_name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    pub(crate) fn build_name_keys(&mut self) {
        let mut keys: Vec<String> = std::iter::once(self.id.as_str())
            .chain(self.names())
            .map(normalize_key)
            .filter(|key| !key.is_empty())
            .collect();
        keys.dedup();
        self.name_keys = keys;
    }

    pub fn name_keys(&self) -> &[String] {
        &self.name_keys
    }

    /// Compiled extraction rules of `field`, empty when it has none.
    pub fn extraction_rules(&self, field: &str) -> &[Regex] {
        self.field_patterns
            .get(field)
            .map(|patterns| patterns.extraction.as_slice())
            .unwrap_or_default()
    }

    /// Anchored validation regex of `field`.
    pub fn field_validation(&self, field: &str) -> Option<&Regex> {
        self.field_patterns
            .get(field)
            .and_then(|patterns| patterns.validation.as_ref())
    }

    pub fn rules_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a ValidationRule> {
        self.validation_rules
            .iter()
            .filter(move |rule| rule.field == field)
    }

    /// Run the identifying patterns that apply to `language`.
    pub fn identify(&self, text: &str, language: Language) -> Option<Identification> {
        let mut first: Option<Span> = None;
        let mut matches = 0;
        for rule in self
            .identifying_patterns
            .iter()
            .filter(|rule| rule.applies_to(language))
        {
            for m in rule.regex.find_iter(text) {
                matches += 1;
                let span = Span::new(m.start(), m.end());
                if first.is_none_or(|current| span.start < current.start) {
                    first = Some(span);
                }
            }
        }
        first.map(|first| Identification { first, matches })
    }
}
