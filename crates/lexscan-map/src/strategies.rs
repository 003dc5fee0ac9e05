//! Per-field mapping strategies.
//!
//! One table keyed by field name; fields it does not name fall back to a
//! strategy chosen by field kind, then to the field's extraction rules.

use std::borrow::Cow;
use std::ops::Range;
use std::sync::LazyLock;

use lexscan_catalog::{Catalog, DocumentTypeTemplate};
use lexscan_model::{
    DocumentStructure, EntityKind, ExtractedEntity, FieldKind, FormField, MappingSource,
};
use regex::Regex;
use tracing::warn;

use crate::dates::{gregorian_iso, has_gregorian, hijri_text};
use crate::options::MapperOptions;

static NUMBER_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2,4}-\d{1,4}$").expect("Invalid number shape regex"));

static BLANK_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n").expect("Invalid blank line regex"));

/// Text allowed between an official-journal marker and its issue date:
/// same sentence, ending in a dating preposition (`n° 15 du`, `بتاريخ`).
static JOURNAL_ISSUE_GAP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[^.;\n]{0,120}?(?:\bdu|\ble|\bdated|\bof|المؤرخ\s+في|بتاريخ)\s*$")
        .expect("Invalid journal issue gap regex")
});

/// Everything a strategy may look at.
pub struct MappingInput<'a> {
    pub text: &'a str,
    /// Entities in document order.
    pub entities: &'a [ExtractedEntity],
    pub structure: &'a DocumentStructure,
}

pub(crate) struct Context<'a> {
    pub input: &'a MappingInput<'a>,
    pub catalog: &'a Catalog,
    pub options: &'a MapperOptions,
    pub template: Option<&'a DocumentTypeTemplate>,
}

impl Context<'_> {
    pub fn entities(&self, kind: EntityKind) -> impl Iterator<Item = &ExtractedEntity> {
        self.input
            .entities
            .iter()
            .filter(move |entity| entity.kind == kind)
    }

    /// Byte range of the first non-empty line of the raw text.
    pub fn title_range(&self) -> Range<usize> {
        let text = self.input.text;
        let mut offset = 0;
        for line in text.split_inclusive('\n') {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                let start = offset + (line.len() - line.trim_start().len());
                return start..start + trimmed.len();
            }
            offset += line.len();
        }
        0..0
    }
}

/// A value a strategy proposes for a field.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Candidate {
    pub value: String,
    pub confidence: f32,
    pub source: MappingSource,
}

impl Candidate {
    fn new(value: impl Into<String>, confidence: f32, source: MappingSource) -> Self {
        Self {
            value: value.into(),
            confidence,
            source,
        }
    }

    fn from_entity(entity: &ExtractedEntity, value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            confidence: entity.confidence,
            source: MappingSource::ExtractedEntity,
        }
    }
}

pub(crate) type Strategy = fn(&Context<'_>, &FormField) -> Option<Candidate>;

pub(crate) struct StrategyEntry {
    pub field: &'static str,
    pub run: Strategy,
}

const fn entry(field: &'static str, run: Strategy) -> StrategyEntry {
    StrategyEntry { field, run }
}

pub(crate) const STRATEGIES: &[StrategyEntry] = &[
    entry("title", map_title),
    entry("type", map_type),
    entry("number", map_number),
    entry("institution", map_institution),
    entry("date_gregorian", map_date_gregorian),
    entry("date_hijri", map_date_hijri),
    entry("publication_date", map_publication_date),
    entry("subject", map_subject),
    entry("description", map_description),
    entry("content", map_content),
    entry("status", map_status),
    entry("article_count", map_article_count),
    entry("amends", map_amends),
    entry("version", suggest_only),
];

pub(crate) fn strategy_for(field: &str) -> Option<&'static StrategyEntry> {
    STRATEGIES.iter().find(|entry| entry.field == field)
}

/// Names handled by the strategy table, in table order.
pub fn strategy_fields() -> impl Iterator<Item = &'static str> {
    STRATEGIES.iter().map(|entry| entry.field)
}

/// Strategy for a field the table does not name.
pub(crate) fn fallback(ctx: &Context<'_>, field: &FormField) -> Option<Candidate> {
    let by_kind = match field.kind {
        FieldKind::Date => first_date(ctx),
        FieldKind::Number => ctx
            .entities(EntityKind::Number)
            .next()
            .map(|entity| Candidate::from_entity(entity, entity.value.clone())),
        _ => None,
    };
    by_kind.or_else(|| map_extraction_rules(ctx, field))
}

fn map_title(ctx: &Context<'_>, _field: &FormField) -> Option<Candidate> {
    if let Some(title) = &ctx.input.structure.title {
        return Some(Candidate::new(title.clone(), 0.9, MappingSource::PatternMatch));
    }
    ctx.entities(EntityKind::TextBlock).next().map(|entity| Candidate {
        confidence: 0.5,
        source: MappingSource::Inferred,
        ..Candidate::from_entity(entity, entity.value.clone())
    })
}

fn map_type(ctx: &Context<'_>, _field: &FormField) -> Option<Candidate> {
    if let Some(found) = ctx
        .input
        .structure
        .declared_type
        .as_deref()
        .and_then(|declared| ctx.catalog.find_by_name(declared))
    {
        return Some(Candidate::new(
            found.template.type_name.clone(),
            0.95,
            MappingSource::PatternMatch,
        ));
    }
    let vocabulary = ctx.catalog.vocabulary();
    ctx.input
        .entities
        .iter()
        .find(|entity| vocabulary.mentions_document_type(&entity.value))
        .map(|entity| {
            let value = ctx
                .catalog
                .find_by_name(&entity.value)
                .map_or_else(|| entity.value.clone(), |m| m.template.type_name.clone());
            Candidate {
                confidence: 0.7,
                ..Candidate::from_entity(entity, value)
            }
        })
}

fn map_number(ctx: &Context<'_>, _field: &FormField) -> Option<Candidate> {
    if let Some(number) = &ctx.input.structure.declared_number {
        return Some(Candidate::new(number.clone(), 0.95, MappingSource::PatternMatch));
    }
    ctx.entities(EntityKind::Number)
        .find(|entity| NUMBER_SHAPE.is_match(&entity.value))
        .map(|entity| Candidate::from_entity(entity, entity.value.clone()))
}

fn map_institution(ctx: &Context<'_>, _field: &FormField) -> Option<Candidate> {
    let institutions = ctx.catalog.institutions();
    let resolved = ctx.entities(EntityKind::Institution).find_map(|entity| {
        institutions
            .resolve(&entity.value)
            .filter(|m| m.score >= ctx.options.institution_similarity)
            .map(|m| Candidate {
                confidence: entity.confidence * m.score,
                ..Candidate::from_entity(entity, m.institution.canonical.clone())
            })
    });
    resolved.or_else(|| {
        institutions
            .find_in_text(ctx.input.text)
            .map(|found| Candidate::new(found.canonical.clone(), 0.6, MappingSource::Inferred))
    })
}

fn first_date(ctx: &Context<'_>) -> Option<Candidate> {
    let vocabulary = ctx.catalog.vocabulary();
    ctx.entities(EntityKind::Date).find_map(|entity| {
        gregorian_iso(entity, vocabulary)
            .or_else(|| hijri_text(entity, vocabulary))
            .map(|value| Candidate::from_entity(entity, value))
    })
}

fn map_date_gregorian(ctx: &Context<'_>, _field: &FormField) -> Option<Candidate> {
    let vocabulary = ctx.catalog.vocabulary();
    ctx.entities(EntityKind::Date).find_map(|entity| {
        gregorian_iso(entity, vocabulary).map(|iso| Candidate::from_entity(entity, iso))
    })
}

fn map_date_hijri(ctx: &Context<'_>, _field: &FormField) -> Option<Candidate> {
    let vocabulary = ctx.catalog.vocabulary();
    ctx.entities(EntityKind::Date).find_map(|entity| {
        hijri_text(entity, vocabulary).map(|text| Candidate::from_entity(entity, text))
    })
}

/// The issue date of the official journal the document cites, as in
/// "publié au Journal officiel n° 15 du 19 mars 2023".
fn map_publication_date(ctx: &Context<'_>, _field: &FormField) -> Option<Candidate> {
    let vocabulary = ctx.catalog.vocabulary();
    let text = ctx.input.text;
    let marker = vocabulary.find_official_journal(text)?;
    let entity = ctx
        .entities(EntityKind::Date)
        .find(|entity| entity.span.start >= marker.end())?;
    let gap = text.get(marker.end()..entity.span.start)?;
    if !JOURNAL_ISSUE_GAP.is_match(gap) || !has_gregorian(entity, vocabulary) {
        return None;
    }
    gregorian_iso(entity, vocabulary).map(|iso| Candidate::from_entity(entity, iso))
}

fn map_subject(ctx: &Context<'_>, _field: &FormField) -> Option<Candidate> {
    ctx.entities(EntityKind::TextBlock)
        .next()
        .map(|entity| Candidate::from_entity(entity, entity.value.clone()))
}

fn map_description(ctx: &Context<'_>, _field: &FormField) -> Option<Candidate> {
    let text = ctx.input.text;
    let mut blocks: Vec<&str> = BLANK_LINE.split(text).collect();
    if blocks.len() <= 1 {
        blocks = text.lines().collect();
    }
    blocks
        .into_iter()
        .map(collapse_whitespace)
        .filter(|block| ctx.input.structure.title.as_deref() != Some(block.as_str()))
        .find(|block| block.chars().count() >= ctx.options.description_min_chars)
        .map(|block| Candidate::new(block, 0.6, MappingSource::Inferred))
}

fn map_content(ctx: &Context<'_>, _field: &FormField) -> Option<Candidate> {
    let content = ctx.input.text.trim();
    (!content.is_empty()).then(|| Candidate::new(content, 0.7, MappingSource::Inferred))
}

fn map_status(ctx: &Context<'_>, _field: &FormField) -> Option<Candidate> {
    let vocabulary = ctx.catalog.vocabulary();
    Some(match vocabulary.status_in(ctx.input.text) {
        Some(hit) => Candidate::new(hit.value, 0.8, MappingSource::PatternMatch),
        None => Candidate::new(vocabulary.default_status(), 0.5, MappingSource::Inferred),
    })
}

fn map_article_count(ctx: &Context<'_>, _field: &FormField) -> Option<Candidate> {
    let count = ctx.input.structure.articles.len();
    (count > 0).then(|| Candidate::new(count.to_string(), 0.9, MappingSource::Inferred))
}

/// Text amended by this document: the first reference after an amendment
/// phrase in the title line.
fn map_amends(ctx: &Context<'_>, _field: &FormField) -> Option<Candidate> {
    let (phrase_start, _) = amendment_in_title(ctx)?;
    let title = ctx.title_range();
    ctx.entities(EntityKind::Reference)
        .find(|entity| entity.span.start >= phrase_start && entity.span.start < title.end)
        .map(|entity| Candidate::from_entity(entity, entity.value.clone()))
}

/// Filled only through suggestions and reviewer corrections.
fn suggest_only(_ctx: &Context<'_>, _field: &FormField) -> Option<Candidate> {
    None
}

/// Absolute byte range of the first amendment phrase inside the title line.
pub(crate) fn amendment_in_title(ctx: &Context<'_>) -> Option<(usize, usize)> {
    let title = ctx.title_range();
    let line = &ctx.input.text[title.clone()];
    ctx.catalog
        .vocabulary()
        .find_amendment(line)
        .map(|m| (title.start + m.start(), title.start + m.end()))
}

fn map_extraction_rules(ctx: &Context<'_>, field: &FormField) -> Option<Candidate> {
    let rules: Cow<'_, [Regex]> = match ctx.template {
        Some(template) if template.form_schema.field(&field.name) == Some(field) => {
            Cow::Borrowed(template.extraction_rules(&field.name))
        }
        _ => Cow::Owned(compile_rules(field)),
    };
    rules.iter().find_map(|rule| {
        let caps = rule.captures(ctx.input.text)?;
        let matched = caps.name("value").or_else(|| caps.get(0))?;
        let value = collapse_whitespace(matched.as_str());
        (!value.is_empty()).then(|| Candidate::new(value, 0.75, MappingSource::PatternMatch))
    })
}

fn compile_rules(field: &FormField) -> Vec<Regex> {
    field
        .extraction_rules
        .iter()
        .filter_map(|pattern| match Regex::new(pattern) {
            Ok(regex) => Some(regex),
            Err(error) => {
                warn!(field = %field.name, %error, "skipping invalid extraction rule");
                None
            }
        })
        .collect()
}

pub(crate) fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
