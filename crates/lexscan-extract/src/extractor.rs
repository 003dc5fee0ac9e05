//! Template-driven entity extraction.

use std::collections::BTreeMap;
use std::sync::Arc;

use lexscan_catalog::{Catalog, DocumentTypeTemplate, EntityPattern};
use lexscan_model::{
    DocumentStructure, DocumentTypeId, EntityKind, ExtractedEntity, Extraction, Language, Span,
};
use regex::{Captures, Regex};
use tracing::{debug, info, info_span, warn};

use crate::language::detect_language;
use crate::structure;

/// Named group that narrows an entity to part of the match.
const VALUE_GROUP: &str = "value";

/// Recognizes typed entities in document text.
///
/// Pure and deterministic: the same text and catalog always produce the same
/// extraction. Safe to share across threads.
#[derive(Debug, Clone)]
pub struct EntityExtractor {
    catalog: Arc<Catalog>,
}

impl EntityExtractor {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Detect the language (unless given) and the document type (unless
    /// hinted), then run the chosen template's entity patterns.
    ///
    /// A hint naming no template, or a text no template identifies, yields
    /// an `unknown` extraction without entities.
    pub fn extract(
        &self,
        text: &str,
        type_hint: Option<&DocumentTypeId>,
        language: Option<Language>,
    ) -> Extraction {
        let span = info_span!("extract", text_len = text.len());
        let _guard = span.enter();

        let language = language.unwrap_or_else(|| detect_language(text));
        let template = match type_hint {
            Some(hint) => {
                let template = self.catalog.template(hint);
                if template.is_none() {
                    warn!(hint = %hint, "document type hint names no template");
                }
                template
            }
            None => self.detect_type(text, language),
        };

        let Some(template) = template else {
            debug!(%language, "no template identified the document");
            return Extraction::unknown(language);
        };

        let entities = extract_entities(template, text, language);
        info!(
            document_type = %template.id,
            %language,
            entity_count = entities.len(),
            "entities extracted"
        );
        Extraction {
            document_type: template.id.clone(),
            language,
            entities,
        }
    }

    /// Pick the template whose first identifying match starts earliest.
    ///
    /// Equal starts go to the template with more identifying matches, then to
    /// the one declared first.
    pub fn detect_type(&self, text: &str, language: Language) -> Option<&DocumentTypeTemplate> {
        let mut best: Option<(usize, usize, &DocumentTypeTemplate)> = None;
        for template in self.catalog.templates() {
            let Some(hit) = template.identify(text, language) else {
                continue;
            };
            debug!(
                template = %template.id,
                first = hit.first.start,
                matches = hit.matches,
                "template identified"
            );
            let better = best.is_none_or(|(start, matches, _)| {
                hit.first.start < start || (hit.first.start == start && hit.matches > matches)
            });
            if better {
                best = Some((hit.first.start, hit.matches, template));
            }
        }
        best.map(|(_, _, template)| template)
    }

    /// Coarse structure of the text for the extraction's template.
    pub fn analyze(&self, text: &str, extraction: &Extraction) -> DocumentStructure {
        structure::analyze(text, extraction, &self.catalog)
    }
}

/// Run `template`'s entity patterns in declaration order.
///
/// A match overlapping an already accepted entity of the same kind is
/// dropped. Results are ordered by span start, then pattern order.
pub fn extract_entities(
    template: &DocumentTypeTemplate,
    text: &str,
    language: Language,
) -> Vec<ExtractedEntity> {
    let mut accepted: BTreeMap<EntityKind, Vec<Span>> = BTreeMap::new();
    let mut found: Vec<(usize, ExtractedEntity)> = Vec::new();

    for (order, pattern) in template
        .entity_patterns
        .iter()
        .enumerate()
        .filter(|(_, pattern)| pattern.rule.applies_to(language))
    {
        for caps in pattern.rule.regex.captures_iter(text) {
            let Some(entity) = entity_from_captures(pattern, &caps) else {
                continue;
            };
            let spans = accepted.entry(entity.kind).or_default();
            if spans.iter().any(|span| span.overlaps(&entity.span)) {
                continue;
            }
            spans.push(entity.span);
            found.push((order, entity));
        }
    }

    found.sort_by_key(|(order, entity)| (entity.span.start, *order));
    found.into_iter().map(|(_, entity)| entity).collect()
}

fn entity_from_captures(pattern: &EntityPattern, caps: &Captures<'_>) -> Option<ExtractedEntity> {
    let whole = caps.get(0)?;
    let target = caps.name(VALUE_GROUP).unwrap_or(whole);
    let raw = target.as_str();
    let value = collapse_whitespace(raw);
    if value.is_empty() {
        return None;
    }
    let start = target.start() + (raw.len() - raw.trim_start().len());
    let end = target.end() - (raw.len() - raw.trim_end().len());

    let mut entity = ExtractedEntity::new(
        pattern.kind,
        value,
        Span::new(start, end),
        pattern.rule.confidence,
    );
    for name in group_names(&pattern.rule.regex) {
        if let Some(group) = caps.name(name) {
            let group_value = collapse_whitespace(group.as_str());
            if !group_value.is_empty() {
                entity = entity.with_metadata(name, group_value);
            }
        }
    }
    Some(entity)
}

fn group_names(regex: &Regex) -> impl Iterator<Item = &str> {
    regex
        .capture_names()
        .flatten()
        .filter(|name| *name != VALUE_GROUP)
}

pub(crate) fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
