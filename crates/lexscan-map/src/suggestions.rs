//! Suggestions for fields the strategies could not fill with confidence.

use std::sync::LazyLock;

use lexscan_model::{EntityKind, FieldSuggestion, FormSchema, MappingResult};
use regex::Regex;

use crate::dates::gregorian_iso;
use crate::strategies::{Context, amendment_in_title};

static REFERENCE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2,4}-\d{1,4}").expect("Invalid reference number regex"));

const VERSION_FIELD: &str = "version";
/// An amending text is assumed to produce the second version of the amended one.
const AMENDED_VERSION: &str = "2";

pub(crate) fn suggest(
    ctx: &Context<'_>,
    schema: &FormSchema,
    result: &MappingResult,
) -> Vec<FieldSuggestion> {
    let mut suggestions = Vec::new();

    if schema.field(VERSION_FIELD).is_some()
        && result.field(VERSION_FIELD).is_none()
        && let Some(suggestion) = suggest_version(ctx)
    {
        suggestions.push(suggestion);
    }

    for field in result.missing_required(schema) {
        let found = match field {
            "institution" => suggest_institution(ctx),
            "number" => suggest_number(ctx),
            "type" => suggest_type(ctx),
            "date_gregorian" => suggest_date(ctx),
            _ => None,
        };
        suggestions.extend(found);
    }
    suggestions
}

fn suggestion(field: &str, value: impl Into<String>, reason: String, confidence: f32) -> FieldSuggestion {
    FieldSuggestion {
        field_name: field.to_string(),
        suggested_value: value.into(),
        reason,
        confidence: confidence.clamp(0.0, 1.0),
    }
}

fn suggest_version(ctx: &Context<'_>) -> Option<FieldSuggestion> {
    let (start, end) = amendment_in_title(ctx)?;
    let phrase = ctx.input.text[start..end].trim();
    let amended = ctx
        .entities(EntityKind::Reference)
        .find(|entity| entity.span.start >= start)
        .map(|entity| entity.value.as_str());
    let reason = match amended {
        Some(reference) => format!("title '{phrase}' amends {reference}"),
        None => format!("title contains the amendment phrase '{phrase}'"),
    };
    Some(suggestion(VERSION_FIELD, AMENDED_VERSION, reason, 0.6))
}

/// Closest known institution whose similarity fell below the mapping threshold.
fn suggest_institution(ctx: &Context<'_>) -> Option<FieldSuggestion> {
    let institutions = ctx.catalog.institutions();
    let mut best: Option<(f32, &str, &str)> = None;
    for entity in ctx.entities(EntityKind::Institution) {
        let Some(found) = institutions.resolve(&entity.value) else {
            continue;
        };
        if found.score < ctx.options.suggestion_min_similarity {
            continue;
        }
        if best.is_none_or(|(score, _, _)| found.score > score) {
            best = Some((
                found.score,
                found.institution.canonical.as_str(),
                entity.value.as_str(),
            ));
        }
    }
    best.map(|(score, canonical, raw)| {
        suggestion(
            "institution",
            canonical,
            format!("'{raw}' resembles a known institution (similarity {score:.2})"),
            score,
        )
    })
}

fn suggest_number(ctx: &Context<'_>) -> Option<FieldSuggestion> {
    ctx.entities(EntityKind::Reference).find_map(|entity| {
        REFERENCE_NUMBER.find(&entity.value).map(|number| {
            suggestion(
                "number",
                number.as_str(),
                format!("number cited in reference '{}'", entity.value),
                0.4,
            )
        })
    })
}

fn suggest_type(ctx: &Context<'_>) -> Option<FieldSuggestion> {
    ctx.template.map(|template| {
        suggestion(
            "type",
            template.type_name.clone(),
            format!("document identified as {}", template.id),
            0.6,
        )
    })
}

fn suggest_date(ctx: &Context<'_>) -> Option<FieldSuggestion> {
    let vocabulary = ctx.catalog.vocabulary();
    ctx.entities(EntityKind::Date)
        .find(|entity| gregorian_iso(entity, vocabulary).is_none())
        .map(|entity| {
            suggestion(
                "date_gregorian",
                entity.value.clone(),
                "date found but not recognized as a Gregorian calendar date".to_string(),
                0.3,
            )
        })
}
