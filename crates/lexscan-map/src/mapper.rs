//! Schema-driven field mapping.

use std::collections::BTreeSet;
use std::sync::Arc;

use lexscan_catalog::{Catalog, DocumentTypeTemplate};
use lexscan_model::{FieldMapping, FormSchema, MappingResult};
use tracing::{debug, info, info_span};

use crate::options::MapperOptions;
use crate::strategies::{self, Candidate, Context, MappingInput};
use crate::suggestions;

/// Maps extracted entities and document structure onto a form schema.
///
/// Never fails: a field without a candidate is simply left unmapped and
/// lowers the overall confidence.
#[derive(Debug, Clone)]
pub struct FieldMapper {
    catalog: Arc<Catalog>,
    options: MapperOptions,
}

impl FieldMapper {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::with_options(catalog, MapperOptions::default())
    }

    pub fn with_options(catalog: Arc<Catalog>, options: MapperOptions) -> Self {
        Self { catalog, options }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn options(&self) -> &MapperOptions {
        &self.options
    }

    /// Map `input` onto an arbitrary schema.
    pub fn map(&self, input: &MappingInput<'_>, schema: &FormSchema) -> MappingResult {
        self.run(input, schema, None)
    }

    /// Map `input` onto the template's own schema, using its precompiled
    /// extraction rules and its type name for suggestions.
    pub fn map_template(
        &self,
        input: &MappingInput<'_>,
        template: &DocumentTypeTemplate,
    ) -> MappingResult {
        self.run(input, &template.form_schema, Some(template))
    }

    fn run(
        &self,
        input: &MappingInput<'_>,
        schema: &FormSchema,
        template: Option<&DocumentTypeTemplate>,
    ) -> MappingResult {
        let span = info_span!("map", schema = %schema.name);
        let _guard = span.enter();

        let ctx = Context {
            input,
            catalog: &self.catalog,
            options: &self.options,
            template,
        };

        let mut result = MappingResult::default();

        for field in schema.fields() {
            let candidate = match strategies::strategy_for(&field.name) {
                Some(entry) => (entry.run)(&ctx, field),
                None => strategies::fallback(&ctx, field),
            };
            let Some(Candidate {
                value,
                confidence,
                source,
            }) = candidate
            else {
                debug!(field = %field.name, "no candidate");
                continue;
            };
            if value.trim().is_empty() {
                continue;
            }
            debug!(field = %field.name, source = source.as_str(), confidence, "field mapped");
            result
                .mapped_fields
                .push(FieldMapping::new(field.name.clone(), value, confidence, source));
        }

        result.unmapped_data = unmapped(input, &result);
        result.suggestions = suggestions::suggest(&ctx, schema, &result);
        result.recompute_confidence(schema);

        info!(
            mapped = result.mapped_fields.len(),
            missing_required = result.missing_required(schema).len(),
            unmapped = result.unmapped_data.len(),
            suggestions = result.suggestions.len(),
            overall_confidence = result.overall_confidence,
            "mapping complete"
        );
        result
    }
}

/// Entity values not contained in any mapped value; deduplicated, in
/// document order.
fn unmapped(input: &MappingInput<'_>, result: &MappingResult) -> Vec<String> {
    let mut seen = BTreeSet::new();
    input
        .entities
        .iter()
        .map(|entity| entity.value.as_str())
        .filter(|value| {
            !result
                .mapped_fields
                .iter()
                .any(|mapped| mapped.value.contains(value))
        })
        .filter(|value| seen.insert(*value))
        .map(str::to_string)
        .collect()
}
