//! Required field presence.

use lexscan_model::{FormSchema, MappingResult};

use crate::issue::Issue;

/// Required schema fields without a non-blank mapped value.
pub fn check(result: &MappingResult, schema: &FormSchema) -> Vec<Issue> {
    schema
        .required_fields()
        .filter(|field| {
            result
                .value(&field.name)
                .is_none_or(|value| value.trim().is_empty())
        })
        .map(|field| Issue::RequiredMissing {
            field: field.name.clone(),
        })
        .collect()
}
