//! Target form schemas that mapped records are shaped after.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ModelError, Result};

/// Input control kind of a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Textarea,
    Select,
    Date,
    Number,
    Checkbox,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Textarea => "textarea",
            FieldKind::Select => "select",
            FieldKind::Date => "date",
            FieldKind::Number => "number",
            FieldKind::Checkbox => "checkbox",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub required: bool,
    /// Regex patterns tried against the raw text when no dedicated strategy applies.
    #[serde(default)]
    pub extraction_rules: Vec<String>,
    /// Regex a mapped value must match in full.
    #[serde(default)]
    pub validation: Option<String>,
    /// Allowed values for `select` fields.
    #[serde(default)]
    pub options: Vec<String>,
}

impl FormField {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            label: None,
            required: false,
            extraction_rules: Vec::new(),
            validation: None,
            options: Vec::new(),
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn with_validation(mut self, pattern: impl Into<String>) -> Self {
        self.validation = Some(pattern.into());
        self
    }

    #[must_use]
    pub fn with_extraction_rule(mut self, pattern: impl Into<String>) -> Self {
        self.extraction_rules.push(pattern.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSection {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    pub fields: Vec<FormField>,
}

/// Ordered set of sections; field names are unique across the whole schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSchema {
    pub name: String,
    pub sections: Vec<FormSection>,
}

impl FormSchema {
    /// Build a schema, rejecting duplicate field names.
    pub fn new(name: impl Into<String>, sections: Vec<FormSection>) -> Result<Self> {
        let schema = Self {
            name: name.into(),
            sections,
        };
        schema.validate()?;
        Ok(schema)
    }

    /// Schema without sections, used for documents of unknown type.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sections: Vec::new(),
        }
    }

    /// Check the field-name uniqueness invariant.
    ///
    /// Deserialized schemas bypass [`FormSchema::new`], so loaders call this explicitly.
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for field in self.fields() {
            if !seen.insert(field.name.as_str()) {
                return Err(ModelError::DuplicateField {
                    schema: self.name.clone(),
                    field: field.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FormField> {
        self.sections.iter().flat_map(|section| section.fields.iter())
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields().find(|field| field.name == name)
    }

    /// A field is required when both it and its section are flagged required.
    pub fn is_required(&self, name: &str) -> bool {
        self.sections.iter().any(|section| {
            section.required
                && section
                    .fields
                    .iter()
                    .any(|field| field.name == name && field.required)
        })
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FormField> {
        self.sections
            .iter()
            .filter(|section| section.required)
            .flat_map(|section| section.fields.iter())
            .filter(|field| field.required)
    }

    pub fn required_count(&self) -> usize {
        self.required_fields().count()
    }
}
