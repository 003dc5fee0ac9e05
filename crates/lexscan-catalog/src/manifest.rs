#![deny(unsafe_code)]

use lexscan_model::{EntityKind, FormSchema};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogFile {
    pub catalog: CatalogHeader,
    #[serde(default, rename = "schema")]
    pub schemas: Vec<FormSchema>,
    #[serde(default, rename = "entity_set")]
    pub entity_sets: Vec<EntitySetDef>,
    #[serde(default, rename = "template")]
    pub templates: Vec<TemplateDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogHeader {
    pub schema: String,
    pub schema_version: u32,
    pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatternDef {
    pub pattern: String,
    pub confidence: f32,
    #[serde(default)]
    pub lang: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityPatternDef {
    pub kind: EntityKind,
    pub pattern: String,
    pub confidence: f32,
    #[serde(default)]
    pub lang: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntitySetDef {
    pub name: String,
    #[serde(default, rename = "pattern")]
    pub patterns: Vec<EntityPatternDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationRuleDef {
    pub field: String,
    pub rule: String,
    /// Empty when the catalog relies on the validator's default wording.
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateDef {
    pub id: String,
    pub type_name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub schema: String,
    #[serde(default)]
    pub identifying_patterns: Vec<PatternDef>,
    #[serde(default)]
    pub entity_patterns: Vec<EntityPatternDef>,
    #[serde(default)]
    pub entity_sets: Vec<String>,
    #[serde(default)]
    pub institution_patterns: Vec<String>,
    #[serde(default)]
    pub validation_rules: Vec<ValidationRuleDef>,
}
