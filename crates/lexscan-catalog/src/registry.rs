#![deny(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use lexscan_model::{DocumentTypeId, EntityKind, FormSchema};
use rapidfuzz::distance::jaro_winkler;
use regex::Regex;
use tracing::{debug, info};

use crate::embedded;
use crate::error::{CatalogError, Result};
use crate::hash::sources_digest;
use crate::institutions::InstitutionList;
use crate::manifest::{CatalogFile, EntityPatternDef, TemplateDef};
use crate::pattern::{
    EntityPattern, INSTITUTION_FRAGMENT_CONFIDENCE, LangTag, PatternRule, fragment_pattern,
};
use crate::rules::{RuleKind, ValidationRule};
use crate::template::{DocumentTypeTemplate, FieldPatterns};
use crate::text::normalize_key;
use crate::vocabulary::Vocabulary;

pub const CATALOG_FILE: &str = "catalog.toml";
pub const VOCABULARY_FILE: &str = "vocabulary.toml";
pub const INSTITUTIONS_FILE: &str = "institutions.csv";

const CATALOG_SCHEMA: &str = "lexscan.document-catalog";
const CATALOG_SCHEMA_VERSION: u32 = 1;

/// Minimum Jaro-Winkler similarity for fuzzy template name lookup.
pub const NAME_SIMILARITY_THRESHOLD: f32 = 0.88;

/// Raw catalog sources, as embedded or read from a directory.
#[derive(Debug, Clone, Copy)]
pub struct CatalogSources<'a> {
    pub catalog: &'a str,
    pub vocabulary: &'a str,
    pub institutions: &'a str,
}

impl CatalogSources<'static> {
    pub fn embedded() -> Self {
        Self {
            catalog: embedded::CATALOG_TOML,
            vocabulary: embedded::VOCABULARY_TOML,
            institutions: embedded::INSTITUTIONS_CSV,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CatalogSummary {
    pub origin: String,
    pub version: String,
    pub digest: String,
    pub template_count: usize,
    pub schema_count: usize,
    pub identifying_pattern_count: usize,
    pub entity_pattern_count: usize,
    pub validation_rule_count: usize,
    pub institution_count: usize,
    pub gregorian_month_count: usize,
    pub hijri_month_count: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct TemplateMatch<'a> {
    pub template: &'a DocumentTypeTemplate,
    pub score: f32,
}

/// Read-only registry of document type templates.
///
/// Templates stay in declaration order; that order breaks every tie during
/// type detection and name lookup. Reloading means building a new catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    origin: String,
    version: String,
    digest: String,
    schema_names: Vec<String>,
    templates: Vec<DocumentTypeTemplate>,
    vocabulary: Vocabulary,
    institutions: InstitutionList,
}

impl Catalog {
    pub fn load_embedded() -> Result<Self> {
        Self::from_sources(CatalogSources::embedded(), "embedded")
    }

    /// Load `catalog.toml`, `vocabulary.toml` and `institutions.csv` from `dir`.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let catalog = read_source(&dir.join(CATALOG_FILE))?;
        let vocabulary = read_source(&dir.join(VOCABULARY_FILE))?;
        let institutions = read_source(&dir.join(INSTITUTIONS_FILE))?;
        Self::from_sources(
            CatalogSources {
                catalog: &catalog,
                vocabulary: &vocabulary,
                institutions: &institutions,
            },
            &dir.display().to_string(),
        )
    }

    pub fn from_sources(sources: CatalogSources<'_>, origin: &str) -> Result<Self> {
        let vocabulary =
            Vocabulary::parse(sources.vocabulary, &format!("{origin}/{VOCABULARY_FILE}"))?;
        let institutions = InstitutionList::parse_csv(
            sources.institutions,
            &format!("{origin}/{INSTITUTIONS_FILE}"),
        )?;

        let file: CatalogFile =
            toml::from_str(sources.catalog).map_err(|source| CatalogError::Toml {
                origin: format!("{origin}/{CATALOG_FILE}"),
                source,
            })?;
        let header = &file.catalog;
        if header.schema != CATALOG_SCHEMA || header.schema_version != CATALOG_SCHEMA_VERSION {
            return Err(CatalogError::UnsupportedSchema {
                origin: format!("{origin}/{CATALOG_FILE}"),
                found: format!("{} v{}", header.schema, header.schema_version),
                expected: CATALOG_SCHEMA,
                version: CATALOG_SCHEMA_VERSION,
            });
        }
        if header.version.trim().is_empty() {
            return Err(CatalogError::invalid("catalog version is empty"));
        }

        let schemas = compile_schemas(&file.schemas)?;
        let entity_sets = compile_entity_sets(&file, &vocabulary)?;

        let mut templates: Vec<DocumentTypeTemplate> = Vec::with_capacity(file.templates.len());
        let mut seen = BTreeSet::new();
        for def in &file.templates {
            let template = build_template(def, &schemas, &entity_sets, &vocabulary)?;
            if !seen.insert(template.id.clone()) {
                return Err(CatalogError::DuplicateTemplate {
                    id: template.id.to_string(),
                });
            }
            debug!(
                template = %template.id,
                identifying = template.identifying_patterns.len(),
                entity_patterns = template.entity_patterns.len(),
                rules = template.validation_rules.len(),
                "template compiled"
            );
            templates.push(template);
        }
        if templates.is_empty() {
            return Err(CatalogError::invalid("catalog declares no templates"));
        }

        let catalog = Self {
            origin: origin.to_string(),
            version: header.version.trim().to_string(),
            digest: sources_digest(&[sources.catalog, sources.vocabulary, sources.institutions]),
            schema_names: schemas.keys().cloned().collect(),
            templates,
            vocabulary,
            institutions,
        };
        info!(
            origin,
            version = %catalog.version,
            digest = %&catalog.digest[..12],
            templates = catalog.templates.len(),
            institutions = catalog.institutions.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// SHA-256 (hex) over the catalog, vocabulary and institutions sources.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Templates in declaration order.
    pub fn templates(&self) -> &[DocumentTypeTemplate] {
        &self.templates
    }

    pub fn template(&self, id: &DocumentTypeId) -> Option<&DocumentTypeTemplate> {
        self.templates.iter().find(|template| &template.id == id)
    }

    /// Exact lookup by id string; malformed ids find nothing.
    pub fn template_by_id(&self, id: &str) -> Option<&DocumentTypeTemplate> {
        DocumentTypeId::new(id)
            .ok()
            .and_then(|id| self.template(&id))
    }

    /// Fuzzy lookup by type name, alias or id.
    ///
    /// A normalized exact match wins outright; otherwise the highest Jaro-Winkler
    /// similarity at or above [`NAME_SIMILARITY_THRESHOLD`], earlier templates
    /// winning ties.
    pub fn find_by_name(&self, name: &str) -> Option<TemplateMatch<'_>> {
        let key = normalize_key(name);
        if key.is_empty() {
            return None;
        }
        if let Some(template) = self
            .templates
            .iter()
            .find(|template| template.name_keys().iter().any(|k| *k == key))
        {
            return Some(TemplateMatch {
                template,
                score: 1.0,
            });
        }

        let mut best: Option<TemplateMatch<'_>> = None;
        for template in &self.templates {
            let score = template
                .name_keys()
                .iter()
                .map(|k| jaro_winkler::similarity(key.chars(), k.chars()) as f32)
                .fold(0.0_f32, f32::max);
            if best.is_none_or(|current| score > current.score) {
                best = Some(TemplateMatch { template, score });
            }
        }
        best.filter(|m| m.score >= NAME_SIMILARITY_THRESHOLD)
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn institutions(&self) -> &InstitutionList {
        &self.institutions
    }

    pub fn schema_names(&self) -> &[String] {
        &self.schema_names
    }

    pub fn summary(&self) -> CatalogSummary {
        CatalogSummary {
            origin: self.origin.clone(),
            version: self.version.clone(),
            digest: self.digest.clone(),
            template_count: self.templates.len(),
            schema_count: self.schema_names.len(),
            identifying_pattern_count: self
                .templates
                .iter()
                .map(|t| t.identifying_patterns.len())
                .sum(),
            entity_pattern_count: self.templates.iter().map(|t| t.entity_patterns.len()).sum(),
            validation_rule_count: self.templates.iter().map(|t| t.validation_rules.len()).sum(),
            institution_count: self.institutions.len(),
            gregorian_month_count: self.vocabulary.gregorian_months().len(),
            hijri_month_count: self.vocabulary.hijri_months().len(),
        }
    }
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| CatalogError::io(PathBuf::from(path), source))
}

struct CompiledSchema {
    schema: FormSchema,
    field_patterns: BTreeMap<String, FieldPatterns>,
}

fn compile_schemas(defs: &[FormSchema]) -> Result<BTreeMap<String, CompiledSchema>> {
    let mut out = BTreeMap::new();
    for schema in defs {
        schema.validate()?;
        let mut field_patterns = BTreeMap::new();
        for field in schema.fields() {
            let context =
                |what: &str| format!("schema {} field {} {what}", schema.name, field.name);
            let extraction = field
                .extraction_rules
                .iter()
                .map(|pattern| {
                    Regex::new(pattern).map_err(|source| CatalogError::InvalidPattern {
                        context: context("extraction rule"),
                        source,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            let validation = field
                .validation
                .as_deref()
                .map(|pattern| {
                    Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
                        CatalogError::InvalidPattern {
                            context: context("validation"),
                            source,
                        }
                    })
                })
                .transpose()?;
            if !extraction.is_empty() || validation.is_some() {
                field_patterns.insert(
                    field.name.clone(),
                    FieldPatterns {
                        extraction,
                        validation,
                    },
                );
            }
        }
        let name = schema.name.clone();
        let compiled = CompiledSchema {
            schema: schema.clone(),
            field_patterns,
        };
        if out.insert(name.clone(), compiled).is_some() {
            return Err(CatalogError::invalid(format!("duplicate schema {name}")));
        }
    }
    Ok(out)
}

fn compile_entity_pattern(
    def: &EntityPatternDef,
    vocabulary: &Vocabulary,
    context: &str,
) -> Result<EntityPattern> {
    let lang = LangTag::parse(def.lang.as_deref())?;
    Ok(EntityPattern {
        kind: def.kind,
        rule: PatternRule::compile(&def.pattern, def.confidence, lang, vocabulary, context)?,
    })
}

fn compile_entity_sets(
    file: &CatalogFile,
    vocabulary: &Vocabulary,
) -> Result<BTreeMap<String, Vec<EntityPattern>>> {
    let mut out = BTreeMap::new();
    for set in &file.entity_sets {
        let patterns = set
            .patterns
            .iter()
            .enumerate()
            .map(|(idx, def)| {
                let context = format!("entity set {} #{}", set.name, idx + 1);
                compile_entity_pattern(def, vocabulary, &context)
            })
            .collect::<Result<Vec<_>>>()?;
        if out.insert(set.name.clone(), patterns).is_some() {
            return Err(CatalogError::invalid(format!(
                "duplicate entity set {}",
                set.name
            )));
        }
    }
    Ok(out)
}

fn build_template(
    def: &TemplateDef,
    schemas: &BTreeMap<String, CompiledSchema>,
    entity_sets: &BTreeMap<String, Vec<EntityPattern>>,
    vocabulary: &Vocabulary,
) -> Result<DocumentTypeTemplate> {
    let id = DocumentTypeId::new(&def.id)?;
    if id.is_unknown() {
        return Err(CatalogError::invalid(format!(
            "template id {:?} is reserved",
            DocumentTypeId::UNKNOWN
        )));
    }
    if def.type_name.trim().is_empty() {
        return Err(CatalogError::invalid(format!(
            "template {id} has no type name"
        )));
    }
    let compiled = schemas
        .get(&def.schema)
        .ok_or_else(|| CatalogError::UnknownSchema {
            template: id.to_string(),
            schema: def.schema.clone(),
        })?;

    if def.identifying_patterns.is_empty() {
        return Err(CatalogError::invalid(format!(
            "template {id} has no identifying patterns"
        )));
    }
    let identifying_patterns = def
        .identifying_patterns
        .iter()
        .enumerate()
        .map(|(idx, p)| {
            let lang = LangTag::parse(p.lang.as_deref())?;
            PatternRule::compile(
                &p.pattern,
                p.confidence,
                lang,
                vocabulary,
                &format!("template {id} identifying pattern #{}", idx + 1),
            )
        })
        .collect::<Result<Vec<_>>>()?;

    let mut entity_patterns = Vec::new();
    if let Some(pattern) = fragment_pattern(&def.institution_patterns) {
        entity_patterns.push(EntityPattern {
            kind: EntityKind::Institution,
            rule: PatternRule::compile(
                &pattern,
                INSTITUTION_FRAGMENT_CONFIDENCE,
                LangTag::Any,
                vocabulary,
                &format!("template {id} institution patterns"),
            )?,
        });
    }
    for (idx, p) in def.entity_patterns.iter().enumerate() {
        entity_patterns.push(compile_entity_pattern(
            p,
            vocabulary,
            &format!("template {id} entity pattern #{}", idx + 1),
        )?);
    }
    for set in &def.entity_sets {
        let patterns = entity_sets
            .get(set)
            .ok_or_else(|| CatalogError::UnknownEntitySet {
                template: id.to_string(),
                set: set.clone(),
            })?;
        entity_patterns.extend(patterns.iter().cloned());
    }

    let validation_rules = def
        .validation_rules
        .iter()
        .map(|rule| {
            if compiled.schema.field(&rule.field).is_none() {
                return Err(CatalogError::UnknownField {
                    template: id.to_string(),
                    field: rule.field.clone(),
                });
            }
            let kind =
                RuleKind::parse(&rule.rule).map_err(|message| CatalogError::InvalidRule {
                    template: id.to_string(),
                    rule: rule.rule.clone(),
                    message,
                })?;
            Ok(ValidationRule {
                field: rule.field.clone(),
                rule: kind,
                source: rule.rule.clone(),
                message: rule.message.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut template = DocumentTypeTemplate {
        id,
        type_name: def.type_name.trim().to_string(),
        aliases: def.aliases.clone(),
        identifying_patterns,
        entity_patterns,
        form_schema: compiled.schema.clone(),
        institution_patterns: def.institution_patterns.clone(),
        validation_rules,
        field_patterns: compiled.field_patterns.clone(),
        name_keys: Vec::new(),
    };
    template.build_name_keys();
    Ok(template)
}
