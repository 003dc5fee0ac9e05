use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use lexscan_catalog::Catalog;
use lexscan_extract::EntityExtractor;
use lexscan_map::FieldMapper;
use lexscan_model::{FormSchema, ReviewItem};
use lexscan_review::{ApprovalWorkflow, JsonLinesSink, MemorySink, RecordSink, UNTYPED_SCHEMA};
use lexscan_validate::validate_with_thresholds;
use serde::Serialize;
use serde_json::json;
use tracing::{info, info_span};

use lexscan_cli::pipeline::{
    BatchOptions, BatchOutcome, process_text, read_input, run_batch,
};

use crate::cli::{DocumentArgs, MapArgs, ProcessArgs};
use crate::summary::{
    print_batch, print_catalog, print_confidence_bands, print_issues, print_templates,
};

pub fn load_catalog(dir: Option<&Path>) -> Result<Arc<Catalog>> {
    let catalog = match dir {
        Some(dir) => {
            Catalog::load_from_dir(dir).with_context(|| format!("load catalog {}", dir.display()))?
        }
        None => Catalog::load_embedded().context("load embedded catalog")?,
    };
    info!(
        origin = catalog.origin(),
        version = catalog.version(),
        templates = catalog.templates().len(),
        "catalog loaded"
    );
    Ok(Arc::new(catalog))
}

pub fn run_templates(catalog: &Catalog) {
    print_templates(catalog);
}

pub fn run_catalog(catalog: &Catalog) {
    print_catalog(&catalog.summary());
}

pub fn run_extract(catalog: Arc<Catalog>, args: &DocumentArgs) -> Result<()> {
    let input = read_input(&args.file)?;
    let extractor = EntityExtractor::new(catalog);
    let extraction = extractor.extract(
        &input.text,
        args.hints.document_type.as_ref(),
        args.hints.language,
    );
    let structure = extractor.analyze(&input.text, &extraction);
    write_json(&json!({
        "filename": input.filename,
        "ocrConfidence": input.ocr_confidence,
        "extraction": extraction,
        "structure": structure,
    }))
}

/// Returns whether the mapping has issues that would block approval.
pub fn run_map(catalog: &Arc<Catalog>, args: &MapArgs) -> Result<bool> {
    let hints = &args.document.hints;
    let input = read_input(&args.document.file)?;
    let span = info_span!("document", filename = %input.filename);
    let _guard = span.enter();

    let extractor = EntityExtractor::new(Arc::clone(catalog));
    let mapper = FieldMapper::new(Arc::clone(catalog));
    let processed = process_text(
        &extractor,
        &mapper,
        &input.text,
        hints.document_type.as_ref(),
        hints.language,
    );
    let template = catalog.template(&processed.extraction.document_type);
    let untyped;
    let schema = match template {
        Some(template) => &template.form_schema,
        None => {
            untyped = FormSchema::empty(UNTYPED_SCHEMA);
            &untyped
        }
    };
    let thresholds = args.bands.thresholds();
    let report = validate_with_thresholds(
        &processed.mapping,
        schema,
        template,
        Utc::now().date_naive(),
        &thresholds,
    );

    write_json(&json!({
        "filename": input.filename,
        "documentType": processed.extraction.document_type,
        "language": processed.extraction.language,
        "ocrConfidence": input.ocr_confidence,
        "mapping": processed.mapping,
        "validation": report,
    }))?;
    print_confidence_bands(&processed.mapping.count_by_level(&thresholds));
    print_issues(&report);
    Ok(report.blocks_approval())
}

pub fn run_process(catalog: Arc<Catalog>, args: &ProcessArgs) -> Result<BatchOutcome> {
    let inputs = args
        .files
        .iter()
        .map(|path| read_input(path.as_path()))
        .collect::<Result<Vec<_>>>()?;

    let sink: Arc<dyn RecordSink> = match &args.output {
        Some(path) => Arc::new(
            JsonLinesSink::append(path)
                .with_context(|| format!("open record output {}", path.display()))?,
        ),
        None => Arc::new(MemorySink::new()),
    };
    let workflow = ApprovalWorkflow::new(Arc::clone(&catalog), sink);
    let extractor = EntityExtractor::new(Arc::clone(&catalog));
    let mapper = FieldMapper::new(catalog);
    let options = BatchOptions {
        type_hint: args.hints.document_type.clone(),
        language: args.hints.language,
        auto_approve: args.auto_approve,
        reviewer: args.reviewer.clone(),
        ..BatchOptions::default()
    };

    let outcome = run_batch(&workflow, &extractor, &mapper, &inputs, &options)
        .context("process documents")?;
    if let Some(path) = &args.queue {
        let pending: Vec<&ReviewItem> = outcome.pending().collect();
        write_json_file(path, &pending)
            .with_context(|| format!("write review queue {}", path.display()))?;
    }
    print_batch(&outcome);
    Ok(outcome)
}

fn write_json<T: Serialize>(value: &T) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value).context("write json")?;
    writeln!(out).context("write json")?;
    Ok(())
}

fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}
