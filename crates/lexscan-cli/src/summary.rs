use std::collections::BTreeMap;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use lexscan_catalog::{Catalog, CatalogSummary};
use lexscan_model::{ConfidenceLevel, ReviewItem, ReviewStatus};
use lexscan_validate::{Issue, Severity, ValidationReport};

use lexscan_cli::pipeline::BatchOutcome;

pub fn print_templates(catalog: &Catalog) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Id"),
        header_cell("Type"),
        header_cell("Aliases"),
        header_cell("Schema"),
        header_cell("Required"),
        header_cell("Rules"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 4, CellAlignment::Right);
    align_column(&mut table, 5, CellAlignment::Right);
    for template in catalog.templates() {
        let aliases = if template.aliases.is_empty() {
            dim_cell("-")
        } else {
            Cell::new(template.aliases.join(", "))
        };
        table.add_row(vec![
            Cell::new(template.id.as_str())
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(&template.type_name),
            aliases,
            Cell::new(&template.form_schema.name),
            Cell::new(template.form_schema.required_count()),
            Cell::new(template.validation_rules.len()),
        ]);
    }
    println!("{table}");
}

pub fn print_catalog(summary: &CatalogSummary) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Catalog"), header_cell("Value")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    let rows: [(&str, String); 11] = [
        ("Origin", summary.origin.clone()),
        ("Version", summary.version.clone()),
        ("Digest", summary.digest.clone()),
        ("Templates", summary.template_count.to_string()),
        ("Schemas", summary.schema_count.to_string()),
        (
            "Identifying patterns",
            summary.identifying_pattern_count.to_string(),
        ),
        ("Entity patterns", summary.entity_pattern_count.to_string()),
        ("Validation rules", summary.validation_rule_count.to_string()),
        ("Institutions", summary.institution_count.to_string()),
        ("Gregorian months", summary.gregorian_month_count.to_string()),
        ("Hijri months", summary.hijri_month_count.to_string()),
    ];
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    println!("{table}");
}

/// Mapped fields per confidence band, highest first.
pub fn print_confidence_bands(counts: &BTreeMap<ConfidenceLevel, usize>) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Band"),
        header_cell("Meaning"),
        header_cell("Fields"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for level in [
        ConfidenceLevel::High,
        ConfidenceLevel::Medium,
        ConfidenceLevel::Low,
    ] {
        let count = counts.get(&level).copied().unwrap_or(0);
        table.add_row(vec![
            level_cell(level),
            dim_cell(level.description()),
            Cell::new(count),
        ]);
    }
    eprintln!("{table}");
}

fn level_cell(level: ConfidenceLevel) -> Cell {
    match level {
        ConfidenceLevel::High => Cell::new("HIGH").fg(Color::Green),
        ConfidenceLevel::Medium => Cell::new("MEDIUM").fg(Color::Yellow),
        ConfidenceLevel::Low => Cell::new("LOW").fg(Color::Red),
    }
}

pub fn print_issues(report: &ValidationReport) {
    if report.is_empty() {
        eprintln!("Validation: no issues");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Severity"),
        header_cell("Field"),
        header_cell("Code"),
        header_cell("Message"),
    ]);
    apply_issue_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Center);
    for issue in report.sorted_by_severity() {
        table.add_row(issue_row(issue));
    }
    eprintln!("Validation ({}):", report.schema);
    eprintln!("{table}");
}

fn issue_row(issue: &Issue) -> Vec<Cell> {
    vec![
        severity_cell(issue.severity()),
        Cell::new(issue.field()),
        Cell::new(issue.code()),
        Cell::new(issue.message()),
    ]
}

pub fn print_batch(outcome: &BatchOutcome) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("File"),
        header_cell("Type"),
        header_cell("Confidence"),
        header_cell("OCR"),
        header_cell("Fields"),
        header_cell("Unmapped"),
        header_cell("Status"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 2..=5 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    align_column(&mut table, 6, CellAlignment::Center);
    for item in &outcome.items {
        table.add_row(item_row(item));
    }
    let pending = outcome.pending().count();
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(format!("{} documents", outcome.items.len())).add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
        Cell::new(format!("{} approved / {pending} pending", outcome.approved.len()))
            .add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
}

fn item_row(item: &ReviewItem) -> Vec<Cell> {
    let result = &item.mapping_result;
    let document_type = if item.document_type.is_unknown() {
        dim_cell(item.document_type.as_str())
    } else {
        Cell::new(item.document_type.as_str())
    };
    let ocr = match item.ocr_confidence {
        Some(value) => Cell::new(format!("{value:.2}")),
        None => dim_cell("-"),
    };
    vec![
        Cell::new(&item.original_document.filename),
        document_type,
        Cell::new(format!("{:.2}", result.overall_confidence)),
        ocr,
        Cell::new(result.mapped_fields.len()),
        count_cell(result.unmapped_data.len(), Color::Yellow),
        status_cell(item.status),
    ]
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn apply_issue_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(160);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn severity_cell(severity: Severity) -> Cell {
    match severity {
        Severity::Error => Cell::new("ERROR")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        Severity::Warning => Cell::new("WARN").fg(Color::Yellow),
    }
}

fn status_cell(status: ReviewStatus) -> Cell {
    let color = match status {
        ReviewStatus::Approved => Color::Green,
        ReviewStatus::Rejected => Color::Red,
        ReviewStatus::Pending | ReviewStatus::UnderReview => Color::Yellow,
    };
    Cell::new(status.as_str()).fg(color)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
