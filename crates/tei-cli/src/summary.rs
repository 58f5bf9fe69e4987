use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use tei_schema::{AttributeConstraint, AttributeType, ContentModel};
use tei_validate::Fix;

use crate::commands::{ApplyResult, CandidateResult, SchemaResult, ValidateResult};

pub fn print_schema_summary(result: &SchemaResult) {
    println!("Schema: {}", result.schema.display());
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Tag"),
        header_cell("Required"),
        header_cell("Optional"),
        header_cell("Content"),
    ]);
    apply_table_style(&mut table);
    for (name, constraint) in &result.constraints.tags {
        table.add_row(vec![
            Cell::new(name).fg(Color::Cyan),
            Cell::new(attribute_list(&constraint.required)),
            Cell::new(attribute_list(&constraint.optional)),
            Cell::new(content_label(&constraint.content)),
        ]);
    }
    println!("{table}");
}

pub fn print_validate_summary(result: &ValidateResult) {
    println!("Document: {}", result.document.display());
    if let Some(path) = &result.report_path {
        println!("Report: {}", path.display());
    }
    print_candidate_table(&result.candidates);
}

pub fn print_apply_summary(result: &ApplyResult) {
    println!("Document: {}", result.document.display());
    println!("Output: {}", result.output.display());
    if let Some(path) = &result.report_path {
        println!("Report: {}", path.display());
    }
    println!(
        "Applied {} of {} candidates (revision {})",
        result.outcome.applied.len(),
        result.outcome.applied.len() + result.failed.len(),
        result.outcome.revision
    );
    if !result.failed.is_empty() {
        print_candidate_table(&result.failed);
    }
}

fn print_candidate_table(candidates: &[CandidateResult]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Candidate"),
        header_cell("Valid"),
        header_cell("Errors"),
        header_cell("Warnings"),
        header_cell("Issues"),
        header_cell("Suggested fixes"),
    ]);
    apply_results_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    let mut total_errors = 0usize;
    let mut total_warnings = 0usize;
    for candidate in candidates {
        let report = &candidate.report;
        total_errors += report.error_count();
        total_warnings += report.warning_count();
        let mut issues: Vec<String> = report
            .errors
            .iter()
            .map(|issue| format!("{}: {}", issue.code, issue.message))
            .collect();
        issues.extend(report.warnings.iter().map(|warning| warning.message.clone()));
        let fixes: Vec<String> = report.fixes.iter().map(fix_label).collect();
        table.add_row(vec![
            Cell::new(&candidate.subject),
            valid_cell(report.valid),
            count_cell(report.error_count(), Color::Red),
            count_cell(report.warning_count(), Color::Yellow),
            Cell::new(issues.join("\n")),
            Cell::new(fixes.join("\n")),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        count_cell(total_errors, Color::Red).add_attribute(Attribute::Bold),
        count_cell(total_warnings, Color::Yellow).add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
    ]);
    println!("{table}");
}

fn attribute_list(attributes: &[AttributeConstraint]) -> String {
    if attributes.is_empty() {
        return "-".to_string();
    }
    attributes
        .iter()
        .map(|attribute| format!("{} ({})", attribute.name, type_label(&attribute.value_type)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn type_label(value_type: &AttributeType) -> String {
    match value_type {
        AttributeType::Str => "string".to_string(),
        AttributeType::Boolean => "boolean".to_string(),
        AttributeType::IdRef => "IDREF".to_string(),
        AttributeType::Enumeration(values) => values.join("|"),
    }
}

fn content_label(content: &ContentModel) -> String {
    match content {
        ContentModel::Empty => "empty".to_string(),
        ContentModel::TextOnly => "text".to_string(),
        ContentModel::ElementsOnly(children) => children.join(", "),
        ContentModel::Mixed(children) => format!("text + {}", children.join(", ")),
    }
}

fn fix_label(fix: &Fix) -> String {
    match fix {
        Fix::AddAttribute {
            attribute,
            suggested_values,
        } => format!("add {attribute}: {}", suggested_values.join(", ")),
        Fix::ChangeAttribute {
            attribute,
            suggested_values,
        } => format!("change {attribute}: {}", suggested_values.join(", ")),
        Fix::CreateEntity {
            kind,
            suggested_name,
        } => format!("create {kind} \"{suggested_name}\""),
    }
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn valid_cell(valid: bool) -> Cell {
    if valid {
        Cell::new("✓")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold)
    } else {
        Cell::new("✗").fg(Color::Red).add_attribute(Attribute::Bold)
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn dim_cell(value: impl ToString) -> Cell {
    Cell::new(value.to_string()).add_attribute(Attribute::Dim)
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_results_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(165);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}
