use std::collections::BTreeSet;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use elt_model::{CellValue, Severity};
use elt_validate::{VirtualCell, VirtualLine};
use elt_cli::pipeline::{CheckReport, MatchOutcome, ReportedIssue};

pub fn print_check_report(report: &CheckReport) {
    let summary = &report.summary;
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Rule rows"),
        header_cell("With issues"),
        header_cell("Errors"),
        header_cell("Warnings"),
        header_cell("Coverage"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 0..4 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    align_column(&mut table, 4, CellAlignment::Center);
    table.add_row(vec![
        Cell::new(summary.rows),
        Cell::new(summary.rows_with_issues),
        count_cell(report.error_count(), Color::Red),
        count_cell(report.warning_count(), Color::Yellow),
        if summary.coverage_checked {
            Cell::new("✓").fg(Color::Green).add_attribute(Attribute::Bold)
        } else {
            dim_cell("skipped")
        },
    ]);
    println!("{table}");
    print_issue_table(&report.issues);
}

fn print_issue_table(issues: &[ReportedIssue]) {
    if issues.is_empty() {
        return;
    }
    let mut ordered: Vec<&ReportedIssue> = issues.iter().collect();
    ordered.sort_by_key(|reported| severity_rank(reported.issue.severity()));

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Severity"),
        header_cell("Rule"),
        header_cell("Category"),
        header_cell("Location"),
        header_cell("Column"),
        header_cell("Message"),
    ]);
    apply_issue_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Center);
    align_column(&mut table, 1, CellAlignment::Center);
    for reported in ordered {
        let issue = &reported.issue;
        table.add_row(vec![
            severity_cell(issue.severity()),
            Cell::new(issue.rule_id()),
            Cell::new(issue.category().label()),
            Cell::new(reported.location.to_string()),
            reported
                .column
                .as_deref()
                .map_or_else(|| dim_cell("-"), Cell::new),
            Cell::new(issue.message()),
        ]);
    }
    println!();
    println!("Issues:");
    println!("{table}");
}

pub fn print_match(outcome: &MatchOutcome) {
    println!("Matched rule {}", outcome.rule + 1);

    let mut columns: Vec<&String> = outcome
        .group
        .rows()
        .flat_map(|row| row.fields.keys())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    columns.sort_by(|a, b| outcome.label(a).cmp(outcome.label(b)));
    let mut table = Table::new();
    let mut header = vec![header_cell("Step")];
    header.extend(columns.iter().map(|column| header_cell(outcome.label(column))));
    table.set_header(header);
    apply_table_style(&mut table);
    for (step, row) in outcome.group.rows().enumerate() {
        let mut cells = vec![if step == 0 {
            Cell::new("root").add_attribute(Attribute::Bold)
        } else {
            Cell::new(step + 1)
        }];
        cells.extend(
            columns
                .iter()
                .map(|column| value_cell(row.fields.get(*column))),
        );
        table.add_row(cells);
    }
    println!("{table}");
    print_virtual_lines(&outcome.virtual_lines);
}

fn print_virtual_lines(lines: &[VirtualLine]) {
    if lines.is_empty() {
        return;
    }
    let fields: BTreeSet<&String> = lines.iter().flat_map(|line| line.fields.keys()).collect();
    let mut table = Table::new();
    table.set_header(fields.iter().map(|field| header_cell(field)).collect::<Vec<_>>());
    apply_table_style(&mut table);
    for line in lines {
        table.add_row(
            fields
                .iter()
                .map(|field| match line.fields.get(*field) {
                    Some(VirtualCell::Value(value)) => Cell::new(value),
                    Some(VirtualCell::Invalid { .. }) => Cell::new("<missing>")
                        .fg(Color::Red)
                        .add_attribute(Attribute::Bold),
                    None => dim_cell("-"),
                })
                .collect::<Vec<_>>(),
        );
    }
    println!();
    println!("Lines:");
    println!("{table}");
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
        .set_content_arrangement(ContentArrangement::Dynamic);
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
        Severity::Error => Cell::new("ERROR").fg(Color::Red),
        Severity::Warning => Cell::new("WARN").fg(Color::Yellow),
    }
}

fn severity_rank(severity: Severity) -> u8 {
    match severity {
        Severity::Error => 0,
        Severity::Warning => 1,
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn value_cell(value: Option<&CellValue>) -> Cell {
    match value {
        Some(value) if !value.is_blank() => Cell::new(value),
        _ => dim_cell("-"),
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
