use std::path::Path;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use dpm_cli::types::{BuildResult, MergeResult, SplitCounts};
use dpm_shard::{ShardReport, ShardStats};

pub fn print_build_summary(result: &BuildResult) {
    println!("Input: {}", result.input_dir.display());
    println!("Output: {}", result.output_dir.display());
    println!("Shard: {}", result.shard_path.display());
    println!("Manifest: {}", result.manifest_path.display());

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Stream"),
        header_cell("Category"),
        header_cell("Events"),
        header_cell("Merged"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for (index, (category, events)) in result.categories.iter().enumerate() {
        let merged = result.merge.per_stream.get(index).copied().unwrap_or(0);
        table.add_row(vec![
            dim_cell(index),
            Cell::new(category.as_str())
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            count_cell(*events),
            count_cell(merged),
        ]);
    }
    let total: usize = result.categories.iter().map(|(_, events)| events).sum();
    table.add_row(vec![
        dim_cell("-"),
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(total).add_attribute(Attribute::Bold),
        Cell::new(result.merge.events).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");

    print_key_values("Shard", &report_rows(&result.report));
    print_stats(&result.stats);
    if let Some(counts) = result.split {
        print_key_values("Split", &split_rows(counts));
    }
}

pub fn print_merge_summary(result: &MergeResult) {
    println!("Output: {}", result.output.display());
    print_key_values(
        "Merge",
        &[
            ("Events", result.events.to_string()),
            ("Patient groups", result.groups.to_string()),
        ],
    );
}

pub fn print_split_summary(output_dir: &Path, counts: SplitCounts) {
    println!("Output: {}", output_dir.display());
    print_key_values("Split", &split_rows(counts));
}

pub fn print_stats(stats: &ShardStats) {
    print_key_values("Statistics", &stats_rows(stats));
}

fn report_rows(report: &ShardReport) -> Vec<(&'static str, String)> {
    vec![
        ("Patients", report.patients.to_string()),
        ("Codes", report.codes.to_string()),
        ("Codes in samples", report.codes_in_samples.to_string()),
        ("Labels", report.labels.to_string()),
        ("Samples written", report.samples.to_string()),
        ("Labels without history", report.labels_without_history.to_string()),
        ("Labels without events", report.labels_without_events.to_string()),
        ("Samples over record limit", report.samples_over_limit.to_string()),
    ]
}

fn stats_rows(stats: &ShardStats) -> Vec<(&'static str, String)> {
    vec![
        ("Number of samples", stats.samples.to_string()),
        ("Number of patients", stats.patients.to_string()),
        (
            "Average time span (s)",
            format!("{:.1}", stats.average_time_span),
        ),
        ("Max records per sample", stats.max_records.to_string()),
    ]
}

fn split_rows(counts: SplitCounts) -> Vec<(&'static str, String)> {
    vec![
        ("train.shard", counts.train.to_string()),
        ("valid.shard", counts.valid.to_string()),
        ("test.shard", counts.test.to_string()),
    ]
}

fn print_key_values(title: &str, rows: &[(&str, String)]) {
    let mut table = Table::new();
    table.set_header(vec![header_cell(title), header_cell("Value")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    println!();
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
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize) -> Cell {
    if count > 0 {
        Cell::new(count)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(rows: &[(&str, String)]) -> String {
        rows.iter()
            .map(|(label, value)| format!("{label}: {value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn stats_rows_render() {
        let stats = ShardStats {
            samples: 3,
            patients: 2,
            average_time_span: 160.0 / 3.0,
            max_records: 2,
        };
        insta::assert_snapshot!(render(&stats_rows(&stats)), @r"
        Number of samples: 3
        Number of patients: 2
        Average time span (s): 53.3
        Max records per sample: 2
        ");
    }

    #[test]
    fn report_rows_render() {
        let report = ShardReport {
            patients: 3,
            codes: 6,
            codes_in_samples: 4,
            labels: 4,
            samples: 2,
            labels_without_history: 1,
            labels_without_events: 1,
            samples_over_limit: 0,
            max_records: 2,
        };
        insta::assert_snapshot!(render(&report_rows(&report)), @r"
        Patients: 3
        Codes: 6
        Codes in samples: 4
        Labels: 4
        Samples written: 2
        Labels without history: 1
        Labels without events: 1
        Samples over record limit: 0
        ");
    }
}
