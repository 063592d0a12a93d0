use std::collections::{HashMap, HashSet};

use csv::{QuoteStyle, WriterBuilder};
use report_client::domain::{ReportResult, UsageRecord};
use serde_json::Value;

use crate::pipeline::ExportError;

/// Columns kept in summary mode, in output order.
pub const DEFAULT_SUMMARY_COLUMNS: &[&str] = &[
    "usageStartTime",
    "usageEndTime",
    "resource.id",
    "resource.name",
    "resource.category",
    "quantity",
    "unit",
];

/// Flatten one record into `(column, cell)` pairs.
///
/// Nested objects become dotted columns (`resource.name`), arrays and empty
/// objects are kept as compact JSON, `null` becomes an empty cell. A column
/// name produced twice in one record (a literal `a.b` key next to a nested
/// `a.b` path) gets a `_2`, `_3`, ... suffix on its later occurrences.
pub fn flatten_record(record: &UsageRecord) -> Vec<(String, String)> {
    let mut flat = Vec::new();
    for (key, value) in record.fields() {
        flatten_into(key, value, &mut flat);
    }

    let mut used = HashSet::new();
    let mut out = Vec::with_capacity(flat.len());
    for (name, cell) in flat {
        let mut unique = name.clone();
        let mut n = 2;
        while used.contains(&unique) {
            unique = format!("{name}_{n}");
            n += 1;
        }
        used.insert(unique.clone());
        out.push((unique, cell));
    }
    out
}

fn flatten_into(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, nested) in map {
                flatten_into(&format!("{prefix}.{key}"), nested, out);
            }
        }
        other => out.push((prefix.to_string(), cell_text(other))),
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Serializes a report into CSV text.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    summary_columns: Vec<String>,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self::new(DEFAULT_SUMMARY_COLUMNS.iter().map(|c| c.to_string()).collect())
    }
}

impl CsvExporter {
    pub fn new(summary_columns: Vec<String>) -> Self {
        Self { summary_columns }
    }

    pub fn summary_columns(&self) -> &[String] {
        &self.summary_columns
    }

    fn columns(&self, rows: &[Vec<(String, String)>], detailed: bool) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut all = Vec::new();
        for row in rows {
            for (column, _) in row {
                if seen.insert(column.as_str()) {
                    all.push(column.clone());
                }
            }
        }

        if detailed {
            return all;
        }

        let summary: Vec<String> = self
            .summary_columns
            .iter()
            .filter(|c| seen.contains(c.as_str()))
            .cloned()
            .collect();
        // A report with none of the summary columns is exported in full.
        if summary.is_empty() {
            all
        } else {
            summary
        }
    }

    /// Header row plus one row per item, in item order. An empty report
    /// yields empty text. Records without any fields still get a row; when no
    /// record has a field the output is a single unnamed column.
    pub fn to_csv(&self, report: &ReportResult, detailed: bool) -> Result<String, ExportError> {
        if report.is_empty() {
            return Ok(String::new());
        }

        let rows: Vec<Vec<(String, String)>> = report.items.iter().map(flatten_record).collect();
        let mut columns = self.columns(&rows, detailed);
        if columns.is_empty() {
            columns.push(String::new());
        }

        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Necessary)
            .from_writer(Vec::new());

        writer
            .write_record(&columns)
            .map_err(|e| ExportError::Transform(format!("failed to write CSV header: {e}")))?;

        for row in &rows {
            let cells: HashMap<&str, &str> =
                row.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
            writer
                .write_record(columns.iter().map(|c| cells.get(c.as_str()).copied().unwrap_or("")))
                .map_err(|e| ExportError::Transform(format!("failed to write CSV row: {e}")))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ExportError::Transform(format!("failed to flush CSV output: {e}")))?;
        String::from_utf8(bytes)
            .map_err(|e| ExportError::Transform(format!("CSV output is not UTF-8: {e}")))
    }
}

/// [`CsvExporter::to_csv`] with the default summary columns.
pub fn to_csv(report: &ReportResult, detailed: bool) -> Result<String, ExportError> {
    CsvExporter::default().to_csv(report, detailed)
}
