//! Parses an uploaded CSV into a typed in-memory table.

use std::collections::HashSet;
use std::fmt::{self, Write};
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};

use crate::error::ImportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Boolean,
    Integer,
    Real,
    Text,
}

impl ColumnType {
    /// SQLite affinity used when the column is stored.
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Boolean | ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Boolean => "boolean",
            ColumnType::Integer => "integer",
            ColumnType::Real => "real",
            ColumnType::Text => "text",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Boolean(value) => write!(f, "{value}"),
            Cell::Integer(value) => write!(f, "{value}"),
            Cell::Real(value) => write!(f, "{value}"),
            Cell::Text(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Markdown preview of the column types and the first `limit` rows.
    pub fn preview(&self, limit: usize) -> String {
        let mut output = String::new();

        let header: Vec<String> = self
            .columns
            .iter()
            .map(|column| format!("{} ({})", column.name, column.kind))
            .collect();
        let _ = writeln!(output, "| {} |", header.join(" | "));
        let _ = writeln!(output, "|{}", "---|".repeat(self.columns.len()));

        for row in self.rows.iter().take(limit) {
            let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
            let _ = writeln!(output, "| {} |", cells.join(" | "));
        }

        if self.rows.len() > limit {
            let _ = writeln!(output, "... {} more rows", self.rows.len() - limit);
        }

        output
    }
}

pub fn read_csv_path(path: &Path) -> Result<Table, ImportError> {
    let file = std::fs::File::open(path)?;
    read_csv(file)
}

/// Reads a header row and the records below it. Short rows are padded with
/// nulls; rows longer than the header are rejected.
pub fn read_csv<R: Read>(input: R) -> Result<Table, ImportError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(ImportError::EmptyUpload);
    }
    let names = dedupe_names(headers.iter());
    let width = names.len();

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.len() > width {
            return Err(ImportError::RaggedRow {
                line: record.position().map(|p| p.line()).unwrap_or_default(),
                expected: width,
                found: record.len(),
            });
        }

        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        row.resize(width, String::new());
        raw_rows.push(row);
    }

    let kinds: Vec<ColumnType> = (0..width)
        .map(|index| infer_type(raw_rows.iter().map(|row| row[index].as_str())))
        .collect();

    let rows = raw_rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&kinds)
                .map(|(value, kind)| parse_cell(value, *kind))
                .collect()
        })
        .collect();

    let columns = names
        .into_iter()
        .zip(kinds)
        .map(|(name, kind)| Column { name, kind })
        .collect();

    Ok(Table { columns, rows })
}

/// Picks the narrowest type every non-empty value fits. A column with no
/// values at all is numeric.
fn infer_type<'a>(values: impl Iterator<Item = &'a str>) -> ColumnType {
    let mut kind: Option<ColumnType> = None;

    for value in values.filter(|v| !v.is_empty()) {
        let fits = if parse_bool(value).is_some() {
            ColumnType::Boolean
        } else if value.parse::<i64>().is_ok() {
            ColumnType::Integer
        } else if value.parse::<f64>().is_ok() {
            ColumnType::Real
        } else {
            return ColumnType::Text;
        };

        kind = Some(match (kind, fits) {
            (None, fits) => fits,
            (Some(current), fits) if current == fits => current,
            (Some(ColumnType::Boolean), _) | (_, ColumnType::Boolean) => return ColumnType::Text,
            _ => ColumnType::Real,
        });
    }

    kind.unwrap_or(ColumnType::Real)
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_cell(value: String, kind: ColumnType) -> Cell {
    if value.is_empty() {
        return Cell::Null;
    }

    // Inference guarantees the parse succeeds for non-text columns.
    match kind {
        ColumnType::Boolean => parse_bool(&value).map_or(Cell::Text(value), Cell::Boolean),
        ColumnType::Integer => value
            .parse::<i64>()
            .map_or_else(|_| Cell::Text(value), Cell::Integer),
        ColumnType::Real => value
            .parse::<f64>()
            .map_or_else(|_| Cell::Text(value), Cell::Real),
        ColumnType::Text => Cell::Text(value),
    }
}

/// Repeated headers become `name`, `name.1`, `name.2`, ...
fn dedupe_names<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut names = Vec::new();

    for header in headers {
        let mut name = header.to_string();
        let mut suffix = 1;
        while seen.contains(&name) {
            name = format!("{header}.{suffix}");
            suffix += 1;
        }
        seen.insert(name.clone());
        names.push(name);
    }

    names
}
