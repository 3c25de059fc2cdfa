//! CSV data loader for parametrized tests
//!
//! The first record is a header and is skipped. Fields may be double-quoted;
//! inside quotes, `""` is a literal quote and commas and newlines are data.

use std::path::{Path, PathBuf};

use crate::common::{Error, Result};
use crate::engine::case::ParamRow;
use crate::value::Param;

/// Rows of a CSV file, header removed
#[derive(Debug, Clone)]
pub struct DataTable {
    pub path: PathBuf,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DataTable {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, &e))?;
        let (header, rows) = parse(&text, &path.display().to_string())?;
        Ok(Self {
            path: path.to_path_buf(),
            header,
            rows,
        })
    }

    /// Rows as parameter rows, numbers typed as numbers
    pub fn param_rows(&self) -> Vec<ParamRow> {
        self.rows
            .iter()
            .map(|row| ParamRow::new(row.iter().map(|cell| typed(cell))))
            .collect()
    }
}

/// Read the data rows of a CSV file
pub fn load(path: &Path) -> Result<Vec<Vec<String>>> {
    DataTable::load(path).map(|table| table.rows)
}

fn typed(cell: &str) -> Param {
    if let Ok(v) = cell.parse::<i64>() {
        Param::Int(v)
    } else if let Ok(v) = cell.parse::<f64>() {
        Param::Float(v)
    } else {
        Param::Str(cell.to_string())
    }
}

/// Parse CSV text into the header and the data rows
fn parse(text: &str, origin: &str) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut records: Vec<Vec<String>> = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut quote_line = 0;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => {
                in_quotes = true;
                quote_line = line;
            }
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                line += 1;
                finish_record(&mut records, &mut record, &mut field);
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(Error::DataFile {
            path: origin.to_string(),
            line: quote_line,
            message: "unterminated quoted field".to_string(),
        });
    }
    finish_record(&mut records, &mut record, &mut field);

    let mut records = records.into_iter();
    let header = records.next().unwrap_or_default();
    Ok((header, records.collect()))
}

/// End the current record, dropping blank lines
fn finish_record(records: &mut Vec<Vec<String>>, record: &mut Vec<String>, field: &mut String) {
    if record.is_empty() && field.trim().is_empty() {
        field.clear();
        return;
    }
    record.push(std::mem::take(field));
    records.push(std::mem::take(record));
}
