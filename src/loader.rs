#![cfg(not(tarpaulin_include))]

use crate::row::Row;
use serde_json::{Map, Value};
use std::error::Error;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Load rows from a JSON or CSV file, chosen by extension
///
/// Files ending in `.csv` go through [`from_csv`]; everything else is read
/// as JSON by [`from_json`].
pub fn load_rows(filepath: impl AsRef<Path>) -> Result<Vec<Row>, Box<dyn Error>> {
    let filepath = filepath.as_ref();
    let is_csv = filepath
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    if is_csv {
        from_csv(filepath)
    } else {
        from_json(filepath)
    }
}

/// Load rows from a JSON file
///
/// Accepts either a top-level array of rows or an object carrying the rows
/// under a `data` key (the shape the REST backend answers with).
///
/// # Arguments
/// * `filepath` - Path to the JSON file to load
///
/// # Returns
/// * `Result<Vec<Row>, Box<dyn Error>>` - The loaded rows or an error
///
/// # Examples
/// ```no_run
/// use datatable::loader::from_json;
///
/// match from_json("members.json") {
///     Ok(rows) => println!("Loaded {} rows", rows.len()),
///     Err(e) => eprintln!("Error loading JSON: {}", e),
/// }
/// ```
pub fn from_json(filepath: impl AsRef<Path>) -> Result<Vec<Row>, Box<dyn Error>> {
    let file = File::open(filepath)?;
    let value: Value = serde_json::from_reader(BufReader::new(file))?;
    rows_from_value(value)
}

/// Pull the row array out of an already parsed JSON document.
pub fn rows_from_value(value: Value) -> Result<Vec<Row>, Box<dyn Error>> {
    match value {
        Value::Array(rows) => Ok(rows),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(rows)) => Ok(rows),
            _ => Err("JSON object has no \"data\" array".into()),
        },
        _ => Err("expected a JSON array of rows".into()),
    }
}

/// Load rows from a CSV file
///
/// The first line names the fields. Cells that parse as integers, floats or
/// booleans become JSON numbers/booleans, empty cells become `null`, and
/// everything else stays a string.
///
/// # Examples
/// ```no_run
/// use datatable::loader::from_csv;
///
/// match from_csv("members.csv") {
///     Ok(rows) => println!("Loaded {} rows", rows.len()),
///     Err(e) => eprintln!("Error loading CSV: {}", e),
/// }
/// ```
pub fn from_csv(filepath: impl AsRef<Path>) -> Result<Vec<Row>, Box<dyn Error>> {
    let file = File::open(filepath)?;
    let reader = BufReader::new(file);
    let lines: Vec<String> = reader.lines().collect::<Result<_, _>>()?;
    rows_from_csv_lines(&lines)
}

/// Parse CSV lines (header first) into rows.
///
/// A quoted cell may span several lines; its line breaks are kept.
pub fn rows_from_csv_lines(lines: &[String]) -> Result<Vec<Row>, Box<dyn Error>> {
    let records = csv_records(lines)?;
    let Some(header_line) = records.first() else {
        return Err("CSV file is empty".into());
    };
    let headers = parse_csv_row(header_line)?;

    let mut rows = Vec::with_capacity(records.len().saturating_sub(1));
    for record in records.iter().skip(1) {
        if record.trim().is_empty() {
            continue;
        }
        let cells = parse_csv_row(record)?;
        let mut map = Map::new();
        for (c, header) in headers.iter().enumerate() {
            let cell = cells.get(c).map(String::as_str).unwrap_or("");
            map.insert(header.clone(), csv_cell_value(cell));
        }
        rows.push(Value::Object(map));
    }

    Ok(rows)
}

// Join physical lines until every record has balanced quotes
fn csv_records(lines: &[String]) -> Result<Vec<String>, Box<dyn Error>> {
    let mut records = Vec::with_capacity(lines.len());
    let mut pending: Option<String> = None;

    for line in lines {
        let record = match pending.take() {
            Some(mut open) => {
                open.push('\n');
                open.push_str(line);
                open
            }
            None => line.clone(),
        };
        if record.matches('"').count() % 2 == 1 {
            pending = Some(record);
        } else {
            records.push(record);
        }
    }

    if pending.is_some() {
        return Err("Unterminated quoted field in CSV".into());
    }
    Ok(records)
}

fn csv_cell_value(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = cell.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = cell.parse::<f64>() {
        if f.is_finite() {
            return Value::from(f);
        }
    }
    match cell {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(cell.to_string()),
    }
}

// Helper function to parse a CSV row, handling quoted fields
fn parse_csv_row(line: &str) -> Result<Vec<String>, Box<dyn Error>> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    // Escaped quote
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                result.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }

    if in_quotes {
        return Err("Unterminated quoted field in CSV".into());
    }

    result.push(current);
    Ok(result)
}
