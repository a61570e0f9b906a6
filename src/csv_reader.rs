use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use serde_json::Value;
use std::io::Read;

use crate::value::{Record, Series};

#[derive(Debug, Clone)]
pub struct CsvData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub enum ColumnSelector {
    Index(usize),
    Name(String),
}

pub fn read_csv<R: Read>(input: R) -> Result<CsvData> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .context("Failed to read CSV headers")?
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.context("Failed to read CSV record")?;
        let row: Vec<String> = record.iter().map(|s| s.to_string()).collect();
        rows.push(row);
    }

    Ok(CsvData { headers, rows })
}

pub fn parse_column_selector(input: &str) -> ColumnSelector {
    match input.parse::<usize>() {
        Ok(index) => ColumnSelector::Index(index),
        Err(_) => ColumnSelector::Name(input.to_string()),
    }
}

impl CsvData {
    /// Header name a selector refers to
    pub fn column_name(&self, selector: ColumnSelector) -> Result<String> {
        match selector {
            ColumnSelector::Index(idx) => self.headers.get(idx).cloned().ok_or_else(|| {
                anyhow!(
                    "Column index {} out of range (CSV has {} columns)",
                    idx,
                    self.headers.len()
                )
            }),
            ColumnSelector::Name(name) => {
                if self.headers.iter().any(|h| h == &name) {
                    Ok(name)
                } else {
                    Err(anyhow!(
                        "Column '{}' not found. Available columns: {}",
                        name,
                        self.headers.join(", ")
                    ))
                }
            }
        }
    }

    /// One record per row; cells stay strings, empty cells become null
    pub fn into_series(self) -> Series {
        let headers = self.headers;
        self.rows
            .into_iter()
            .map(|row| {
                headers
                    .iter()
                    .zip(row)
                    .map(|(header, cell)| {
                        let value = if cell.is_empty() {
                            Value::Null
                        } else {
                            Value::String(cell)
                        };
                        (header.clone(), value)
                    })
                    .collect::<Record>()
            })
            .collect()
    }
}
