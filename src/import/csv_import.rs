use anyhow::{Context, Result};
use std::path::Path;

use crate::models::TxRecord;

/// Bundled example export, for trying the tool without a real statement.
pub(crate) const EXAMPLE_CSV: &str = include_str!("example_data.csv");

// Column headers of a Fio export, as they appear in the file.
const COL_SOURCE_ACCOUNT: &str = "Zdrojový účet";
const COL_DATE: &str = "Datum";
const COL_AMOUNT: &str = "Objem";
const COL_CURRENCY: &str = "Měna";
const COL_COUNTER_ACCOUNT: &str = "Protiúčet";
const COL_BANK_CODE: &str = "Kód banky";
const COL_MESSAGE: &str = "Zpráva pro příjemce";
const COL_NOTE: &str = "Poznámka";
const COL_TYPE: &str = "Typ";

/// Read an export file to text. Failures surface to the caller and no
/// records are produced.
pub(crate) fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read CSV file: {}", path.display()))
}

/// Parse semicolon-delimited export text into records, in file order.
///
/// The first row names the columns; each data row becomes one record.
/// Unknown columns are ignored, missing trailing fields read as empty,
/// and rows the reader cannot decode are dropped. Nothing here aborts
/// the pipeline.
pub(crate) fn parse(text: &str) -> Vec<TxRecord> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .has_headers(true)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = match rdr.headers() {
        Ok(headers) => headers.iter().map(|h| h.trim().to_string()).collect(),
        Err(_) => return Vec::new(),
    };

    let idx_source = col_index(&columns, COL_SOURCE_ACCOUNT);
    let idx_date = col_index(&columns, COL_DATE);
    let idx_amount = col_index(&columns, COL_AMOUNT);
    let idx_currency = col_index(&columns, COL_CURRENCY);
    let idx_counter = col_index(&columns, COL_COUNTER_ACCOUNT);
    let idx_bank = col_index(&columns, COL_BANK_CODE);
    let idx_message = col_index(&columns, COL_MESSAGE);
    let idx_note = col_index(&columns, COL_NOTE);
    let idx_type = col_index(&columns, COL_TYPE);

    let mut records = Vec::new();
    for row in rdr.records() {
        let Ok(row) = row else { continue };
        let get = |idx: Option<usize>| -> String {
            idx.and_then(|i| row.get(i)).unwrap_or("").trim().to_string()
        };
        records.push(TxRecord {
            source_account: get(idx_source),
            date: get(idx_date),
            amount: get(idx_amount),
            currency: get(idx_currency),
            counter_account: get(idx_counter),
            bank_code: get(idx_bank),
            message: get(idx_message),
            note: get(idx_note),
            tx_type: get(idx_type),
        });
    }
    records
}

fn col_index(columns: &[String], name: &str) -> Option<usize> {
    columns.iter().position(|c| c == name)
}

#[cfg(test)]
#[path = "csv_import_tests.rs"]
mod tests;
