#![allow(clippy::unwrap_used)]

use super::*;
use std::io::Write;
use std::path::Path;

const HEADER: &str =
    "Zdrojový účet;Datum;Objem;Měna;Protiúčet;Kód banky;Zpráva pro příjemce;Poznámka;Typ";

fn csv_with_rows(rows: &[&str]) -> String {
    let mut text = String::from(HEADER);
    for row in rows {
        text.push('\n');
        text.push_str(row);
    }
    text.push('\n');
    text
}

// ── parse ─────────────────────────────────────────────────────

#[test]
fn test_parse_basic_row() {
    let text = csv_with_rows(&[
        "2801234567;03.01.2024;-256,40;CZK;;;LIDL PRAHA 4 05;;Platba kartou",
    ]);
    let records = parse(&text);
    assert_eq!(records.len(), 1);
    let rec = &records[0];
    assert_eq!(rec.source_account, "2801234567");
    assert_eq!(rec.date, "03.01.2024");
    assert_eq!(rec.amount, "-256,40");
    assert_eq!(rec.currency, "CZK");
    assert_eq!(rec.message, "LIDL PRAHA 4 05");
    assert_eq!(rec.tx_type, "Platba kartou");
    assert!(rec.counter_account.is_empty());
    assert!(rec.note.is_empty());
}

#[test]
fn test_parse_preserves_file_order() {
    let text = csv_with_rows(&[
        "2801234567;03.01.2024;-10,00;CZK;;;FIRST;;Platba kartou",
        "2801234567;04.01.2024;-20,00;CZK;;;SECOND;;Platba kartou",
        "2801234567;05.01.2024;-30,00;CZK;;;THIRD;;Platba kartou",
    ]);
    let records = parse(&text);
    let names: Vec<&str> = records.iter().map(|r| r.message.as_str()).collect();
    assert_eq!(names, vec!["FIRST", "SECOND", "THIRD"]);
}

#[test]
fn test_parse_short_row_pads_with_empty() {
    // Row stops after the currency column.
    let text = csv_with_rows(&["2801234567;03.01.2024;-256,40;CZK"]);
    let records = parse(&text);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].currency, "CZK");
    assert!(records[0].message.is_empty());
    assert!(records[0].tx_type.is_empty());
}

#[test]
fn test_parse_extra_fields_ignored() {
    let text = csv_with_rows(&[
        "2801234567;03.01.2024;-256,40;CZK;;;LIDL;;Platba kartou;SURPLUS;MORE",
    ]);
    let records = parse(&text);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].message, "LIDL");
}

#[test]
fn test_parse_unknown_columns_ignored() {
    let text = "Datum;Objem;Měna;Sloupec navíc\n03.01.2024;-5,00;CZK;cokoliv\n";
    let records = parse(text);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].date, "03.01.2024");
    assert_eq!(records[0].amount, "-5,00");
    assert!(records[0].source_account.is_empty());
}

#[test]
fn test_parse_missing_amount_still_listed() {
    let text = csv_with_rows(&["2801234567;03.01.2024;;;;;SOME SHOP;;Platba kartou"]);
    let records = parse(&text);
    assert_eq!(records.len(), 1);
    assert!(!records[0].has_money());
    assert_eq!(records[0].message, "SOME SHOP");
}

#[test]
fn test_parse_empty_text() {
    assert!(parse("").is_empty());
}

#[test]
fn test_parse_header_only() {
    assert!(parse(&csv_with_rows(&[])).is_empty());
}

#[test]
fn test_parse_quoted_field_with_delimiter() {
    let text = csv_with_rows(&[
        "2801234567;03.01.2024;-42,00;CZK;;;\"SHOP;WITH;SEMICOLONS\";;Platba kartou",
    ]);
    let records = parse(&text);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].message, "SHOP;WITH;SEMICOLONS");
}

// ── read_file ─────────────────────────────────────────────────

#[test]
fn test_read_file_roundtrip() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let text = csv_with_rows(&["2801234567;03.01.2024;-10,00;CZK;;;SHOP;;Platba kartou"]);
    file.write_all(text.as_bytes()).unwrap();
    let loaded = read_file(file.path()).unwrap();
    assert_eq!(loaded, text);
}

#[test]
fn test_read_file_missing_path_errors() {
    assert!(read_file(Path::new("/nonexistent/statement.csv")).is_err());
}

// ── bundled fixture ───────────────────────────────────────────

#[test]
fn test_example_csv_parses() {
    let records = parse(EXAMPLE_CSV);
    assert_eq!(records.len(), 12);
    assert!(records.iter().all(|r| !r.date.is_empty()));
    assert!(records.iter().any(|r| r.currency == "EUR"));
    assert!(records.iter().any(|r| r.message.is_empty() && !r.note.is_empty()));
}
