//! Integration tests for record storage
//!
//! These tests save record batches through `StorageWriter` into temporary
//! directories and read the results back.

use chrono::{TimeZone, Utc};
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use trawler::storage::{load_delimited, load_json, SqliteSink, StorageError};
use trawler::{Fields, Record, StorageFormat, StorageWriter};

fn record(url: &str, pairs: &[(&str, serde_json::Value)]) -> Record {
    let mut fields = Fields::new();
    for (key, value) in pairs {
        fields.insert(key.to_string(), value.clone());
    }
    let fetched_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    Record::new(url, fetched_at, fields)
}

fn sample_records() -> Vec<Record> {
    vec![
        record(
            "https://shop.test/a",
            &[("title", json!("Widget")), ("price", json!(9.5))],
        ),
        record(
            "https://shop.test/b",
            &[
                ("title", json!("Gadget")),
                ("stock", json!(true)),
                ("dimensions", json!({"w": 2, "h": 3})),
            ],
        ),
    ]
}

fn backups_in(dir: &Path) -> Vec<std::path::PathBuf> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "bak"))
        .collect()
}

#[test]
fn test_json_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("records.json");
    let records = sample_records();

    let report = StorageWriter::default()
        .save(&records, &path, "json")
        .expect("json save");

    assert_eq!(report.records_written, 2);
    assert_eq!(report.format, StorageFormat::Json);
    assert_eq!(report.backup_path, None);
    assert_eq!(load_json(&path).unwrap(), records);
}

#[test]
fn test_csv_header_is_union_of_keys() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("records.csv");

    StorageWriter::default()
        .save(&sample_records(), &path, "csv")
        .expect("csv save");

    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(
        text.lines().next().unwrap(),
        "source_url,fetched_at,dimensions_h,dimensions_w,price,stock,title"
    );

    let rows = load_delimited(&path, b',').unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["price"], "9.5");
    assert_eq!(rows[0]["stock"], "");
    assert_eq!(rows[1]["dimensions_w"], "2");
    assert_eq!(rows[1]["title"], "Gadget");
}

#[test]
fn test_tabular_alias_writes_tsv() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("records.tsv");

    let report = StorageWriter::default()
        .save(&sample_records(), &path, "tabular")
        .expect("tsv save");

    assert_eq!(report.format, StorageFormat::Tsv);
    let rows = load_delimited(&path, b'\t').unwrap();
    assert_eq!(rows[0]["source_url"], "https://shop.test/a");
    assert!(fs::read_to_string(&path).unwrap().contains('\t'));
}

#[test]
fn test_overwrite_keeps_one_backup_of_prior_content() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("records.json");
    let writer = StorageWriter::new(true);
    let records = sample_records();

    writer.save(&records[..1], &path, "json").unwrap();
    let first = fs::read_to_string(&path).unwrap();
    let report = writer.save(&records, &path, "json").unwrap();

    let backups = backups_in(dir.path());
    assert_eq!(backups.len(), 1);
    assert_eq!(report.backup_path.as_deref(), Some(backups[0].as_path()));
    assert_eq!(fs::read_to_string(&backups[0]).unwrap(), first);
    assert_eq!(load_json(&path).unwrap().len(), 2);
}

#[test]
fn test_backup_disabled() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("records.csv");
    let writer = StorageWriter::new(false);

    writer.save(&sample_records(), &path, "csv").unwrap();
    let report = writer.save(&sample_records(), &path, "csv").unwrap();

    assert_eq!(report.backup_path, None);
    assert!(backups_in(dir.path()).is_empty());
}

#[test]
fn test_unsupported_format_touches_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("records.pickle");

    let error = StorageWriter::default()
        .save(&sample_records(), &path, "pickle")
        .unwrap_err();

    assert!(matches!(error, StorageError::UnsupportedFormat(ref tag) if tag == "pickle"));
    assert!(!path.exists());
}

#[test]
fn test_empty_batch_writes_empty_array() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("empty.json");

    let report = StorageWriter::default().save(&[], &path, "json").unwrap();

    assert_eq!(report.records_written, 0);
    assert!(load_json(&path).unwrap().is_empty());
}

#[test]
fn test_sql_upserts_by_source_url() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("records.db");
    let writer = StorageWriter::default();

    writer.save(&sample_records(), &path, "sql").unwrap();
    let updated = vec![record("https://shop.test/a", &[("title", json!("Widget v2"))])];
    let report = writer.save(&updated, &path, "sqlite").unwrap();

    assert_eq!(report.format, StorageFormat::Sql);
    assert_eq!(report.backup_path, None);
    assert_eq!(SqliteSink::open(&path).unwrap().count_rows().unwrap(), 2);
}

#[test]
fn test_document_store_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("documents.db");
    let records = sample_records();

    let report = StorageWriter::default()
        .save(&records, &path, "mongodb")
        .unwrap();

    assert_eq!(report.format, StorageFormat::Document);
    assert_eq!(SqliteSink::open(&path).unwrap().load_documents().unwrap(), records);
}

#[test]
fn test_json_round_trip_preserves_floats_exactly() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("floats.json");
    let values = [
        1.0799078022151191e-66,
        0.1 + 0.2,
        123_456_789.123_456_79,
        2.2250738585072014e-308,
        5e-324,
        f64::MAX,
        -1.7976931348623157e308,
        std::f64::consts::PI,
    ];
    let records: Vec<Record> = values
        .iter()
        .enumerate()
        .map(|(i, v)| record(&format!("https://shop.test/{}", i), &[("v", json!(v))]))
        .collect();

    StorageWriter::default().save(&records, &path, "json").unwrap();
    let loaded = load_json(&path).unwrap();

    for (saved, value) in loaded.iter().zip(values) {
        assert_eq!(saved.get("v").and_then(|v| v.as_f64()), Some(value));
    }
    assert_eq!(loaded, records);
}

#[test]
fn test_csv_keeps_empty_object_column() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("meta.csv");
    let records = vec![record(
        "https://shop.test/a",
        &[("meta", json!({})), ("title", json!("x"))],
    )];

    StorageWriter::default().save(&records, &path, "csv").unwrap();

    let rows = load_delimited(&path, b',').unwrap();
    assert_eq!(rows[0]["meta"], "{}");
    assert_eq!(rows[0]["title"], "x");
}

#[test]
fn test_csv_keeps_both_sides_of_key_clash() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("clash.csv");
    let records = vec![record(
        "https://shop.test/a",
        &[("a", json!({"b": 1})), ("a_b", json!(2))],
    )];

    StorageWriter::default().save(&records, &path, "csv").unwrap();

    let rows = load_delimited(&path, b',').unwrap();
    assert_eq!(rows[0]["a_b"], "2");
    assert_eq!(rows[0]["a"], r#"{"b":1}"#);
}
