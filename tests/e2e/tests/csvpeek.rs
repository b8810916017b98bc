//! E2E тесты CLI `csvpeek`.

use assert_cmd::Command;
use e2e_tests::{CUSTOMER_SCHEMA, fixture};
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::tempdir;

/// Команда запуска `csvpeek`.
///
/// `cargo_bin` помечен устаревшим из-за нестандартных директорий сборки, но
/// это единственный способ добраться до бинарника из другого крейта.
#[expect(deprecated)]
fn csvpeek() -> Command {
    Command::cargo_bin("csvpeek").unwrap()
}

fn json_lines(stdout: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

// ============================================================================
// Построчный режим
// ============================================================================

#[test]
fn test_rows_as_json_lines() {
    let output = csvpeek()
        .arg("--input")
        .arg(fixture("customers.csv"))
        .args(CUSTOMER_SCHEMA)
        .assert()
        .success()
        .stderr(predicate::str::contains("Read 3 record(s)"))
        .get_output()
        .stdout
        .clone();

    assert_eq!(
        json_lines(&output),
        vec![
            json!({"name": "Sarah", "age": 12, "vip": true}),
            json!({"name": "John", "age": 21, "vip": false}),
            json!({"name": "Eve", "age": 30, "vip": true}),
        ]
    );
}

#[test]
fn test_rows_stop_at_first_invalid_row() {
    let output = csvpeek()
        .arg("--input")
        .arg(fixture("customers_bad_age.csv"))
        .args(CUSTOMER_SCHEMA)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "invalid value 'NOTANUMBER' for field 'age' at row 2: expected integer",
        ))
        .get_output()
        .stdout
        .clone();

    // Строка 1 уже отдана; строка 3 не будет отдана никогда.
    assert_eq!(json_lines(&output), vec![json!({"name": "Sarah", "age": 12, "vip": true})]);
}

#[test]
fn test_limit_releases_pipeline() {
    let output = csvpeek()
        .arg("--input")
        .arg(fixture("customers.csv"))
        .args(CUSTOMER_SCHEMA)
        .args(["--limit", "1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Read 1 record(s) (stopped early)"))
        .get_output()
        .stdout
        .clone();

    assert_eq!(json_lines(&output).len(), 1);
}

#[test]
fn test_short_flags() {
    csvpeek()
        .arg("-i")
        .arg(fixture("customers.csv"))
        .args(["-s", "name:string", "-s", "age:int", "-s", "vip:bool", "-d", ","])
        .assert()
        .success()
        .stderr(predicate::str::contains("Read 3 record(s)"));
}

#[test]
fn test_slow_consumer() {
    csvpeek()
        .arg("--input")
        .arg(fixture("customers.csv"))
        .args(CUSTOMER_SCHEMA)
        .args(["--delay-ms", "20"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Read 3 record(s)"));
}

#[test]
fn test_length_constraint() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("long.csv");
    std::fs::write(&input, "NAME,AGE,VIP\nBartholomew,40,true\n").unwrap();

    csvpeek()
        .arg("--input")
        .arg(&input)
        .args(CUSTOMER_SCHEMA)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "value of name at row 1 is invalid: length must be at most 10, got 11",
        ));
}

#[test]
fn test_stdin_without_header() {
    csvpeek()
        .args(CUSTOMER_SCHEMA)
        .arg("--no-header")
        .write_stdin("Sarah,12,true\nJohn,21,false\n")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(r#"{"name":"Sarah","age":12,"vip":true}"#))
        .stderr(predicate::str::contains("Read 2 record(s)"));
}

// ============================================================================
// Чанки и чтение целиком
// ============================================================================

#[test]
fn test_chunks() {
    let output = csvpeek()
        .arg("--input")
        .arg(fixture("customers.csv"))
        .args(CUSTOMER_SCHEMA)
        .args(["--mode", "chunks", "--chunk-size", "2"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Read 3 record(s) in 2 chunk(s)"))
        .get_output()
        .stdout
        .clone();

    let chunks = json_lines(&output);
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].as_array().map(Vec::len), Some(2));
    assert_eq!(chunks[1], json!([{"name": "Eve", "age": 30, "vip": true}]));
}

#[test]
fn test_single_chunk_without_size() {
    csvpeek()
        .arg("--input")
        .arg(fixture("customers.csv"))
        .args(CUSTOMER_SCHEMA)
        .args(["--mode", "chunks"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Read 3 record(s) in 1 chunk(s)"));
}

#[test]
fn test_all_mode_prints_nothing_on_error() {
    csvpeek()
        .arg("--input")
        .arg(fixture("customers_bad_age.csv"))
        .args(CUSTOMER_SCHEMA)
        .args(["--mode", "all"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("at row 2"));
}

// ============================================================================
// Опции
// ============================================================================

#[test]
fn test_delimiter_and_skip_columns() {
    csvpeek()
        .arg("--input")
        .arg(fixture("customers_extra_columns.csv"))
        .args(CUSTOMER_SCHEMA)
        .args(["--delimiter", ";", "--skip-col", "0", "--skip-col", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"name":"John","age":21,"vip":false}"#))
        .stderr(predicate::str::contains("Read 2 record(s)"));
}

#[test]
fn test_options_file() {
    csvpeek()
        .arg("--input")
        .arg(fixture("customers_extra_columns.csv"))
        .args(CUSTOMER_SCHEMA)
        .arg("--options")
        .arg(fixture("options.json"))
        .assert()
        .success()
        .stderr(predicate::str::contains("Read 2 record(s)"));
}

#[test]
fn test_flags_override_options_file() {
    // options.json задаёт `;` и пропуск колонок 0 и 2; флаги возвращают `,`
    // и пропускают только колонку 0.
    let dir = tempdir().unwrap();
    let input = dir.path().join("plain.csv");
    std::fs::write(&input, "ID,NAME,AGE,VIP\n1,Sarah,12,true\n").unwrap();

    csvpeek()
        .arg("--input")
        .arg(&input)
        .args(CUSTOMER_SCHEMA)
        .arg("--options")
        .arg(fixture("options.json"))
        .args(["--delimiter", ",", "--skip-col", "0"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Read 1 record(s)"));
}

// ============================================================================
// Обработка ошибок
// ============================================================================

#[test]
fn test_missing_input_file() {
    csvpeek()
        .args(["--input", "/nonexistent/customers.csv"])
        .args(CUSTOMER_SCHEMA)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open source"));
}

#[test]
fn test_unsupported_kind() {
    csvpeek()
        .arg("--input")
        .arg(fixture("customers.csv"))
        .args(["--schema", "born:date"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported kind 'date'"));
}

#[test]
fn test_invalid_delimiter() {
    csvpeek()
        .arg("--input")
        .arg(fixture("customers.csv"))
        .args(CUSTOMER_SCHEMA)
        .args(["--delimiter", "\""])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn test_column_count_mismatch() {
    csvpeek()
        .arg("--input")
        .arg(fixture("customers.csv"))
        .args(["--schema", "name:string", "--schema", "age:int"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("column count mismatch at row 1: expected 2, got 3"));
}

#[test]
fn test_schema_is_required() {
    csvpeek()
        .arg("--input")
        .arg(fixture("customers.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("--schema"));
}
