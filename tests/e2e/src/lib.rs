//! # e2e-tests - сквозные тесты CLI `csvpeek`
//!
//! ## Фикстуры
//!
//! Тестовые файлы лежат в `fixtures/`:
//! - `customers.csv`: три корректные строки с заголовком
//! - `customers_bad_age.csv`: нечисловой возраст в строке 2
//! - `customers_extra_columns.csv`: разделитель `;`, колонки ID и примечания
//! - `options.json`: опции для `customers_extra_columns.csv`

use std::path::PathBuf;

/// Путь к директории фикстур.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Путь к фикстуре по имени файла.
pub fn fixture(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

/// Аргументы схемы для фикстур с клиентами.
pub const CUSTOMER_SCHEMA: [&str; 6] =
    ["--schema", "name:string:1:10", "--schema", "age:int::3", "--schema", "vip:bool"];
