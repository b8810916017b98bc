//! Конфигурация конвейера.
//!
//! [`Options`] заполняет (или десериализует) вызывающий код, а [`Config`]
//! является проверенной неизменяемой формой, с которой работает конвейер. Проверка
//! выполняется сразу: неверный разделитель или колонка пропуска обнаруживаются
//! до чтения первой строки.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Пользовательские настройки.
///
/// # Пример
///
/// ```
/// use csvstream::Options;
///
/// let options: Options = serde_json::from_str(r#"{"skip_columns": [0], "chunk_size": 2}"#).unwrap();
/// assert!(options.skip_header);
/// assert_eq!(options.delimiter, ',');
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Считать строку 0 заголовком и отбрасывать её.
    pub skip_header: bool,
    /// Разделитель полей.
    pub delimiter: char,
    /// Колонки источника (с нуля), исключаемые до позиционного сопоставления.
    pub skip_columns: Vec<usize>,
    /// Записей в чанке; `0` означает один чанк в конце источника.
    pub chunk_size: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self { skip_header: true, delimiter: ',', skip_columns: Vec::new(), chunk_size: 0 }
    }
}

impl Options {
    /// Проверяет настройки для схемы из `field_count` полей.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidDelimiter`], если разделитель не ASCII-байт
    ///   или является кавычкой, CR или LF.
    /// - [`ConfigError::SkipColumnOutOfRange`], если колонка пропуска лежит
    ///   за пределами корректной строки.
    pub fn validate(&self, field_count: usize) -> Result<Config, ConfigError> {
        let delimiter = delimiter_byte(self.delimiter)?;
        let skip: BTreeSet<usize> = self.skip_columns.iter().copied().collect();

        let width = field_count + skip.len();
        if let Some(&index) = skip.iter().find(|&&index| index >= width) {
            return Err(ConfigError::SkipColumnOutOfRange { index, width });
        }

        Ok(Config { skip_header: self.skip_header, delimiter, skip, chunk_size: self.chunk_size })
    }
}

fn delimiter_byte(delimiter: char) -> Result<u8, ConfigError> {
    match u8::try_from(delimiter) {
        Ok(byte) if byte.is_ascii() && !matches!(byte, b'"' | b'\r' | b'\n') => Ok(byte),
        _ => Err(ConfigError::InvalidDelimiter(delimiter)),
    }
}

/// Проверенная конфигурация.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    skip_header: bool,
    delimiter: u8,
    skip: BTreeSet<usize>,
    chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { skip_header: true, delimiter: b',', skip: BTreeSet::new(), chunk_size: 0 }
    }
}

impl Config {
    #[must_use]
    pub fn skip_header(&self) -> bool {
        self.skip_header
    }

    /// Разделитель в виде байта для токенизатора.
    #[must_use]
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Колонки пропуска без повторов.
    #[must_use]
    pub fn skip_columns(&self) -> &BTreeSet<usize> {
        &self.skip
    }

    /// Размер чанка; `None`, если чанк формируется только в конце источника.
    #[must_use]
    pub fn chunk_size(&self) -> Option<usize> {
        (self.chunk_size > 0).then_some(self.chunk_size)
    }
}
