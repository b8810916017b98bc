//! Ошибки построения схемы, конфигурации и потоковой обработки.
//!
//! Ошибки разделены по моменту возникновения:
//!
//! - [`SchemaError`] и [`ConfigError`] возникают синхронно при создании
//!   [`Client`](crate::Client), до открытия источника.
//! - [`StreamError`] возникает в производителе при чтении и декодировании строк
//!   и приходит потребителю через тот же вызов, что и записи.

use std::{fmt, path::PathBuf, sync::Arc};

use thiserror::Error;

use crate::coerce::FieldKind;

/// Объявленную схему не удалось построить.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Поле объявлено с типом, который не поддерживается.
    #[error("field '{field}' has unsupported kind '{kind}'")]
    UnsupportedFieldKind {
        /// Имя поля.
        field: String,
        /// Объявленный тип, как он записан.
        kind: String,
    },

    /// Аннотация `min`/`max` не является неотрицательным целым.
    #[error("bound {bound} of field '{field}' must be a non-negative integer, got: '{value}'")]
    InvalidBound {
        /// Имя поля.
        field: String,
        /// Какая аннотация (`min` или `max`).
        bound: &'static str,
        /// Текст аннотации.
        value: String,
    },

    /// Одно и то же имя поля объявлено дважды.
    #[error("field '{0}' is declared more than once")]
    DuplicateField(String),

    /// Объявление поля не удалось разобрать.
    #[error("invalid field declaration '{0}', expected NAME:KIND[:MIN[:MAX]]")]
    InvalidDeclaration(String),
}

/// Некорректная конфигурация конвейера. Всегда фатальна, возникает до чтения строк.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Разделитель не является допустимым ASCII-символом.
    #[error("delimiter {0:?} must be a single ASCII character other than quote, CR or LF")]
    InvalidDelimiter(char),

    /// Индекс пропуска не может встретиться в структурно корректной строке.
    #[error("skip column {index} is out of range for rows of width {width}")]
    SkipColumnOutOfRange {
        /// Индекс пропуска (с нуля).
        index: usize,
        /// Ширина корректной строки (поля схемы + пропускаемые колонки).
        width: usize,
    },

    /// Схема целевой записи некорректна.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
}

/// Нарушенное ограничение длины.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthBound {
    /// Минимальная длина (включительно).
    Min(usize),
    /// Максимальная длина (включительно).
    Max(usize),
}

impl fmt::Display for LengthBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Min(n) => write!(f, "at least {n}"),
            Self::Max(n) => write!(f, "at most {n}"),
        }
    }
}

/// Терминальная ошибка работающего конвейера.
///
/// Номера строк абсолютные: заголовок, если он есть, имеет номер 0.
#[derive(Debug, Clone, Error)]
pub enum StreamError {
    /// Источник не удалось открыть.
    #[error("failed to open source {}: {source}", .path.display())]
    SourceOpen {
        /// Путь к источнику.
        path: PathBuf,
        /// Исходная ошибка ввода/вывода.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Ошибка токенизатора при чтении строки.
    #[error("failed to read row {row}: {source}")]
    Source {
        /// Строка, которую не удалось прочитать.
        row: usize,
        /// Исходная ошибка CSV.
        #[source]
        source: Arc<csv::Error>,
    },

    /// Ширина строки не совпадает с числом полей и пропускаемых колонок.
    #[error("column count mismatch at row {row}: expected {expected}, got {got}")]
    ColumnCountMismatch {
        /// Номер строки.
        row: usize,
        /// Число полей схемы.
        expected: usize,
        /// Колонок в строке за вычетом пропускаемых.
        got: usize,
    },

    /// Поле не удалось преобразовать в объявленный тип.
    #[error("invalid value '{value}' for field '{field}' at row {row}: expected {expected}")]
    TypeMismatch {
        /// Номер строки.
        row: usize,
        /// Имя поля.
        field: String,
        /// Объявленный тип.
        expected: FieldKind,
        /// Сырой текст поля.
        value: String,
    },

    /// Декодированное поле нарушает ограничение длины.
    #[error("value of {field} at row {row} is invalid: length must be {bound}, got {observed}")]
    ConstraintViolation {
        /// Номер строки.
        row: usize,
        /// Имя поля.
        field: String,
        /// Нарушенное ограничение.
        bound: LengthBound,
        /// Фактическая длина отображённого значения.
        observed: usize,
    },

    /// Производитель остановился, не отправив сигнал конца или ошибки.
    #[error("producer stopped unexpectedly")]
    ProducerLost,

    /// Конвейер отменён через [`Canceller`](crate::Canceller) до конца данных.
    #[error("pipeline was cancelled")]
    Cancelled,
}

impl StreamError {
    /// Номер строки, к которой относится ошибка, если есть.
    #[must_use]
    pub fn row(&self) -> Option<usize> {
        match self {
            Self::SourceOpen { .. } | Self::ProducerLost | Self::Cancelled => None,
            Self::Source { row, .. }
            | Self::ColumnCountMismatch { row, .. }
            | Self::TypeMismatch { row, .. }
            | Self::ConstraintViolation { row, .. } => Some(*row),
        }
    }
}

/// Результат потоковых операций.
pub type Result<T> = std::result::Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_violation_message() {
        let err = StreamError::ConstraintViolation {
            row: 1,
            field: "first_name".to_string(),
            bound: LengthBound::Max(10),
            observed: 11,
        };
        assert_eq!(
            err.to_string(),
            "value of first_name at row 1 is invalid: length must be at most 10, got 11"
        );
    }

    #[test]
    fn invalid_bound_message() {
        let err = SchemaError::InvalidBound {
            field: "first_name".to_string(),
            bound: "min",
            value: "x".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "bound min of field 'first_name' must be a non-negative integer, got: 'x'"
        );
    }

    #[test]
    fn row_accessor() {
        let err = StreamError::ColumnCountMismatch { row: 4, expected: 3, got: 2 };
        assert_eq!(err.row(), Some(4));

        let err = StreamError::SourceOpen {
            path: PathBuf::from("missing.csv"),
            source: Arc::new(std::io::Error::from(std::io::ErrorKind::NotFound)),
        };
        assert_eq!(err.row(), None);
        assert_eq!(StreamError::Cancelled.row(), None);
    }
}
