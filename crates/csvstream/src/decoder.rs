//! Декодирование одной строки источника в одну запись.

use std::collections::BTreeSet;

use csv::StringRecord;

use crate::{
    coerce::coerce,
    error::{Result, StreamError},
    options::Config,
    schema::Schema,
    validation::validate,
};

/// Отображает строки на записи типа `T` по позиции.
///
/// Сначала отбрасываются колонки из множества пропуска, оставшиеся
/// присваиваются полям схемы слева направо. Имена полей в сопоставлении не
/// участвуют: порядок полей записи должен совпадать с порядком колонок.
pub struct RowDecoder<T> {
    schema: Schema<T>,
    skip: BTreeSet<usize>,
    skip_header: bool,
}

impl<T> Clone for RowDecoder<T> {
    fn clone(&self) -> Self {
        Self { schema: self.schema.clone(), skip: self.skip.clone(), skip_header: self.skip_header }
    }
}

impl<T: Default> RowDecoder<T> {
    pub fn new(schema: Schema<T>, config: &Config) -> Self {
        Self { schema, skip: config.skip_columns().clone(), skip_header: config.skip_header() }
    }

    /// Число колонок в структурно корректной строке.
    #[must_use]
    pub fn expected_width(&self) -> usize {
        self.schema.len() + self.skip.len()
    }

    /// Декодирует строку с абсолютным номером `index`.
    ///
    /// Для строки заголовка при включённом пропуске возвращает `Ok(None)`.
    ///
    /// # Errors
    ///
    /// - [`StreamError::ColumnCountMismatch`], если ширина строки не равна
    ///   `поля + пропускаемые колонки`.
    /// - [`StreamError::TypeMismatch`] для первого поля, которое не удалось
    ///   преобразовать.
    /// - [`StreamError::ConstraintViolation`] для первого нарушенного ограничения.
    pub fn decode(&self, row: &StringRecord, index: usize) -> Result<Option<T>> {
        if self.skip_header && index == 0 {
            return Ok(None);
        }

        if row.len() != self.expected_width() {
            return Err(StreamError::ColumnCountMismatch {
                row: index,
                expected: self.schema.len(),
                got: row.len().saturating_sub(self.skip.len()),
            });
        }

        let mut record = T::default();
        let columns =
            row.iter().enumerate().filter(|(col, _)| !self.skip.contains(col)).map(|(_, raw)| raw);

        for (raw, field) in columns.zip(self.schema.fields()) {
            let stored = coerce(field.kind(), raw).is_some_and(|v| field.assign(&mut record, v));
            if !stored {
                return Err(StreamError::TypeMismatch {
                    row: index,
                    field: field.name().to_string(),
                    expected: field.kind(),
                    value: raw.to_string(),
                });
            }
        }

        validate(&record, &self.schema, index)?;
        Ok(Some(record))
    }
}
