//! Ограничения длины, объявленные на полях схемы.

use crate::{
    error::{LengthBound, StreamError},
    schema::Schema,
};

/// Проверяет все ограниченные поля декодированной записи.
///
/// Поля проверяются в порядке схемы, `min` раньше `max`; возвращается первое
/// нарушение. Длина считается в символах отображённого значения, а не сырого
/// текста источника: `"007"`, декодированное как целое, имеет длину 1.
///
/// # Errors
///
/// [`StreamError::ConstraintViolation`] с полем, строкой, ограничением и
/// фактической длиной.
pub fn validate<T>(record: &T, schema: &Schema<T>, row: usize) -> Result<(), StreamError> {
    for field in schema.fields() {
        if field.min().is_none() && field.max().is_none() {
            continue;
        }

        let observed = field.render(record).chars().count();
        let violated = match (field.min(), field.max()) {
            (Some(min), _) if observed < min => Some(LengthBound::Min(min)),
            (_, Some(max)) if observed > max => Some(LengthBound::Max(max)),
            _ => None,
        };

        if let Some(bound) = violated {
            return Err(StreamError::ConstraintViolation {
                row,
                field: field.name().to_string(),
                bound,
                observed,
            });
        }
    }
    Ok(())
}
