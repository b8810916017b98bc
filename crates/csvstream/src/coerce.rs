//! Преобразование сырых текстовых полей в типизированные значения.
//!
//! Поля берутся как есть: пробелы не обрезаются, поэтому `" 12"` не
//! является целым числом.

use std::fmt;

use serde::Serialize;

/// Примитивные типы, в которые декодируется поле.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Текст без изменений.
    String,
    /// Десятичное знаковое целое, 64 бита.
    Integer,
    /// Число с плавающей точкой, в десятичной или экспоненциальной записи.
    Float,
    /// Логическое значение вида `true`/`false`.
    Boolean,
}

impl FieldKind {
    /// Каноническое имя типа в нижнем регистре.
    ///
    /// ```
    /// use csvstream::FieldKind;
    /// assert_eq!(FieldKind::Integer.as_str(), "integer");
    /// ```
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
        }
    }

    /// Тип по имени из объявления схемы времени выполнения.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "string" | "str" => Some(Self::String),
            "int" | "integer" => Some(Self::Integer),
            "float" | "double" => Some(Self::Float),
            "bool" | "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Декодированное значение поля.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Value {
    /// Тип значения.
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        match self {
            Self::Str(_) => FieldKind::String,
            Self::Int(_) => FieldKind::Integer,
            Self::Float(_) => FieldKind::Float,
            Self::Bool(_) => FieldKind::Boolean,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// Преобразует `raw` в значение заданного типа.
///
/// Возвращает `None`, если текст не является корректной записью `kind`.
///
/// ```
/// use csvstream::{FieldKind, Value, coerce};
///
/// assert_eq!(coerce(FieldKind::Integer, "21"), Some(Value::Int(21)));
/// assert_eq!(coerce(FieldKind::Boolean, "T"), Some(Value::Bool(true)));
/// assert_eq!(coerce(FieldKind::Integer, "NOTANUMBER"), None);
/// ```
#[must_use]
pub fn coerce(kind: FieldKind, raw: &str) -> Option<Value> {
    match kind {
        FieldKind::String => Some(Value::Str(raw.to_string())),
        FieldKind::Integer => raw.parse::<i64>().ok().map(Value::Int),
        FieldKind::Float => raw.parse::<f64>().ok().map(Value::Float),
        FieldKind::Boolean => parse_bool(raw).map(Value::Bool),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_is_identity() {
        assert_eq!(coerce(FieldKind::String, "  Sarah "), Some(Value::Str("  Sarah ".into())));
        assert_eq!(coerce(FieldKind::String, ""), Some(Value::Str(String::new())));
    }

    #[test]
    fn integers() {
        assert_eq!(coerce(FieldKind::Integer, "-42"), Some(Value::Int(-42)));
        assert_eq!(coerce(FieldKind::Integer, "+7"), Some(Value::Int(7)));
        assert_eq!(coerce(FieldKind::Integer, " 12"), None);
        assert_eq!(coerce(FieldKind::Integer, "1.5"), None);
        assert_eq!(coerce(FieldKind::Integer, "99999999999999999999"), None);
    }

    #[test]
    fn floats() {
        assert_eq!(coerce(FieldKind::Float, "1.5"), Some(Value::Float(1.5)));
        assert_eq!(coerce(FieldKind::Float, "2e3"), Some(Value::Float(2000.0)));
        assert_eq!(coerce(FieldKind::Float, "abc"), None);
    }

    #[test]
    fn booleans() {
        for raw in ["1", "t", "T", "TRUE", "true", "True"] {
            assert_eq!(coerce(FieldKind::Boolean, raw), Some(Value::Bool(true)), "{raw}");
        }
        for raw in ["0", "f", "F", "FALSE", "false", "False"] {
            assert_eq!(coerce(FieldKind::Boolean, raw), Some(Value::Bool(false)), "{raw}");
        }
        assert_eq!(coerce(FieldKind::Boolean, "yes"), None);
        assert_eq!(coerce(FieldKind::Boolean, "tRUE"), None);
    }

    #[test]
    fn kind_names() {
        assert_eq!(FieldKind::from_name("INT"), Some(FieldKind::Integer));
        assert_eq!(FieldKind::from_name("str"), Some(FieldKind::String));
        assert_eq!(FieldKind::from_name("date"), None);
    }
}
