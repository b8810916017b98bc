//! Rust-типы, которые могут хранить поле записи.

use crate::coerce::{FieldKind, Value};

/// Rust-тип, в который сохраняется преобразованное [`Value`].
///
/// Целые разбираются как 64-битные и должны помещаться в объявленную ширину;
/// не поместившееся значение считается несовпадением типа, а не обрезается.
/// То же для `f32`: конечное число, не представимое в `f32`, отклоняется.
pub trait FieldType: Sized + Send + 'static {
    /// Тип, в который преобразуется сырой текст.
    const KIND: FieldKind;

    /// Извлекает типизированное значение или `None`, если оно не помещается.
    fn from_value(value: Value) -> Option<Self>;

    /// Текст, по которому измеряются ограничения длины.
    fn render(&self) -> String;
}

impl FieldType for String {
    const KIND: FieldKind = FieldKind::String;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    fn render(&self) -> String {
        self.clone()
    }
}

impl FieldType for bool {
    const KIND: FieldKind = FieldKind::Boolean;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl FieldType for f64 {
    const KIND: FieldKind = FieldKind::Float;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(v),
            _ => None,
        }
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl FieldType for f32 {
    const KIND: FieldKind = FieldKind::Float;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(v) => {
                let narrowed = v as f32;
                (narrowed.is_finite() || !v.is_finite()).then_some(narrowed)
            }
            _ => None,
        }
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

macro_rules! impl_integer_field {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FieldType for $ty {
                const KIND: FieldKind = FieldKind::Integer;

                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::Int(v) => <$ty>::try_from(v).ok(),
                        _ => None,
                    }
                }

                fn render(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

impl_integer_field!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
