//! Записи, структура которых известна только во время выполнения.
//!
//! Объявления имеют вид `NAME:KIND[:MIN[:MAX]]`, например `age:int:1:3`.
//! Пустой `MIN` оставляет поле без нижней границы (`name:string::10`).

use std::sync::Arc;

use serde::{Serialize, ser::SerializeMap};

use super::{Schema, SchemaBuilder};
use crate::{coerce::Value, error::SchemaError};

/// Запись в виде упорядоченных пар `(имя, значение)`.
///
/// Сериализуется как отображение в порядке полей.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynamicRecord {
    fields: Vec<(Arc<str>, Value)>,
}

impl DynamicRecord {
    /// Строит схему из текстовых объявлений полей.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::InvalidDeclaration`] для объявления без имени или типа.
    /// - [`SchemaError::UnsupportedFieldKind`] для неизвестного типа.
    /// - [`SchemaError::InvalidBound`] для некорректной границы.
    ///
    /// ```
    /// use csvstream::DynamicRecord;
    ///
    /// let schema = DynamicRecord::schema(["name:string:1:10", "age:int"]).unwrap();
    /// assert_eq!(schema.len(), 2);
    /// assert!(DynamicRecord::schema(["born:date"]).is_err());
    /// ```
    pub fn schema<I, S>(declarations: I) -> Result<Schema<Self>, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = SchemaBuilder::<Self>::new();

        for (index, declaration) in declarations.into_iter().enumerate() {
            let declaration = declaration.as_ref();
            let mut parts = declaration.split(':');
            let name = parts.next().unwrap_or_default();
            let kind = parts.next().unwrap_or_default();
            let min = parts.next().filter(|s| !s.is_empty());
            let max = parts.next().filter(|s| !s.is_empty());

            if name.is_empty() || kind.is_empty() || parts.next().is_some() {
                return Err(SchemaError::InvalidDeclaration(declaration.to_string()));
            }

            let key: Arc<str> = Arc::from(name);
            let mut decl = builder.declare(
                name,
                kind,
                move |record: &mut DynamicRecord, value| {
                    record.set(index, Arc::clone(&key), value);
                    true
                },
                move |record: &DynamicRecord| {
                    record.fields.get(index).map(|(_, v)| v.to_string()).unwrap_or_default()
                },
            );
            if let Some(min) = min {
                decl = decl.min(min);
            }
            if let Some(max) = max {
                decl.max(max);
            }
        }

        builder.build()
    }

    fn set(&mut self, index: usize, name: Arc<str>, value: Value) {
        if index < self.fields.len() {
            self.fields[index] = (name, value);
        } else {
            self.fields.push((name, value));
        }
    }

    /// Значение поля по имени.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n.as_ref() == name).map(|(_, v)| v)
    }

    /// Пары `(имя, значение)` в порядке полей.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_ref(), v))
    }

    /// Число заполненных полей.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// `true`, если ни одно поле не заполнено.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for DynamicRecord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name.as_ref(), value)?;
        }
        map.end()
    }
}
