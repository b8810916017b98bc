//! Схемы записей: упорядоченные описания полей, строятся один раз на тип.
//!
//! [`Schema`] перечисляет в позиционном порядке, как каждая непропущенная
//! колонка сохраняется в целевую запись: [`FieldKind`] поля, необязательные
//! ограничения длины и типизированные аксессоры. Для каждой строки ничего не
//! вычисляется заново, декодер просто проходит по списку.
//!
//! Целевые типы описывают себя через [`Record`], обычно с помощью макроса
//! [`record_schema!`](crate::record_schema):
//!
//! ```
//! use csvstream::{Schema, record_schema};
//!
//! #[derive(Debug, Default)]
//! struct Customer {
//!     first_name: String,
//!     last_name: String,
//!     age: i64,
//! }
//!
//! record_schema!(Customer {
//!     first_name [min = "1", max = "10"],
//!     last_name [max = "10"],
//!     age,
//! });
//!
//! let schema = Schema::<Customer>::derive().unwrap();
//! assert_eq!(schema.len(), 3);
//! assert_eq!(schema.fields()[0].max(), Some(10));
//! ```

mod dynamic;
mod field_type;

use std::{collections::HashSet, fmt, sync::Arc};

pub use dynamic::DynamicRecord;
pub use field_type::FieldType;

use crate::{
    coerce::{FieldKind, Value},
    error::SchemaError,
};

type Assign<T> = Arc<dyn Fn(&mut T, Value) -> bool + Send + Sync>;
type Render<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

/// Тип, в который декодируются строки.
///
/// Запись создаётся через `Default` и заполняется поле за полем в порядке,
/// объявленном в [`describe`](Record::describe).
pub trait Record: Default + Send + 'static {
    /// Объявляет поля записи в порядке колонок источника.
    fn describe(schema: &mut SchemaBuilder<Self>);
}

/// Одно поле [`Schema`].
pub struct Field<T> {
    name: String,
    kind: FieldKind,
    min: Option<usize>,
    max: Option<usize>,
    assign: Assign<T>,
    render: Render<T>,
}

impl<T> Field<T> {
    /// Имя поля.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Объявленный тип.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Минимальная длина отображённого значения, если задана.
    #[must_use]
    pub fn min(&self) -> Option<usize> {
        self.min
    }

    /// Максимальная длина отображённого значения, если задана.
    #[must_use]
    pub fn max(&self) -> Option<usize> {
        self.max
    }

    /// Сохраняет преобразованное значение в запись. Возвращает `false`, если
    /// значение не помещается в Rust-тип поля.
    pub(crate) fn assign(&self, record: &mut T, value: Value) -> bool {
        (self.assign)(record, value)
    }

    /// Текущее значение поля в виде текста.
    pub(crate) fn render(&self, record: &T) -> String {
        (self.render)(record)
    }
}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("min", &self.min)
            .field("max", &self.max)
            .finish_non_exhaustive()
    }
}

/// Неизменяемый упорядоченный список полей для записей типа `T`.
///
/// Клонирование дешёвое: поля разделяются.
pub struct Schema<T> {
    fields: Arc<[Field<T>]>,
}

impl<T> Clone for Schema<T> {
    fn clone(&self) -> Self {
        Self { fields: Arc::clone(&self.fields) }
    }
}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.fields.iter()).finish()
    }
}

impl<T: Record> Schema<T> {
    /// Строит схему, объявленную типом `T`.
    ///
    /// # Errors
    ///
    /// [`SchemaError`], если аннотация границы некорректна или поле объявлено
    /// дважды.
    pub fn derive() -> Result<Self, SchemaError> {
        let mut builder = SchemaBuilder::new();
        T::describe(&mut builder);
        builder.build()
    }
}

impl<T> Schema<T> {
    /// Поля в позиционном порядке.
    #[must_use]
    pub fn fields(&self) -> &[Field<T>] {
        &self.fields
    }

    /// Число полей.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// `true`, если в схеме нет полей.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

struct PendingField<T> {
    name: String,
    kind: Result<FieldKind, String>,
    min: Option<String>,
    max: Option<String>,
    assign: Assign<T>,
    render: Render<T>,
}

/// Собирает объявления полей; [`build`](SchemaBuilder::build) их проверяет.
pub struct SchemaBuilder<T> {
    fields: Vec<PendingField<T>>,
}

impl<T> Default for SchemaBuilder<T> {
    fn default() -> Self {
        Self { fields: Vec::new() }
    }
}

impl<T: 'static> SchemaBuilder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Объявляет типизированное поле. Тип берётся из Rust-типа поля.
    pub fn field<F: FieldType>(
        &mut self,
        name: &str,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> FieldDecl<'_, T> {
        self.push(PendingField {
            name: name.to_string(),
            kind: Ok(F::KIND),
            min: None,
            max: None,
            assign: Arc::new(move |record: &mut T, value: Value| match F::from_value(value) {
                Some(v) => {
                    *get_mut(record) = v;
                    true
                }
                None => false,
            }),
            render: Arc::new(move |record: &T| get(record).render()),
        })
    }

    /// Объявляет поле по имени типа с явными аксессорами.
    ///
    /// Неизвестное имя типа [`build`](Self::build) сообщает как
    /// [`SchemaError::UnsupportedFieldKind`].
    pub fn declare(
        &mut self,
        name: &str,
        kind: &str,
        assign: impl Fn(&mut T, Value) -> bool + Send + Sync + 'static,
        render: impl Fn(&T) -> String + Send + Sync + 'static,
    ) -> FieldDecl<'_, T> {
        self.push(PendingField {
            name: name.to_string(),
            kind: FieldKind::from_name(kind).ok_or_else(|| kind.to_string()),
            min: None,
            max: None,
            assign: Arc::new(assign),
            render: Arc::new(render),
        })
    }

    fn push(&mut self, field: PendingField<T>) -> FieldDecl<'_, T> {
        self.fields.push(field);
        let last = self.fields.len() - 1;
        FieldDecl { field: &mut self.fields[last] }
    }

    /// Проверяет объявления и фиксирует их в [`Schema`].
    ///
    /// # Errors
    ///
    /// Первое некорректное объявление в порядке полей.
    pub fn build(self) -> Result<Schema<T>, SchemaError> {
        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(self.fields.len());

        for pending in self.fields {
            if !seen.insert(pending.name.clone()) {
                return Err(SchemaError::DuplicateField(pending.name));
            }
            let kind = pending.kind.map_err(|kind| SchemaError::UnsupportedFieldKind {
                field: pending.name.clone(),
                kind,
            })?;
            let min = parse_bound(&pending.name, "min", pending.min.as_deref())?;
            let max = parse_bound(&pending.name, "max", pending.max.as_deref())?;

            fields.push(Field {
                name: pending.name,
                kind,
                min,
                max,
                assign: pending.assign,
                render: pending.render,
            });
        }

        Ok(Schema { fields: fields.into() })
    }
}

fn parse_bound(
    field: &str,
    bound: &'static str,
    value: Option<&str>,
) -> Result<Option<usize>, SchemaError> {
    match value {
        None => Ok(None),
        Some(text) => text.parse::<usize>().map(Some).map_err(|_| SchemaError::InvalidBound {
            field: field.to_string(),
            bound,
            value: text.to_string(),
        }),
    }
}

/// Ссылка на только что объявленное поле, чтобы задать ограничения длины.
///
/// Границы задаются текстом, как аннотации, и разбираются в
/// [`SchemaBuilder::build`].
pub struct FieldDecl<'a, T> {
    field: &'a mut PendingField<T>,
}

impl<T> FieldDecl<'_, T> {
    /// Минимальная длина (включительно).
    pub fn min(self, bound: impl Into<String>) -> Self {
        self.field.min = Some(bound.into());
        self
    }

    /// Максимальная длина (включительно).
    pub fn max(self, bound: impl Into<String>) -> Self {
        self.field.max = Some(bound.into());
        self
    }
}

/// Реализует [`Record`] для структуры по списку её полей.
///
/// Поля сопоставляются по позиции в порядке перечисления. У каждого могут
/// быть аннотации длины `min`/`max`.
///
/// ```
/// use csvstream::record_schema;
///
/// #[derive(Debug, Default)]
/// struct Reading {
///     sensor: String,
///     value: f64,
///     ok: bool,
/// }
///
/// record_schema!(Reading { sensor [min = "1"], value, ok });
/// ```
#[macro_export]
macro_rules! record_schema {
    ($record:ty { $( $field:ident $( [ $( $key:ident = $bound:expr ),* $(,)? ] )? ),* $(,)? }) => {
        impl $crate::Record for $record {
            fn describe(schema: &mut $crate::SchemaBuilder<Self>) {
                $(
                    schema
                        .field(stringify!($field), |record| &record.$field, |record| &mut record.$field)
                        $( $( .$key($bound) )* )?;
                )*
            }
        }
    };
}
