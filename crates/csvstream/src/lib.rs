//! Потоковое декодирование текста с разделителями в типизированные записи.
//!
//! Строки читаются и декодируются в фоновом потоке и передаются потребителю по
//! одной (или по чанку). Производитель не опережает потребителя больше чем на
//! одну единицу, поэтому память не растёт с размером источника.
//!
//! Каждая строка проходит:
//!
//! 1. пропуск заголовка (строка 0, если включён);
//! 2. проверку ширины: поля схемы плюс пропускаемые колонки;
//! 3. позиционное приведение непропущенных колонок к полям записи;
//! 4. проверку длины декодированных полей.
//!
//! Первая ошибка останавливает производство и приходит через тот же запрос,
//! что доставляет записи.
//!
//! # Быстрый старт
//!
//! ```
//! use csvstream::{Client, Options, record_schema};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Customer {
//!     first_name: String,
//!     age: i64,
//! }
//!
//! record_schema!(Customer { first_name [min = "1", max = "10"], age });
//!
//! let data = "NAME,AGE\nSarah,12\nJohn,21\n";
//! let client = Client::<Customer, _>::from_reader(data.as_bytes(), &Options::default()).unwrap();
//!
//! let customers: Vec<Customer> = client.rows().collect::<Result<_, _>>().unwrap();
//! assert_eq!(customers.len(), 2);
//! assert_eq!(customers[1], Customer { first_name: "John".into(), age: 21 });
//! ```

mod client;
pub mod coerce;
pub mod decoder;
pub mod error;
pub mod options;
pub mod pipeline;
pub mod schema;
pub mod source;
pub mod validation;

pub use client::Client;
pub use coerce::{FieldKind, Value, coerce};
pub use csv::StringRecord;
pub use decoder::RowDecoder;
pub use error::{ConfigError, LengthBound, Result, SchemaError, StreamError};
pub use options::{Config, Options};
pub use pipeline::{Canceller, PipelineState, Pull, Stream};
pub use schema::{DynamicRecord, Field, FieldDecl, FieldType, Record, Schema, SchemaBuilder};
pub use source::{CsvFileSource, CsvReaderSource, MemorySource, RowSource};
