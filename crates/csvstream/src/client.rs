//! Точка входа: схема, источник и опции вместе.

use std::{io::Read, path::Path};

use crossbeam_channel::{Receiver, never};
use tracing::debug;

use crate::{
    decoder::RowDecoder,
    error::{ConfigError, Result, StreamError},
    options::{Config, Options},
    pipeline::{Canceller, Job, PerChunk, PerRecord, PipelineState, Stream},
    schema::{Record, Schema},
    source::{CsvFileSource, CsvReaderSource, RowSource},
};

/// Настроенный, но ещё не запущенный конвейер записей типа `T`.
///
/// Всё, что можно проверить без данных, проверяется при создании: схема
/// выводится, опции валидируются. Плохой разделитель или неверная граница длины
/// дают ошибку здесь, до открытия источника.
///
/// # Пример
///
/// ```ignore
/// use csvstream::{Client, Options};
///
/// let client = Client::<Customer, _>::open("customers.csv", &Options::default())?;
/// for customer in client.rows() {
///     let customer = customer?;
///     println!("{customer:?}");
/// }
/// ```
pub struct Client<T, S> {
    schema: Schema<T>,
    config: Config,
    source: S,
    cancel: Receiver<()>,
}

impl<T: Record> Client<T, CsvFileSource> {
    /// Конвейер по CSV-файлу. Файл открывается при запуске потока.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] при неверных опциях или схеме.
    pub fn open(path: impl AsRef<Path>, options: &Options) -> std::result::Result<Self, ConfigError> {
        Self::new(CsvFileSource::new(path), options)
    }
}

impl<T: Record, R: Read + Send + 'static> Client<T, CsvReaderSource<R>> {
    /// Конвейер по CSV-данным из любого читателя.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] при неверных опциях или схеме.
    pub fn from_reader(reader: R, options: &Options) -> std::result::Result<Self, ConfigError> {
        Self::new(CsvReaderSource::new(reader), options)
    }
}

impl<T: Record, S: RowSource> Client<T, S> {
    /// Конвейер по произвольному источнику со схемой, объявленной в `T`.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] при неверных опциях или схеме.
    pub fn new(source: S, options: &Options) -> std::result::Result<Self, ConfigError> {
        Self::with_schema(Schema::derive()?, source, options)
    }
}

impl<T, S> Client<T, S>
where
    T: Default + Send + 'static,
    S: RowSource,
{
    /// Конвейер с явно собранной схемой.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] при неверных опциях.
    pub fn with_schema(
        schema: Schema<T>,
        source: S,
        options: &Options,
    ) -> std::result::Result<Self, ConfigError> {
        let config = options.validate(schema.len())?;
        debug!(fields = schema.len(), skip = config.skip_columns().len(), "client configured");
        Ok(Self { schema, config, source, cancel: never() })
    }

    /// Схема, по которой декодируются записи.
    #[must_use]
    pub fn schema(&self) -> &Schema<T> {
        &self.schema
    }

    /// Проверенная конфигурация.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Подключает потоки этого клиента к `canceller`.
    ///
    /// После [`Canceller::cancel`] ожидающий или следующий запрос возвращает
    /// конец данных, а поток переходит в [`PipelineState::Released`].
    #[must_use]
    pub fn cancel_with(mut self, canceller: &Canceller) -> Self {
        self.cancel = canceller.signal();
        self
    }

    /// Запускает поток по одной записи на запрос.
    pub fn rows(self) -> Stream<T> {
        let cancel = self.cancel.clone();
        let mut stream = Stream::new(self.into_job(PerRecord), cancel);
        stream.start();
        stream
    }

    /// Запускает поток чанков записей.
    ///
    /// В чанке `chunk_size` записей, кроме последнего, где остаток. Без
    /// размера чанка весь источник приходит одним чанком в конце данных.
    pub fn chunks(self) -> Stream<Vec<T>> {
        let chunk_size = self.config.chunk_size();
        let cancel = self.cancel.clone();
        let mut stream = Stream::new(self.into_job(PerChunk::new(chunk_size)), cancel);
        stream.start();
        stream
    }

    /// Читает все записи: либо все, либо ничего.
    ///
    /// # Errors
    ///
    /// Первая ошибка; записи, декодированные до неё, отбрасываются.
    /// [`StreamError::Cancelled`], если конвейер отменён до конца данных.
    pub fn read_all(self) -> Result<Vec<T>> {
        let mut stream = self.rows();
        let mut records = Vec::new();

        let outcome = loop {
            match stream.pull().into_result() {
                Ok(Some(record)) => records.push(record),
                Ok(None) if matches!(stream.state(), PipelineState::Released) => {
                    break Err(StreamError::Cancelled);
                }
                Ok(None) => break Ok(records),
                Err(err) => break Err(err),
            }
        };

        stream.close();
        outcome
    }

    fn into_job<G>(self, granularity: G) -> Job<S, T, G> {
        let decoder = RowDecoder::new(self.schema, &self.config);
        Job { source: self.source, decoder, config: self.config, granularity }
    }
}
