//! Фоновая задача декодирования.

use std::sync::Arc;

use csv::StringRecord;
use tracing::{debug, trace};

use super::handoff::{Cancelled, Producer};
use crate::{decoder::RowDecoder, error::StreamError, options::Config, source::RowSource};

/// Как декодированные записи группируются в единицы передачи.
pub(crate) trait Granularity<T>: Send + 'static {
    type Unit: Send + 'static;

    /// Добавляет запись; возвращает единицу, когда она собрана.
    fn push(&mut self, record: T) -> Option<Self::Unit>;

    /// Возвращает неполную хвостовую единицу в конце источника, если есть.
    fn flush(&mut self) -> Option<Self::Unit>;
}

/// Одна запись на передачу.
pub(crate) struct PerRecord;

impl<T: Send + 'static> Granularity<T> for PerRecord {
    type Unit = T;

    fn push(&mut self, record: T) -> Option<T> {
        Some(record)
    }

    fn flush(&mut self) -> Option<T> {
        None
    }
}

/// Пачки фиксированного размера; без размера одна пачка в конце источника.
///
/// Буфер растёт по мере поступления записей: размер пачки может быть сколь
/// угодно большим.
pub(crate) struct PerChunk<T> {
    size: Option<usize>,
    buffer: Vec<T>,
}

impl<T> PerChunk<T> {
    pub(crate) fn new(size: Option<usize>) -> Self {
        Self { size, buffer: Vec::new() }
    }
}

impl<T: Send + 'static> Granularity<T> for PerChunk<T> {
    type Unit = Vec<T>;

    fn push(&mut self, record: T) -> Option<Vec<T>> {
        self.buffer.push(record);
        match self.size {
            Some(size) if self.buffer.len() >= size => Some(std::mem::take(&mut self.buffer)),
            _ => None,
        }
    }

    fn flush(&mut self) -> Option<Vec<T>> {
        (!self.buffer.is_empty()).then(|| std::mem::take(&mut self.buffer))
    }
}

/// Почему производство остановилось раньше времени.
enum Stop {
    Failed(StreamError),
    Cancelled,
}

impl From<StreamError> for Stop {
    fn from(err: StreamError) -> Self {
        Self::Failed(err)
    }
}

impl From<Cancelled> for Stop {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

/// Всё, чем владеет поток производителя.
pub(crate) struct Job<S, T, G> {
    pub(crate) source: S,
    pub(crate) decoder: RowDecoder<T>,
    pub(crate) config: Config,
    pub(crate) granularity: G,
}

impl<S, T, G> Job<S, T, G>
where
    S: RowSource,
    T: Default + Send + 'static,
    G: Granularity<T>,
{
    /// Работает до конца источника, первой ошибки или отмены.
    pub(crate) fn run(mut self, producer: Producer<G::Unit>) {
        debug!("producer started");

        let outcome = match self.produce(&producer) {
            Ok(rows) => {
                debug!(rows, "end of source");
                Ok(())
            }
            Err(Stop::Failed(err)) => {
                debug!(%err, "pipeline failed");
                Err(err)
            }
            Err(Stop::Cancelled) => {
                debug!("consumer released the pipeline, producer stopping");
                return;
            }
        };

        if producer.finish(outcome).is_err() {
            debug!("consumer released the pipeline before the terminal signal");
        }
    }

    /// Возвращает число прочитанных строк источника.
    fn produce(&mut self, producer: &Producer<G::Unit>) -> Result<usize, Stop> {
        self.source.open(&self.config)?;

        let mut row = StringRecord::new();
        let mut index = 0;

        loop {
            let more = self
                .source
                .read_row(&mut row)
                .map_err(|e| StreamError::Source { row: index, source: Arc::new(e) })?;
            if !more {
                break;
            }

            if let Some(record) = self.decoder.decode(&row, index)?
                && let Some(unit) = self.granularity.push(record)
            {
                trace!(row = index, "handing off");
                producer.deliver(unit)?;
            }
            index += 1;
        }

        if let Some(unit) = self.granularity.flush() {
            trace!(row = index, "handing off final chunk");
            producer.deliver(unit)?;
        }
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_chunk_cuts_at_size() {
        let mut chunks = PerChunk::new(Some(2));
        assert_eq!(chunks.push(1), None);
        assert_eq!(chunks.push(2), Some(vec![1, 2]));
        assert_eq!(chunks.push(3), None);
        assert_eq!(chunks.flush(), Some(vec![3]));
        assert_eq!(chunks.flush(), None);
    }

    #[test]
    fn huge_size_grows_with_records() {
        let mut chunks = PerChunk::new(Some(usize::MAX));
        assert_eq!(chunks.push(1), None);
        assert_eq!(chunks.push(2), None);
        assert_eq!(chunks.flush(), Some(vec![1, 2]));
    }

    #[test]
    fn unsized_chunk_waits_for_flush() {
        let mut chunks = PerChunk::new(None);
        for i in 0..100 {
            assert_eq!(chunks.push(i), None);
        }
        assert_eq!(chunks.flush().map(|c| c.len()), Some(100));
    }

    #[test]
    fn empty_flush_is_none() {
        let mut chunks = PerChunk::<u8>::new(Some(3));
        assert_eq!(chunks.flush(), None);
    }

    #[test]
    fn per_record_passes_through() {
        let mut rows = PerRecord;
        assert_eq!(Granularity::<u8>::push(&mut rows, 5), Some(5));
        assert_eq!(Granularity::<u8>::flush(&mut rows), None);
    }
}
