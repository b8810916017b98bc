//! Потоковый конвейер: производитель, декодирующий строки в фоне, и
//! потребитель, запрашивающий результаты.
//!
//! Производитель работает в своём потоке и передаёт по одной единице (запись в
//! построчном режиме, `Vec` записей в режиме чанков) через передачу с одним
//! слотом. Следующую единицу он не начинает, пока потребитель не запросит её,
//! поэтому память ограничена одной единицей независимо от размера источника.
//!
//! Любой исход доходит до потребителя через [`Stream::pull`]: элемент, конец
//! данных или первая ошибка. Оба терминальных сигнала окончательны; повторные
//! запросы сообщают то же самое, не трогая источник.
//!
//! ```
//! use csvstream::{Client, MemorySource, Options, Pull, record_schema};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Person {
//!     name: String,
//!     age: i64,
//! }
//!
//! record_schema!(Person { name, age });
//!
//! let source = MemorySource::new(vec![vec!["NAME", "AGE"], vec!["Sarah", "12"]]);
//! let mut rows = Client::<Person, _>::new(source, &Options::default()).unwrap().rows();
//!
//! assert!(matches!(rows.pull(), Pull::Item(Person { ref name, age: 12 }) if name == "Sarah"));
//! assert!(matches!(rows.pull(), Pull::End));
//! assert!(!rows.has_more());
//! ```

mod cancel;
mod handoff;
mod producer;

use std::{fmt, thread::JoinHandle};

use crossbeam_channel::Receiver;
use tracing::debug;

pub use self::cancel::Canceller;
pub(crate) use self::producer::{Granularity, Job, PerChunk, PerRecord};
use self::handoff::{Consumer, Message, Producer, handoff, is_cancelled};
use crate::error::{Result, StreamError};

/// Результат одного [`Stream::pull`].
#[derive(Debug)]
pub enum Pull<U> {
    /// Следующая запись (построчный режим) или чанк (режим чанков).
    Item(U),
    /// Источник исчерпан или поток освобождён.
    End,
    /// Производство остановлено этой ошибкой.
    Failed(StreamError),
}

impl<U> Pull<U> {
    /// Преобразует в `Ok(Some(item))`, `Ok(None)` в конце или `Err`.
    pub fn into_result(self) -> Result<Option<U>> {
        match self {
            Self::Item(item) => Ok(Some(item)),
            Self::End => Ok(None),
            Self::Failed(err) => Err(err),
        }
    }
}

/// Жизненный цикл [`Stream`].
///
/// `Idle → Running → {Done | Failed | Released}`; последние три терминальны.
#[derive(Debug, Clone)]
pub enum PipelineState {
    /// Не запущен, источник ещё не открыт.
    Idle,
    /// Производитель читает источник.
    Running,
    /// Источник исчерпан без ошибок.
    Done,
    /// Первая ошибка остановила производство.
    Failed(StreamError),
    /// Потребитель закрыл или отменил поток до терминального сигнала.
    Released,
}

impl PipelineState {
    /// `true`, пока следующие запросы могут вернуть элементы.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Idle | Self::Running)
    }
}

type Launch<U> = Box<dyn FnOnce(Producer<U>) + Send>;

/// Потребитель работающего конвейера.
///
/// Кроме [`pull`](Self::pull), поток реализует [`Iterator`] по `Result<U>`:
/// элементы, затем не больше одного `Err`, затем `None`.
///
/// Удаление потока освобождает его.
pub struct Stream<U> {
    state: PipelineState,
    launch: Option<Launch<U>>,
    consumer: Option<Consumer<U>>,
    worker: Option<JoinHandle<()>>,
    cancel: Receiver<()>,
    delivered: usize,
}

impl<U: Send + 'static> Stream<U> {
    /// Создаёт незапущенный поток вокруг задачи производителя.
    pub(crate) fn new<S, T, G>(job: Job<S, T, G>, cancel: Receiver<()>) -> Self
    where
        S: crate::source::RowSource,
        T: Default + Send + 'static,
        G: Granularity<T, Unit = U>,
    {
        Self {
            state: PipelineState::Idle,
            launch: Some(Box::new(move |producer: Producer<U>| job.run(producer))),
            consumer: None,
            worker: None,
            cancel,
            delivered: 0,
        }
    }

    /// Запускает производителя. Ничего не делает, если поток уже не в `Idle`.
    pub fn start(&mut self) {
        let Some(launch) = self.launch.take() else {
            return;
        };
        let (producer, consumer) = handoff();
        self.worker = Some(std::thread::spawn(move || launch(producer)));
        self.consumer = Some(consumer);
        self.state = PipelineState::Running;
        debug!("pipeline started");
    }

    /// Отпускает предыдущий элемент производителю и ждёт следующего исхода.
    ///
    /// Запускает производителя, если поток ещё в `Idle`. После терминального
    /// исхода возвращает его же, ничего не делая. Освобождённый или отменённый
    /// поток возвращает [`Pull::End`], а его состояние становится
    /// [`PipelineState::Released`].
    pub fn pull(&mut self) -> Pull<U> {
        match &self.state {
            PipelineState::Idle if is_cancelled(&self.cancel) => {
                self.close();
                return Pull::End;
            }
            PipelineState::Idle => self.start(),
            PipelineState::Running => {}
            PipelineState::Done | PipelineState::Released => return Pull::End,
            PipelineState::Failed(err) => return Pull::Failed(err.clone()),
        }

        let Some(consumer) = self.consumer.as_mut() else {
            return Pull::End;
        };

        let Some(message) = consumer.pull(&self.cancel) else {
            debug!(delivered = self.delivered, "pipeline cancelled");
            self.close();
            return Pull::End;
        };

        match message {
            Message::Item(item) => {
                self.delivered += 1;
                Pull::Item(item)
            }
            Message::End => {
                debug!(delivered = self.delivered, "pipeline done");
                self.state = PipelineState::Done;
                self.release();
                Pull::End
            }
            Message::Failed(err) => {
                debug!(%err, delivered = self.delivered, "pipeline failed");
                self.state = PipelineState::Failed(err.clone());
                self.release();
                Pull::Failed(err)
            }
        }
    }
}

impl<U> Stream<U> {
    /// Может ли запрос ещё вернуть элемент. `false` после терминального исхода.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.state.is_running()
    }

    /// Текущее состояние.
    #[must_use]
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Сколько элементов отдано потребителю.
    #[must_use]
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// Освобождает конвейер. Можно вызывать повторно; никогда не блокируется.
    ///
    /// Производитель, ждущий передачи, видит освобождение и завершается сам.
    pub fn close(&mut self) {
        if self.state.is_running() {
            self.state = PipelineState::Released;
            debug!(delivered = self.delivered, "pipeline released");
        }
        self.launch = None;
        self.release();
    }

    fn release(&mut self) {
        self.consumer = None;
        if let Some(worker) = self.worker.take()
            && worker.is_finished()
            && worker.join().is_err()
        {
            debug!("producer thread panicked");
        }
    }
}

impl<U> Drop for Stream<U> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<U: Send + 'static> Iterator for Stream<U> {
    type Item = Result<U>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.has_more() {
            return None;
        }
        self.pull().into_result().transpose()
    }
}

impl<U> fmt::Debug for Stream<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("state", &self.state)
            .field("delivered", &self.delivered)
            .finish_non_exhaustive()
    }
}
