//! Отмена конвейера из другого потока.

use std::sync::{Arc, Mutex, PoisonError};

use crossbeam_channel::{Receiver, Sender, bounded};

use super::handoff::is_cancelled;

/// Прерывает потоки, к которым подключён, в том числе заблокированные в
/// [`Stream::pull`](super::Stream::pull).
///
/// Отмена необратима и действует на все клоны. Безопасно вызывать из
/// обработчика сигнала.
///
/// ```
/// use csvstream::{Canceller, Client, MemorySource, Options, Pull, PipelineState, record_schema};
///
/// #[derive(Debug, Default)]
/// struct Person {
///     name: String,
/// }
///
/// record_schema!(Person { name });
///
/// let canceller = Canceller::new();
/// let source = MemorySource::new(vec![vec!["NAME"], vec!["Sarah"]]);
/// let mut rows = Client::<Person, _>::new(source, &Options::default())
///     .unwrap()
///     .cancel_with(&canceller)
///     .rows();
///
/// canceller.cancel();
/// assert!(matches!(rows.pull(), Pull::End));
/// assert!(matches!(rows.state(), PipelineState::Released));
/// ```
#[derive(Debug, Clone)]
pub struct Canceller {
    trigger: Arc<Mutex<Option<Sender<()>>>>,
    signal: Receiver<()>,
}

impl Default for Canceller {
    fn default() -> Self {
        Self::new()
    }
}

impl Canceller {
    #[must_use]
    pub fn new() -> Self {
        let (trigger, signal) = bounded(0);
        Self { trigger: Arc::new(Mutex::new(Some(trigger))), signal }
    }

    /// Отменяет все подключённые потоки. Повторный вызов ничего не делает.
    pub fn cancel(&self) {
        // Удаление отправителя будит всех, кто ждёт на `signal`.
        self.trigger.lock().unwrap_or_else(PoisonError::into_inner).take();
    }

    /// `true` после [`cancel`](Self::cancel).
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        is_cancelled(&self.signal)
    }

    pub(crate) fn signal(&self) -> Receiver<()> {
        self.signal.clone()
    }
}
