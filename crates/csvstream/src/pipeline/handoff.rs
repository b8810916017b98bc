//! Передача с одним слотом между производителем и потребителем.
//!
//! Два ограниченных канала ёмкостью 1:
//!
//! - `data` несёт [`Message`] от производителя к потребителю;
//! - `ready` несёт обратно разрешение потребителя продолжать.
//!
//! Передав элемент, производитель блокируется на `ready`; потребитель отправляет
//! разрешение в начале следующего запроса. Поэтому в полёте не больше одного
//! элемента, и производитель не декодирует впрок.
//!
//! Удаление любой из сторон разрывает оба канала: производитель, ждущий на
//! `ready` или отправляющий в `data`, видит разрыв и останавливается.
//!
//! Ожидание потребителя можно прервать сигналом отмены: это канал, который
//! никогда не несёт сообщений и срабатывает, когда его отправитель удалён.

use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded, select};

use crate::error::StreamError;

/// Что идёт от производителя к потребителю.
#[derive(Debug)]
pub(crate) enum Message<U> {
    Item(U),
    End,
    Failed(StreamError),
}

/// Потребитель ушёл.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cancelled;

/// Создаёт связанную пару производитель/потребитель.
pub(crate) fn handoff<U>() -> (Producer<U>, Consumer<U>) {
    let (data_tx, data_rx) = bounded(1);
    let (ready_tx, ready_rx) = bounded(1);
    (
        Producer { data: data_tx, ready: ready_rx },
        Consumer { data: data_rx, ready: ready_tx, awaiting_ack: false },
    )
}

/// Сработал ли сигнал отмены. Канал без отправителей означает отмену.
pub(crate) fn is_cancelled(cancel: &Receiver<()>) -> bool {
    matches!(cancel.try_recv(), Err(TryRecvError::Disconnected))
}

/// Сторона производителя.
pub(crate) struct Producer<U> {
    data: Sender<Message<U>>,
    ready: Receiver<()>,
}

impl<U> Producer<U> {
    /// Передаёт элемент и ждёт, пока потребитель попросит следующий.
    pub(crate) fn deliver(&self, item: U) -> Result<(), Cancelled> {
        self.data.send(Message::Item(item)).map_err(|_| Cancelled)?;
        self.ready.recv().map_err(|_| Cancelled)
    }

    /// Отправляет терминальный сигнал, не дожидаясь подтверждения.
    pub(crate) fn finish(self, outcome: Result<(), StreamError>) -> Result<(), Cancelled> {
        let message = match outcome {
            Ok(()) => Message::End,
            Err(err) => Message::Failed(err),
        };
        self.data.send(message).map_err(|_| Cancelled)
    }
}

/// Сторона потребителя.
pub(crate) struct Consumer<U> {
    data: Receiver<Message<U>>,
    ready: Sender<()>,
    awaiting_ack: bool,
}

impl<U> Consumer<U> {
    /// Отпускает предыдущую передачу и ждёт следующего сообщения.
    ///
    /// Возвращает `None`, если сработал `cancel`. После отмены разрешение
    /// производителю не отправляется.
    pub(crate) fn pull(&mut self, cancel: &Receiver<()>) -> Option<Message<U>> {
        if is_cancelled(cancel) {
            return None;
        }

        if self.awaiting_ack {
            self.awaiting_ack = false;
            // Неудачная отправка значит, что производителя нет; оставленное им
            // в `data` всё равно будет прочитано ниже.
            let _ = self.ready.send(());
        }

        select! {
            recv(self.data) -> message => Some(match message {
                Ok(Message::Item(item)) => {
                    self.awaiting_ack = true;
                    Message::Item(item)
                }
                Ok(terminal) => terminal,
                Err(_) => Message::Failed(StreamError::ProducerLost),
            }),
            recv(cancel) -> _ => None,
        }
    }
}
