//! The input command queue.
//!
//! This is the only structure shared across threads: an unbounded FIFO
//! fed by any number of producer threads and drained by the tick loop.
//! Producers hold cloneable [`CommandSink`]s; the game owns the single
//! [`CommandQueue`] receiver and drains it without blocking.
//!
//! Ordering: commands are applied in strict arrival order within a tick.
//! Commands enqueued concurrently with a drain in progress may land in
//! this tick or the next.

use std::sync::mpsc::{channel, Receiver, Sender};

use super::command::Command;

/// Sending half of the input queue.
///
/// Cheap to clone; one per producer thread. Sends never block. If the
/// game has been dropped the command is silently discarded.
#[derive(Clone)]
pub struct CommandSink {
    tx: Sender<Command>,
}

impl CommandSink {
    /// Enqueue a command.
    pub fn send(&self, cmd: Command) {
        if self.tx.send(cmd).is_err() {
            tracing::debug!("command dropped: queue receiver is gone");
        }
    }
}

impl std::fmt::Debug for CommandSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CommandSink")
    }
}

/// Receiving half of the input queue, owned by the game loop.
pub struct CommandQueue {
    tx: Sender<Command>,
    rx: Receiver<Command>,
}

impl CommandQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = channel();
        Self { tx, rx }
    }

    /// A new sink feeding this queue.
    #[must_use]
    pub fn sink(&self) -> CommandSink {
        CommandSink {
            tx: self.tx.clone(),
        }
    }

    /// Drain every command currently enqueued, in FIFO order.
    ///
    /// Non-blocking: returns immediately when the queue is empty.
    pub fn drain(&self) -> Vec<Command> {
        self.rx.try_iter().collect()
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CommandQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CommandQueue")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cell::Cell;
    use crate::core::command::EventKind;

    #[test]
    fn test_fifo_order_within_one_drain() {
        let queue = CommandQueue::new();
        let sink = queue.sink();

        sink.send(Command::for_piece(1, "a", EventKind::Move, &[]));
        sink.send(Command::for_piece(2, "b", EventKind::Jump, &[]));

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].piece_id.as_deref(), Some("a"));
        assert_eq!(drained[1].piece_id.as_deref(), Some("b"));
    }

    #[test]
    fn test_drain_empty_is_nonblocking() {
        let queue = CommandQueue::new();
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_sinks_from_multiple_threads() {
        let queue = CommandQueue::new();
        let mut handles = Vec::new();

        for i in 0..4 {
            let sink = queue.sink();
            handles.push(std::thread::spawn(move || {
                sink.send(Command::for_piece(
                    i,
                    format!("p{i}"),
                    EventKind::Idle,
                    &[Cell::new(0, 0)],
                ));
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(queue.drain().len(), 4);
    }

    #[test]
    fn test_send_after_queue_dropped_is_silent() {
        let queue = CommandQueue::new();
        let sink = queue.sink();
        drop(queue);

        // Must not panic.
        sink.send(Command::for_piece(0, "x", EventKind::Idle, &[]));
    }
}
