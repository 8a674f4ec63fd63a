//! Command producers.
//!
//! A producer is any thread that pushes commands into the game's queue —
//! a keyboard reader, a network session, a scripted player. The core
//! assumes nothing about producer count or cadence; it only drains the
//! queue. Real input devices are out of scope, so the producer here is
//! generic over a [`CommandSource`].
//!
//! Shutdown is cooperative and does not involve the tick loop: `stop`
//! flips a flag and unparks the thread, so a parked producer exits
//! promptly. `stop` is idempotent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::core::{Command, CommandSink};

/// Something a producer thread polls for pending commands.
pub trait CommandSource: Send {
    /// The next pending command, or `None` when the source is idle.
    fn poll(&mut self) -> Option<Command>;
}

impl<F> CommandSource for F
where
    F: FnMut() -> Option<Command> + Send,
{
    fn poll(&mut self) -> Option<Command> {
        self()
    }
}

/// A background thread feeding a [`CommandSink`] from a [`CommandSource`].
pub struct CommandProducer {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl CommandProducer {
    /// Spawn a producer that drains `source` into `sink`, parking for
    /// `poll_interval` between polls while the source is idle.
    #[must_use]
    pub fn spawn<S>(sink: CommandSink, mut source: S, poll_interval: Duration) -> Self
    where
        S: CommandSource + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let handle = std::thread::spawn(move || {
            while flag.load(Ordering::Acquire) {
                while let Some(cmd) = source.poll() {
                    sink.send(cmd);
                }
                std::thread::park_timeout(poll_interval);
            }
            tracing::debug!("command producer stopped");
        });

        Self {
            running,
            handle: Some(handle),
        }
    }

    /// Whether the producer thread is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Request the thread to stop and wait for it to exit.
    ///
    /// Interrupts a parked thread; safe to call repeatedly.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle.thread().unpark();
            let _ = handle.join();
        }
    }
}

impl Drop for CommandProducer {
    fn drop(&mut self) {
        self.stop();
    }
}
