use std::time::Instant;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};

use super::types::{Command, CommandSource};

/// Outcome of waiting on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    Command(Command, CommandSource),
    /// The deadline passed with nothing received
    Idle,
    /// Every sender is gone
    Closed,
}

/// Central command bus between the input thread and the engine loop
pub struct CommandBus {
    tx: Sender<(Command, CommandSource)>,
    rx: Receiver<(Command, CommandSource)>,
}

impl CommandBus {
    pub fn new() -> Self {
        let (tx, rx) = bounded(256);
        Self { tx, rx }
    }

    /// Get a sender that can be cloned and moved to another thread
    pub fn sender(&self) -> CommandSender {
        CommandSender {
            tx: self.tx.clone(),
        }
    }

    /// Split into a receiver for the engine loop.
    ///
    /// Consumes the bus so the loop sees `Poll::Closed` once the last
    /// `CommandSender` is dropped.
    pub fn into_receiver(self) -> CommandReceiver {
        CommandReceiver { rx: self.rx }
    }
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable sender for dispatching commands
#[derive(Clone)]
pub struct CommandSender {
    tx: Sender<(Command, CommandSource)>,
}

impl CommandSender {
    /// Send a command (non-blocking, drops if buffer full)
    pub fn send(&self, cmd: Command, source: CommandSource) -> bool {
        match self.tx.try_send((cmd, source)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::warn!("command buffer full, dropping {:?}", cmd);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Receiver for consuming commands
pub struct CommandReceiver {
    rx: Receiver<(Command, CommandSource)>,
}

impl CommandReceiver {
    /// Try to receive a command (non-blocking)
    pub fn try_recv(&self) -> Option<(Command, CommandSource)> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next command, giving up at `deadline`. Without a deadline
    /// this blocks until a command arrives or the bus closes.
    pub fn poll_until(&self, deadline: Option<Instant>) -> Poll {
        let received = match deadline {
            Some(deadline) => self.rx.recv_deadline(deadline),
            None => self.rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match received {
            Ok((cmd, source)) => Poll::Command(cmd, source),
            Err(RecvTimeoutError::Timeout) => Poll::Idle,
            Err(RecvTimeoutError::Disconnected) => Poll::Closed,
        }
    }
}
