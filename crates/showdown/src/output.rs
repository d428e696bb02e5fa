//! Outbound command queue and the pacing drain loop.
//!
//! Producers (commands, hooks, periodic tasks) push [`OutputItem`]s into an
//! unbounded FIFO and never wait. A single drain task pops one item at a
//! time, writes it as one frame, and then sleeps so that an item of `n`
//! commands occupies at least `n × per_command_delay` of wall time before
//! the next item goes out.

use std::ops::ControlFlow;
use std::time::Duration;

use showdown_interval::Work;
use showdown_protocol::{encode_output, ProtocolError};
use showdown_transport::Connection;
use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::ShowdownError;

/// A batch of commands sent together as one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputItem {
    commands: Vec<String>,
}

impl OutputItem {
    /// An item with one command.
    pub fn single(command: impl Into<String>) -> Self {
        Self {
            commands: vec![command.into()],
        }
    }

    /// An item with several commands, kept in order.
    pub fn batch<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            commands: commands.into_iter().map(Into::into).collect(),
        }
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// The wire frame for this item.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        encode_output(&self.commands)
    }
}

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

/// Unbounded FIFO of pending output items.
///
/// The queue outlives connections: items enqueued while disconnected, or
/// left over when a connection dropped, go out on the next one.
pub(crate) struct OutputQueue {
    tx: mpsc::UnboundedSender<OutputItem>,
    rx: Mutex<mpsc::UnboundedReceiver<OutputItem>>,
}

impl OutputQueue {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
        }
    }

    /// Appends an item. Never blocks.
    pub(crate) fn push(&self, item: OutputItem) {
        if item.is_empty() {
            return;
        }
        trace!(commands = ?item.commands(), "queued output");
        // The receiver lives in `self`, so the channel cannot be closed.
        let _ = self.tx.send(item);
    }

    /// Waits for the next item.
    pub(crate) async fn next(&self) -> Option<OutputItem> {
        self.rx.lock().await.recv().await
    }

    #[cfg(test)]
    pub(crate) fn try_next(&self) -> Option<OutputItem> {
        self.rx.try_lock().ok()?.try_recv().ok()
    }
}

// ---------------------------------------------------------------------------
// Drain
// ---------------------------------------------------------------------------

/// Writes queued items to a connection, one per run.
pub(crate) struct Drain<'a, C> {
    conn: &'a C,
    queue: &'a OutputQueue,
    per_command_delay: Duration,
}

impl<'a, C: Connection> Drain<'a, C> {
    pub(crate) fn new(conn: &'a C, queue: &'a OutputQueue, per_command_delay: Duration) -> Self {
        Self {
            conn,
            queue,
            per_command_delay,
        }
    }
}

impl<C: Connection> Work for Drain<'_, C> {
    type Error = ShowdownError;

    async fn run_once(&mut self) -> Result<ControlFlow<()>, ShowdownError> {
        let Some(item) = self.queue.next().await else {
            return Ok(ControlFlow::Break(()));
        };

        let started = Instant::now();
        let frame = item.encode()?;
        debug!(conn = %self.conn.id(), commands = ?item.commands(), ">>> sending");
        self.conn.send(&frame).await?;

        let budget = self.per_command_delay.saturating_mul(item.len() as u32);
        let remaining = budget.saturating_sub(started.elapsed());
        if !remaining.is_zero() {
            tokio::time::sleep(remaining).await;
        }
        Ok(ControlFlow::Continue(()))
    }
}
