//! Shared work queue between the listing producer and the download workers.
//!
//! [`WorkQueue`] is an unbounded FIFO of [`WorkItem`]s. Besides the pending
//! items it tracks how many items are claimed by workers, so "nothing left to
//! do" can be told apart from "the last download is still being written".
//!
//! # Lifecycle of an item
//!
//! ```text
//! push ──► pending ──pop──► in flight ──complete──► (gone)
//!             ▲                  │
//!             └─────requeue──────┘
//! ```
//!
//! # Example
//!
//! ```
//! use qcfetch_core::queue::{WorkItem, WorkQueue};
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let queue = WorkQueue::new();
//! queue.push(WorkItem::new(
//!     Url::parse("http://archive.test/Compound_1_0/1.mol")?,
//!     "/data/1_0/structure-file/1.mol",
//! ));
//!
//! if let Some(item) = queue.pop().await {
//!     // ... download the item ...
//!     queue.complete();
//! }
//! assert!(queue.is_idle());
//! # Ok(())
//! # }
//! ```

mod item;

pub use item::{WorkItem, category_dir};

use std::collections::VecDeque;
use std::pin::pin;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tracing::trace;

/// Point-in-time view of the queue, for progress reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueDepth {
    /// Items waiting to be claimed.
    pub pending: usize,
    /// Items claimed by a worker and not yet finished.
    pub in_flight: usize,
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<WorkItem>,
    in_flight: usize,
    closed: bool,
}

/// Unbounded multi-producer, multi-consumer FIFO of download work.
#[derive(Debug, Default)]
pub struct WorkQueue {
    state: Mutex<QueueState>,
    notify: Notify,
}

impl WorkQueue {
    /// Creates an empty, open queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // The state is plain data; a panic elsewhere cannot leave it torn.
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an item at the tail.
    pub fn push(&self, item: WorkItem) {
        trace!(url = %item.url, "queued");
        self.lock().pending.push_back(item);
        self.notify.notify_one();
    }

    /// Claims the item at the head, waiting while the queue is empty.
    ///
    /// Returns `None` only once the queue has been closed and drained.
    /// Every claimed item must be released with [`complete`](Self::complete)
    /// or [`requeue`](Self::requeue).
    pub async fn pop(&self) -> Option<WorkItem> {
        loop {
            let mut notified = pin!(self.notify.notified());
            notified.as_mut().enable();
            {
                let mut state = self.lock();
                if let Some(item) = state.pending.pop_front() {
                    state.in_flight += 1;
                    return Some(item);
                }
                if state.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Releases a claim after the item was handled.
    pub fn complete(&self) {
        let mut state = self.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
    }

    /// Puts a claimed item back at the tail and releases the claim.
    ///
    /// Both happen under one lock, so the queue never looks idle in between.
    pub fn requeue(&self, item: WorkItem) {
        {
            let mut state = self.lock();
            state.pending.push_back(item);
            state.in_flight = state.in_flight.saturating_sub(1);
        }
        self.notify.notify_one();
    }

    /// Number of items waiting to be claimed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    /// Returns true when no item is waiting to be claimed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().pending.is_empty()
    }

    /// Number of claimed items not yet released.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    /// Pending and in-flight counts, read together.
    #[must_use]
    pub fn depth(&self) -> QueueDepth {
        let state = self.lock();
        QueueDepth {
            pending: state.pending.len(),
            in_flight: state.in_flight,
        }
    }

    /// Returns true when nothing is pending and nothing is in flight.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        let state = self.lock();
        state.pending.is_empty() && state.in_flight == 0
    }

    /// Closes the queue: waiting workers wake up and get `None` once the
    /// remaining items are drained.
    pub fn close(&self) {
        self.lock().closed = true;
        self.notify.notify_waiters();
    }

    /// Returns true once [`close`](Self::close) was called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}
