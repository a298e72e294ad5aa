//! The serialized store: FIFO mutator queue drained by one worker task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::error::StoreError;
use crate::stream::StateStream;

type BoxedMutator<S> = Box<dyn FnOnce(S) -> S + Send + 'static>;

/// The seam controllers program against; [`StateStore`] is the production
/// implementation. Test doubles can apply mutators synchronously.
pub trait ModelStore<S>: Send + Sync
where
    S: Clone + Send + Sync + 'static,
{
    /// Queue a mutator for application. Never blocks; the mutator runs later
    /// on the store's worker, after everything queued ahead of it.
    ///
    /// Mutators must be total and cheap: a panic kills the store's worker,
    /// and a blocking mutator stalls every submission behind it. Resolve
    /// fallible or slow work into a plain value first, then submit a mutator
    /// that records it.
    fn submit<F>(&self, mutator: F) -> Result<(), StoreError>
    where
        F: FnOnce(S) -> S + Send + 'static;

    /// The latest applied snapshot. Never blocks, and keeps answering after
    /// the worker has stopped.
    fn current(&self) -> S;

    /// A replay-latest subscription: the current snapshot first, then every
    /// later publication in order, conflated if the subscriber lags.
    fn subscribe(&self) -> StateStream<S>;
}

/// A concurrency-safe container for one controller's state.
///
/// Submissions from any task or thread land on an unbounded FIFO queue; a
/// dedicated worker applies them one at a time and publishes each result
/// before dequeuing the next. That single worker is the mutual-exclusion
/// boundary: no snapshot is ever produced from a stale read, no two mutators
/// ever run concurrently, and subscribers never observe a half-applied
/// update.
///
/// Per-caller submission order is preserved because `submit` enqueues
/// synchronously in the caller's context. The order between two racing
/// callers is whichever enqueue wins.
pub struct StateStore<S> {
    queue: mpsc::UnboundedSender<BoxedMutator<S>>,
    state_rx: watch::Receiver<S>,
    worker: Mutex<Option<JoinHandle<()>>>,
    disposed: AtomicBool,
}

impl<S> StateStore<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Creates a store holding `initial` and spawns its worker on the
    /// ambient tokio runtime.
    pub fn new(initial: S) -> Self {
        let (queue, queue_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(initial.clone());
        let worker = tokio::spawn(run_worker(initial, queue_rx, state_tx));
        debug!("state store worker started");
        Self {
            queue,
            state_rx,
            worker: Mutex::new(Some(worker)),
            disposed: AtomicBool::new(false),
        }
    }
}

impl<S> StateStore<S> {
    /// Stops accepting mutators and aborts the worker. Idempotent.
    ///
    /// Queued mutators are abandoned; since mutators are pure, abandoning
    /// them loses nothing but the updates themselves. `current()` keeps
    /// returning the last applied snapshot, and live subscribers observe
    /// their stream ending.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let worker = match self.worker.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(worker) = worker {
            worker.abort();
        }
        debug!("state store disposed");
    }
}

impl<S> ModelStore<S> for StateStore<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn submit<F>(&self, mutator: F) -> Result<(), StoreError>
    where
        F: FnOnce(S) -> S + Send + 'static,
    {
        if self.disposed.load(Ordering::Acquire) {
            return Err(StoreError::Disposed);
        }
        self.queue
            .send(Box::new(mutator))
            .map_err(|_| StoreError::WorkerStopped)
    }

    fn current(&self) -> S {
        self.state_rx.borrow().clone()
    }

    fn subscribe(&self) -> StateStream<S> {
        StateStream::new(self.state_rx.clone())
    }
}

impl<S> Drop for StateStore<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Applies mutators from `queue` until the queue closes or the task is
/// aborted. Publishing before the next `recv` is what guarantees every
/// applied state becomes visible as its own update.
async fn run_worker<S>(
    initial: S,
    mut queue: mpsc::UnboundedReceiver<BoxedMutator<S>>,
    publish: watch::Sender<S>,
) where
    S: Clone + Send + Sync + 'static,
{
    let mut state = initial;
    let mut applied: u64 = 0;
    while let Some(mutator) = queue.recv().await {
        state = mutator(state);
        applied += 1;
        trace!(applied, "applied mutator");
        if publish.send(state.clone()).is_err() {
            // Every receiver is gone, so the owning store has been dropped.
            break;
        }
    }
    debug!(applied, "state store worker stopped");
}
