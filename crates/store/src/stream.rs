//! Replay-latest read side of a [`StateStore`](crate::StateStore).

use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::{Stream, StreamExt};

/// A subscription to a store's published snapshots.
///
/// The first item is the snapshot current when the stream is first polled;
/// after that, every publication arrives in order. Delivery conflates: a
/// subscriber that falls behind skips straight to the newest snapshot rather
/// than queueing stale ones, and never sees a snapshot older than one it has
/// already received. Subscribers are independent; a slow one cannot delay a
/// fast one.
///
/// The stream ends (`None`) once the store's worker has stopped, whether by
/// `dispose`, by dropping the store, or by a panicking mutator.
pub struct StateStream<S> {
    inner: WatchStream<S>,
}

impl<S> StateStream<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(state_rx: watch::Receiver<S>) -> Self {
        Self {
            inner: WatchStream::new(state_rx),
        }
    }

    /// The next snapshot, or `None` once the store's worker has stopped.
    pub async fn recv(&mut self) -> Option<S> {
        self.inner.next().await
    }
}

impl<S> Stream for StateStream<S>
where
    S: Clone + Send + Sync + 'static,
{
    type Item = S;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<S>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
