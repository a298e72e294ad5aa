//! Serialized state management for feature controllers.
//!
//! Each controller owns a [`StateStore`]: an actor-style container that holds
//! one immutable state snapshot and applies caller-supplied mutators strictly
//! one at a time, in arrival order, on a dedicated worker task. The read side
//! is a [`StateStream`] that replays the latest snapshot to new subscribers
//! and conflates updates for slow ones. One-shot effects (toasts, one-time
//! navigation) ride inside snapshots as [`EventBox`] fields and are drained
//! exactly once by the rendering layer.
//!
//! Controllers submit from arbitrary tasks or threads; the store is the only
//! place their concurrent updates are serialized:
//!
//! ```text
//! submit(mutator) ──→ FIFO queue ──→ worker: apply, publish ──→ subscribers
//! ```

mod error;
mod event;
mod store;
mod stream;

pub use error::StoreError;
pub use event::EventBox;
pub use store::{ModelStore, StateStore};
pub use stream::StateStream;

#[cfg(test)]
mod tests;
