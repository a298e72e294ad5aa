use thiserror::Error;

/// Why a submission was rejected. Applying a mutator itself cannot fail;
/// domain errors belong inside the state value, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store was disposed; it no longer accepts mutators.
    #[error("store disposed; mutator rejected")]
    Disposed,
    /// The worker task is gone without a dispose, which means a mutator
    /// panicked or the runtime shut down underneath the store.
    #[error("store worker stopped; mutator rejected")]
    WorkerStopped,
}
