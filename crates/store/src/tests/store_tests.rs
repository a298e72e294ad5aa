use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::{sleep, timeout};

use crate::{ModelStore, StateStore, StateStream, StoreError};

const WAIT: Duration = Duration::from_secs(5);

/// Reads `stream` until a snapshot satisfies `pred`, panicking if the stream
/// ends first. Callers bound this with [`timeout`].
async fn wait_for<S, F>(stream: &mut StateStream<S>, mut pred: F) -> S
where
    S: Clone + Send + Sync + 'static,
    F: FnMut(&S) -> bool,
{
    loop {
        let state = stream.recv().await.expect("stream ended before condition");
        if pred(&state) {
            return state;
        }
    }
}

#[tokio::test]
async fn applies_single_caller_submissions_as_left_fold() {
    let store = StateStore::new(String::new());
    let mut stream = store.subscribe();
    for label in ["a", "b", "c", "d"] {
        store
            .submit(move |state: String| state + label)
            .expect("submit");
    }

    let finished = timeout(WAIT, wait_for(&mut stream, |state| state.len() == 4))
        .await
        .expect("final state");
    assert_eq!(finished, "abcd");
    assert_eq!(store.current(), "abcd");
}

#[tokio::test]
async fn concurrent_increments_are_all_applied() {
    let store = Arc::new(StateStore::new(0u32));
    let mut stream = store.subscribe();

    let callers = (0..3).map(|_| {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            store.submit(|count: u32| count + 1).expect("submit");
        })
    });
    for joined in join_all(callers).await {
        joined.expect("caller task");
    }

    timeout(WAIT, wait_for(&mut stream, |count| *count == 3))
        .await
        .expect("final count");
    assert_eq!(store.current(), 3);
}

#[tokio::test]
async fn no_two_mutators_coalesce_into_one_step() {
    // Every applied mutator grows the vector by exactly one element, so a
    // final length of N proves N individual applications.
    let store = Arc::new(StateStore::new(Vec::<u32>::new()));
    let mut stream = store.subscribe();

    let callers = (0..8u32).map(|caller| {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            for i in 0..10u32 {
                store
                    .submit(move |mut log: Vec<u32>| {
                        log.push(caller * 100 + i);
                        log
                    })
                    .expect("submit");
            }
        })
    });
    for joined in join_all(callers).await {
        joined.expect("caller task");
    }

    let log = timeout(WAIT, wait_for(&mut stream, |log| log.len() == 80))
        .await
        .expect("final log");
    assert_eq!(log.len(), 80);
}

#[tokio::test]
async fn preserves_each_callers_submission_order() {
    let store = Arc::new(StateStore::new(Vec::<(u32, u32)>::new()));
    let mut stream = store.subscribe();

    let callers = (0..4u32).map(|caller| {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            for seq in 0..25u32 {
                store
                    .submit(move |mut log: Vec<(u32, u32)>| {
                        log.push((caller, seq));
                        log
                    })
                    .expect("submit");
            }
        })
    });
    for joined in join_all(callers).await {
        joined.expect("caller task");
    }

    let log = timeout(WAIT, wait_for(&mut stream, |log| log.len() == 100))
        .await
        .expect("final log");
    for caller in 0..4u32 {
        let seqs: Vec<u32> = log
            .iter()
            .filter(|(who, _)| *who == caller)
            .map(|(_, seq)| *seq)
            .collect();
        assert_eq!(seqs, (0..25u32).collect::<Vec<_>>());
    }
}

#[tokio::test]
async fn current_returns_initial_before_any_mutator() {
    let store = StateStore::new(41u32);
    assert_eq!(store.current(), 41);
}

#[tokio::test]
async fn late_subscriber_starts_from_latest_state() {
    let store = StateStore::new(0u32);
    let mut early = store.subscribe();
    for _ in 0..5 {
        store.submit(|count: u32| count + 1).expect("submit");
    }
    timeout(WAIT, wait_for(&mut early, |count| *count == 5))
        .await
        .expect("settle");

    let mut late = store.subscribe();
    let first = timeout(WAIT, late.recv()).await.expect("first value");
    assert_eq!(first, Some(5));
}

#[tokio::test]
async fn rejects_submissions_after_dispose() {
    let store = StateStore::new(10u32);
    store.dispose();

    let rejected = store.submit(|count: u32| count + 1);
    assert_eq!(rejected, Err(StoreError::Disposed));
    assert_eq!(store.current(), 10);
}

#[tokio::test]
async fn dispose_is_idempotent() {
    let store = StateStore::new(0u32);
    store.dispose();
    store.dispose();
    assert_eq!(store.submit(|count: u32| count), Err(StoreError::Disposed));
}

#[tokio::test]
async fn panicking_mutator_stops_the_worker() {
    let store = StateStore::new(1u32);
    let mut stream = store.subscribe();
    store
        .submit(|_: u32| panic!("mutator contract violated"))
        .expect("submit");

    // The worker dies asynchronously; keep probing until submission reports
    // it gone.
    let probe = async {
        loop {
            match store.submit(|count: u32| count) {
                Err(StoreError::WorkerStopped) => break,
                Err(other) => panic!("unexpected error: {other}"),
                Ok(()) => sleep(Duration::from_millis(10)).await,
            }
        }
    };
    timeout(WAIT, probe).await.expect("worker stop");

    // The stream completes once the worker is gone.
    let drained = async {
        while stream.recv().await.is_some() {}
    };
    timeout(WAIT, drained).await.expect("stream completion");

    // The last applied snapshot stays readable.
    assert_eq!(store.current(), 1);
}
