//! Deduplication Group
//!
//! Collapses concurrent calls for the same key into a single execution.
//!
//! The first caller for a key becomes the leader and starts the producer on
//! a detached task; callers arriving while it runs subscribe to the call's
//! completion slot and receive a clone of its result. Joining, creating and
//! retiring a call all happen under one mutex, so a key never has two
//! leaders and a subscribed follower can never miss the result.
//!
//! Dropping any caller, the leader included, only drops that caller's wait.
//! The producer keeps running and its result still reaches every follower.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

// == Flight Error ==
/// Why a call produced no value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlightError<E> {
    /// The producer returned an error
    #[error("{0}")]
    Failed(E),

    /// The producer panicked or its task was torn down before publishing
    #[error("leader abandoned the call")]
    Abandoned,

    /// This follower stopped waiting before the leader finished
    #[error("timed out waiting for the leader")]
    TimedOut,
}

// == Execution ==
/// Outcome of [`Group::execute`] for one caller.
#[derive(Debug, Clone)]
pub struct Execution<T, E> {
    pub result: Result<T, FlightError<E>>,
    /// `false` for the leader, `true` for every follower
    pub shared: bool,
}

type Slot<T, E> = Option<Result<T, FlightError<E>>>;
type Calls<T, E> = Arc<Mutex<HashMap<String, InFlightCall<T, E>>>>;

/// A call currently running for one key.
struct InFlightCall<T, E> {
    tx: watch::Sender<Slot<T, E>>,
}

impl<T, E> InFlightCall<T, E> {
    fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Followers currently subscribed.
    fn waiters(&self) -> usize {
        self.tx.receiver_count()
    }
}

enum Role<T, E> {
    Leader,
    Follower(watch::Receiver<Slot<T, E>>),
}

// == Group ==
/// Per-key singleflight group.
pub struct Group<T, E> {
    calls: Calls<T, E>,
}

impl<T, E> Group<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    // == Execute ==
    /// Runs `producer` for `key` unless a call is already in flight, in
    /// which case this waits for that call and shares its result.
    ///
    /// The producer's future is spawned onto the runtime, so it completes
    /// and publishes even if this caller is dropped.
    pub async fn execute<F, Fut>(&self, key: &str, producer: F) -> Execution<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.run(key, None, producer).await
    }

    // == Execute With Timeout ==
    /// Like [`execute`](Self::execute), but a follower gives up after `wait`.
    ///
    /// The bound applies only to followers; a leader always waits for its
    /// producer to complete.
    pub async fn execute_with_timeout<F, Fut>(
        &self,
        key: &str,
        wait: Duration,
        producer: F,
    ) -> Execution<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.run(key, Some(wait), producer).await
    }

    async fn run<F, Fut>(&self, key: &str, wait: Option<Duration>, producer: F) -> Execution<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        match self.join_or_lead(key) {
            Role::Follower(rx) => Execution {
                result: wait_for_leader(rx, wait).await,
                shared: true,
            },
            Role::Leader => {
                let guard = LeaderGuard {
                    calls: self.calls.clone(),
                    key: key.to_owned(),
                    finished: false,
                };
                let task = producer();
                let handle = tokio::spawn(async move {
                    let result = task.await.map_err(FlightError::Failed);
                    guard.finish(result.clone());
                    result
                });
                // Dropping the JoinHandle detaches the task; it does not abort it.
                let result = match handle.await {
                    Ok(result) => result,
                    Err(err) => {
                        warn!(key, error = %err, "Leader task failed");
                        Err(FlightError::Abandoned)
                    }
                };
                Execution {
                    result,
                    shared: false,
                }
            }
        }
    }

    /// Check-and-create in one critical section.
    fn join_or_lead(&self, key: &str) -> Role<T, E> {
        let mut calls = self.calls.lock();
        match calls.entry(key.to_owned()) {
            Entry::Occupied(call) => Role::Follower(call.get().tx.subscribe()),
            Entry::Vacant(slot) => {
                slot.insert(InFlightCall::new());
                Role::Leader
            }
        }
    }

    // == Introspection ==
    /// Number of keys with a call in flight.
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }

    /// Followers currently waiting on the call for `key`.
    pub fn waiters(&self, key: &str) -> usize {
        self.calls.lock().get(key).map_or(0, InFlightCall::waiters)
    }
}

impl<T, E> Default for Group<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Retires the call for `key` and wakes its followers, atomically with
/// respect to `join_or_lead`. Returns the number of followers woken.
fn complete<T, E>(calls: &Calls<T, E>, key: &str, result: Result<T, FlightError<E>>) -> usize {
    let mut calls = calls.lock();
    match calls.remove(key) {
        Some(call) => {
            let waiters = call.waiters();
            call.tx.send_replace(Some(result));
            waiters
        }
        None => 0,
    }
}

async fn wait_for_leader<T, E>(
    mut rx: watch::Receiver<Slot<T, E>>,
    wait: Option<Duration>,
) -> Result<T, FlightError<E>>
where
    T: Clone,
    E: Clone,
{
    let published = async move {
        match rx.wait_for(Option::is_some).await {
            Ok(slot) => (*slot).clone().unwrap_or(Err(FlightError::Abandoned)),
            // Sender dropped without publishing.
            Err(_) => Err(FlightError::Abandoned),
        }
    };

    match wait {
        Some(wait) => tokio::time::timeout(wait, published)
            .await
            .unwrap_or(Err(FlightError::TimedOut)),
        None => published.await,
    }
}

// == Leader Guard ==
/// Owned by the producer task. Retires the call even if the producer
/// panics or the task is dropped at runtime shutdown, so followers are
/// never left waiting.
struct LeaderGuard<T, E> {
    calls: Calls<T, E>,
    key: String,
    finished: bool,
}

impl<T, E> LeaderGuard<T, E> {
    fn finish(mut self, result: Result<T, FlightError<E>>) {
        self.finished = true;
        let woken = complete(&self.calls, &self.key, result);
        debug!(key = %self.key, followers = woken, "In-flight call completed");
    }
}

impl<T, E> Drop for LeaderGuard<T, E> {
    fn drop(&mut self) {
        if !self.finished {
            let woken = complete(&self.calls, &self.key, Err(FlightError::Abandoned));
            warn!(key = %self.key, followers = woken, "Leader abandoned in-flight call");
        }
    }
}
