//! Per-user serialization of units of work
//!
//! This module provides the `UserGate`, which runs units of work for the same
//! user one at a time, in the order they were submitted, while units of work
//! for different users run independently.
//!
//! # Design
//!
//! Each user with pending work owns one queue worker: a tokio task draining an
//! unbounded channel of jobs. Queues are created lazily on the first
//! submission and torn down by the worker itself as soon as the queue is empty.
//!
//! ```text
//! UserGate
//!     └── DashMap<UserId, UnboundedSender<Job>>
//!             └── worker task per active user (drains jobs FIFO, then retires)
//! ```
//!
//! # Ordering
//!
//! A job is enqueued when `run` is called, not when the returned future is
//! first polled. Two `run` calls for the same user therefore execute in call
//! order even if their futures are awaited in a different order.
//!
//! # Failure and cancellation
//!
//! A unit of work that fails hands its error back to its caller; a unit of
//! work that panics is reported as `WorkAborted`. In both cases the worker
//! moves on to the next job. Dropping the future returned by `run` does not
//! cancel the unit of work.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::{mpsc, oneshot};

use crate::types::{PointError, UserId};

/// Type-erased unit of work
type Job = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

type Queues = DashMap<UserId, mpsc::UnboundedSender<Job>>;

/// Serializes units of work per user
///
/// Cloning a `UserGate` yields a handle to the same queues.
#[derive(Debug, Clone, Default)]
pub struct UserGate {
    /// Live queues by user; an entry exists only while that user has work
    queues: Arc<Queues>,
}

impl UserGate {
    /// Create a gate with no active queues
    pub fn new() -> Self {
        Self {
            queues: Arc::new(DashMap::new()),
        }
    }

    /// Number of users that currently have queued or running work
    pub fn active_users(&self) -> usize {
        self.queues.len()
    }

    /// Whether no user has queued or running work
    pub fn is_idle(&self) -> bool {
        self.queues.is_empty()
    }

    /// Queue `work` behind all earlier work for `user_id`
    ///
    /// The job is enqueued before this method returns. The returned future
    /// resolves with the work's own result once it has run to completion.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime, since the first submission
    /// for an idle user spawns its queue worker.
    pub fn run<T, F, Fut>(
        &self,
        user_id: UserId,
        work: F,
    ) -> impl Future<Output = Result<T, PointError>> + Send + 'static
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, PointError>> + Send + 'static,
        T: Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel();

        let job: Job = Box::new(move || {
            async move {
                let outcome = AssertUnwindSafe(async move { work().await })
                    .catch_unwind()
                    .await;
                // The caller may have stopped waiting; the work still counted.
                let _ = done_tx.send(outcome);
            }
            .boxed()
        });

        self.enqueue(user_id, job);

        async move {
            match done_rx.await {
                Ok(Ok(result)) => result,
                Ok(Err(_panic)) => Err(PointError::work_aborted(
                    user_id,
                    "unit of work panicked",
                )),
                Err(_) => Err(PointError::work_aborted(
                    user_id,
                    "queue worker stopped before running the unit of work",
                )),
            }
        }
    }

    fn enqueue(&self, user_id: UserId, mut job: Job) {
        loop {
            // The shard lock is held across the send, so a worker can never
            // retire between our lookup and our send.
            let sender = self
                .queues
                .entry(user_id)
                .or_insert_with(|| spawn_worker(Arc::clone(&self.queues), user_id));

            match sender.send(job) {
                Ok(()) => return,
                Err(mpsc::error::SendError(returned)) => {
                    drop(sender);
                    tracing::debug!(user_id, "replacing closed serialization queue");
                    self.queues.remove_if(&user_id, |_, tx| tx.is_closed());
                    job = returned;
                }
            }
        }
    }
}

fn spawn_worker(queues: Arc<Queues>, user_id: UserId) -> mpsc::UnboundedSender<Job> {
    let (tx, rx) = mpsc::unbounded_channel();
    tracing::trace!(user_id, "spawning serialization worker");
    tokio::spawn(drain(queues, user_id, rx));
    tx
}

async fn drain(queues: Arc<Queues>, user_id: UserId, mut rx: mpsc::UnboundedReceiver<Job>) {
    loop {
        while let Ok(job) = rx.try_recv() {
            job().await;
        }

        // Submitters send while holding the shard lock, so an empty channel
        // observed under that lock really means nothing is pending.
        if queues.remove_if(&user_id, |_, _| rx.is_empty()).is_some() {
            tracing::trace!(user_id, "serialization worker retired");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    async fn wait_until_idle(gate: &UserGate) {
        for _ in 0..1000 {
            if gate.is_idle() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("gate still has {} active users", gate.active_users());
    }

    #[tokio::test]
    async fn test_run_returns_work_result() {
        let gate = UserGate::new();

        let result = gate.run(1, || async { Ok::<_, PointError>(41 + 1) }).await;

        assert_eq!(result, Ok(42));
    }

    #[tokio::test]
    async fn test_run_propagates_work_error() {
        let gate = UserGate::new();

        let result: Result<(), PointError> = gate
            .run(1, || async { Err(PointError::store("history unavailable")) })
            .await;

        assert_eq!(result, Err(PointError::store("history unavailable")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_same_user_runs_in_submission_order() {
        let gate = UserGate::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        // Earlier jobs sleep longer, so any overlap would reorder the log.
        let mut pending = Vec::new();
        for i in 0..10u64 {
            let log = Arc::clone(&log);
            pending.push(gate.run(7, move || async move {
                log.lock().unwrap().push(format!("start {i}"));
                tokio::time::sleep(Duration::from_millis(10 - i)).await;
                log.lock().unwrap().push(format!("end {i}"));
                Ok::<_, PointError>(i)
            }));
        }

        // Await in reverse to show ordering follows submission, not polling.
        pending.reverse();
        let results = futures::future::join_all(pending).await;

        let expected: Vec<String> = (0..10)
            .flat_map(|i| [format!("start {i}"), format!("end {i}")])
            .collect();
        assert_eq!(*log.lock().unwrap(), expected);
        assert_eq!(results.len(), 10);
    }

    #[tokio::test]
    async fn test_failure_does_not_break_queue() {
        let gate = UserGate::new();

        let first = gate.run(1, || async { Err::<u32, _>(PointError::store("boom")) });
        let second = gate.run(1, || async { Ok::<_, PointError>(2) });

        assert_eq!(first.await, Err(PointError::store("boom")));
        assert_eq!(second.await, Ok(2));
    }

    #[tokio::test]
    async fn test_panic_is_reported_and_queue_recovers() {
        let gate = UserGate::new();

        let first = gate.run(1, || async {
            if true {
                panic!("unit of work exploded");
            }
            Ok::<u32, PointError>(0)
        });
        let second = gate.run(1, || async { Ok::<_, PointError>(2) });

        assert!(matches!(
            first.await,
            Err(PointError::WorkAborted { user_id: 1, .. })
        ));
        assert_eq!(second.await, Ok(2));
    }

    #[tokio::test]
    async fn test_dropped_caller_does_not_cancel_work() {
        let gate = UserGate::new();
        let ran = Arc::new(Mutex::new(false));

        let flag = Arc::clone(&ran);
        drop(gate.run(1, move || async move {
            *flag.lock().unwrap() = true;
            Ok::<_, PointError>(())
        }));
        let after = gate.run(1, || async { Ok::<_, PointError>(()) });

        after.await.unwrap();
        assert!(*ran.lock().unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_other_users_are_not_blocked() {
        let gate = UserGate::new();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        // User 1 stays busy until released.
        let blocked = gate.run(1, move || async move {
            release_rx.await.ok();
            Ok::<_, PointError>("user 1")
        });

        let other = tokio::time::timeout(
            Duration::from_secs(5),
            gate.run(2, || async { Ok::<_, PointError>("user 2") }),
        )
        .await;
        assert_eq!(other.expect("user 2 was blocked by user 1"), Ok("user 2"));

        release_tx.send(()).unwrap();
        assert_eq!(blocked.await, Ok("user 1"));
    }

    #[tokio::test]
    async fn test_queues_are_released_when_drained() {
        let gate = UserGate::new();

        for user in 0..20u64 {
            gate.run(user, || async { Ok::<_, PointError>(()) })
                .await
                .unwrap();
        }
        wait_until_idle(&gate).await;
        assert_eq!(gate.active_users(), 0);

        // A retired user gets a fresh queue on the next submission.
        assert_eq!(gate.run(3, || async { Ok::<_, PointError>(3) }).await, Ok(3));
        wait_until_idle(&gate).await;
    }

    #[tokio::test]
    async fn test_clones_share_queues() {
        let gate = UserGate::new();
        let clone = gate.clone();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let blocked = gate.run(1, move || async move {
            release_rx.await.ok();
            Ok::<_, PointError>(())
        });
        tokio::task::yield_now().await;

        assert_eq!(clone.active_users(), 1);
        release_tx.send(()).unwrap();
        blocked.await.unwrap();
        wait_until_idle(&clone).await;
    }
}
