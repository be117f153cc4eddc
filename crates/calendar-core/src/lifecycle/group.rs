//! Run a fixed set of tasks and tear all of them down when the first returns.
//!
//! Each member of a [`Group`] is a pair: a future that does the work and an
//! interrupt callback that makes that future return. [`Group::run`] spawns
//! every future, waits for the first one to finish, invokes every interrupt
//! exactly once, then waits for all remaining tasks before returning the
//! first task's result.
//!
//! Interrupts are `FnOnce` and are only ever called from `run`, after the
//! first completion, so a group performs a single teardown no matter which
//! member triggers it. Callbacks should be idempotent primitives (cancelling a
//! `CancellationToken`, closing a channel) because they may race with a task
//! that is already finishing on its own.

use futures::future::BoxFuture;
use tokio::task::{JoinError, JoinSet};

type Interrupt = Box<dyn FnOnce() + Send>;

struct Actor<E> {
    execute: BoxFuture<'static, Result<(), E>>,
    interrupt: Interrupt,
}

/// A set of (run, interrupt) pairs with shared fate.
pub struct Group<E> {
    actors: Vec<Actor<E>>,
}

impl<E> Default for Group<E> {
    fn default() -> Self {
        Self { actors: Vec::new() }
    }
}

impl<E> Group<E>
where
    E: From<JoinError> + core::fmt::Display + Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a task and the callback that interrupts it.
    ///
    /// Nothing runs until [`Group::run`] is awaited.
    pub fn add<F, I>(&mut self, execute: F, interrupt: I)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        I: FnOnce() + Send + 'static,
    {
        self.actors.push(Actor {
            execute: Box::pin(execute),
            interrupt: Box::new(interrupt),
        });
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Runs every task concurrently until all of them have returned.
    ///
    /// Returns the result of whichever task finished first. A task that
    /// panics counts as finishing with `E::from(JoinError)`. An empty group
    /// returns `Ok(())` immediately.
    pub async fn run(self) -> Result<(), E> {
        let mut tasks = JoinSet::new();
        let mut interrupts = Vec::with_capacity(self.actors.len());
        for Actor { execute, interrupt } in self.actors {
            tasks.spawn(execute);
            interrupts.push(interrupt);
        }

        let Some(first) = tasks.join_next().await else {
            return Ok(());
        };
        let first = first.unwrap_or_else(|err| Err(E::from(err)));

        tracing::debug!(remaining = tasks.len(), "group member returned, interrupting all");
        for interrupt in interrupts {
            interrupt();
        }

        while let Some(rest) = tasks.join_next().await {
            if let Err(err) = rest.unwrap_or_else(|err| Err(E::from(err))) {
                tracing::debug!(error = %err, "group member stopped");
            }
        }

        first
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;
    use std::sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    };
    use tokio_util::sync::CancellationToken;

    #[derive(Debug, thiserror::Error)]
    enum TestError {
        #[error("boom")]
        Boom,
        #[error("join: {0}")]
        Join(#[from] JoinError),
    }

    /// A member that blocks until its token is cancelled.
    fn blocking_member(
        group: &mut Group<TestError>,
        interrupted: Arc<AtomicUsize>,
        stopped: Arc<AtomicBool>,
    ) {
        let token = CancellationToken::new();
        let cancel = token.clone();
        group.add(
            async move {
                token.cancelled().await;
                // Simulate teardown work so `run` has to wait for it.
                tokio::time::sleep(Duration::from_millis(20)).await;
                stopped.store(true, Ordering::SeqCst);
                Ok(())
            },
            move || {
                interrupted.fetch_add(1, Ordering::SeqCst);
                cancel.cancel();
            },
        );
    }

    #[tokio::test]
    async fn empty_group_returns_immediately() {
        let group = Group::<TestError>::new();
        assert!(group.is_empty());
        assert!(group.run().await.is_ok());
    }

    #[tokio::test]
    async fn first_result_wins_and_everyone_stops() {
        let interrupted = Arc::new(AtomicUsize::new(0));
        let stopped = Arc::new(AtomicBool::new(false));
        let failing_interrupted = Arc::new(AtomicUsize::new(0));

        let mut group = Group::new();
        blocking_member(&mut group, interrupted.clone(), stopped.clone());
        {
            let failing_interrupted = failing_interrupted.clone();
            group.add(async { Err(TestError::Boom) }, move || {
                failing_interrupted.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(group.len(), 2);

        let result = tokio::time::timeout(Duration::from_secs(5), group.run())
            .await
            .expect("group should not hang");

        assert!(matches!(result, Err(TestError::Boom)));
        assert!(stopped.load(Ordering::SeqCst), "run returned before the blocked member");
        assert_eq!(interrupted.load(Ordering::SeqCst), 1);
        assert_eq!(failing_interrupted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn clean_completion_still_interrupts_peers_once() {
        let counters: Vec<_> = (0..3).map(|_| Arc::new(AtomicUsize::new(0))).collect();
        let stopped: Vec<_> = (0..3).map(|_| Arc::new(AtomicBool::new(false))).collect();

        let mut group = Group::new();
        for (counter, stop) in counters.iter().zip(&stopped) {
            blocking_member(&mut group, counter.clone(), stop.clone());
        }
        group.add(async { Ok(()) }, || {});

        let result = tokio::time::timeout(Duration::from_secs(5), group.run())
            .await
            .expect("group should not hang");

        assert!(result.is_ok());
        for (counter, stop) in counters.iter().zip(&stopped) {
            assert_eq!(counter.load(Ordering::SeqCst), 1);
            assert!(stop.load(Ordering::SeqCst));
        }
    }

    #[tokio::test]
    async fn interrupting_an_already_finished_member_is_harmless() {
        let token = CancellationToken::new();
        let mut group = Group::<TestError>::new();
        {
            let cancel = token.clone();
            group.add(async { Ok(()) }, move || cancel.cancel());
        }
        {
            let cancel = token.clone();
            let watched = token.clone();
            group.add(
                async move {
                    watched.cancelled().await;
                    Ok(())
                },
                move || cancel.cancel(),
            );
        }

        assert!(group.run().await.is_ok());
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn panicking_member_is_reported_as_join_error() {
        let interrupted = Arc::new(AtomicUsize::new(0));
        let stopped = Arc::new(AtomicBool::new(false));

        let mut group = Group::new();
        blocking_member(&mut group, interrupted.clone(), stopped.clone());
        group.add(
            async {
                if true {
                    panic!("member crashed");
                }
                Ok(())
            },
            || {},
        );

        let result = tokio::time::timeout(Duration::from_secs(5), group.run())
            .await
            .expect("group should not hang");

        assert!(matches!(result, Err(TestError::Join(_))));
        assert_eq!(interrupted.load(Ordering::SeqCst), 1);
        assert!(stopped.load(Ordering::SeqCst));
    }
}
