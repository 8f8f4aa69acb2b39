//! Request scopes tie background loads to the view that started them.
//!
//! When the view goes away (tab switch, logout, session expiry) the scope is
//! cancelled: in-flight tasks are aborted and any result that still slips
//! through carries an old generation, so the receiver can drop it instead of
//! applying it to whatever view is now on screen.

use std::future::Future;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// A result tagged with the scope generation it was started under.
#[derive(Debug)]
pub struct Scoped<T> {
    pub generation: u64,
    pub value: T,
}

#[derive(Debug, Default)]
pub struct RequestScope {
    generation: u64,
    tasks: Vec<JoinHandle<()>>,
}

impl RequestScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Number of tasks started in this generation that have not finished.
    pub fn in_flight(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_finished()).count()
    }

    /// Run `fut` on the runtime and deliver its output on `tx`, tagged with
    /// the current generation. Must be called from within a tokio runtime.
    pub fn spawn<F, T>(&mut self, tx: mpsc::Sender<Scoped<T>>, fut: F)
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.tasks.retain(|t| !t.is_finished());

        let generation = self.generation;
        self.tasks.push(tokio::spawn(async move {
            let value = fut.await;
            if tx.send(Scoped { generation, value }).await.is_err() {
                debug!(generation, "Scoped result dropped - receiver closed");
            }
        }));
    }

    /// Abort everything in flight and start a new generation.
    pub fn cancel(&mut self) {
        let aborted = self.tasks.len();
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.generation += 1;
        debug!(generation = self.generation, aborted, "Request scope cancelled");
    }
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_result_carries_generation() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut scope = RequestScope::new();

        scope.spawn(tx, async { 42 });

        let result = rx.recv().await.expect("result delivered");
        assert_eq!(result.value, 42);
        assert!(scope.is_current(result.generation));
    }

    #[tokio::test]
    async fn test_cancel_aborts_in_flight() {
        let (tx, mut rx) = mpsc::channel::<Scoped<u32>>(4);
        let mut scope = RequestScope::new();

        scope.spawn(tx.clone(), async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            1
        });
        assert_eq!(scope.in_flight(), 1);

        scope.cancel();
        assert_eq!(scope.in_flight(), 0);
        drop(tx);

        // Every sender is gone once the aborted task is dropped
        let received = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("channel closes after abort");
        assert!(received.is_none());
    }

    #[tokio::test]
    async fn test_late_result_is_stale() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut scope = RequestScope::new();

        // Finished before cancel, but not yet received
        scope.spawn(tx, async { "late" });
        let result = rx.recv().await.expect("result delivered");
        scope.cancel();

        assert!(!scope.is_current(result.generation));
        assert_eq!(scope.generation(), 1);
    }
}
