//! Bounded fire-and-forget task spawner.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use super::log_core_error;
use crate::error::CoreResult;

/// Spawns background jobs, at most `max_concurrent` running at once.
///
/// Jobs are at-most-once: a failure is logged and dropped. The returned handle
/// only exists so tests and shutdown paths can wait for completion.
#[derive(Clone)]
pub struct DetachedTasks {
    permits: Arc<Semaphore>,
}

impl DetachedTasks {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub fn spawn<F>(&self, label: String, job: F) -> JoinHandle<()>
    where
        F: Future<Output = CoreResult<()>> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        tokio::spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                log::warn!("[detached] {label}: task pool closed, job dropped");
                return;
            };
            match job.await {
                Ok(()) => log::debug!("[detached] {label}: done"),
                Err(e) => log_core_error(&format!("[detached] {label}"), &e),
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::error::CoreError;

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let tasks = DetachedTasks::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..6)
            .map(|i| {
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                tasks.spawn(format!("job-{i}"), async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        let tasks = DetachedTasks::new(1);
        let handle = tasks.spawn("failing".to_string(), async {
            Err(CoreError::NetworkError("unreachable".into()))
        });
        assert!(handle.await.is_ok());
    }
}
