use crate::router::EventRouter;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Background task that runs [`EventRouter::sweep`] on a fixed interval.
///
/// The first sweep happens one full interval after spawning. Dropping the
/// handle without calling [`SweepHandle::stop`] also stops the loop.
pub struct SweepHandle {
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl SweepHandle {
    /// Start sweeping `router` every `interval`.
    pub fn spawn(router: Arc<EventRouter>, interval: Duration) -> Self {
        let (stop_tx, mut stop_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
            // interval() fires immediately; skip that tick.
            ticker.tick().await;
            info!(interval_ms = interval.as_millis() as u64, "Sweeper started");

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        let report = router.sweep().await;
                        debug!(
                            sessions = report.sessions,
                            connections = report.connections,
                            queues = report.queues,
                            "Sweep tick"
                        );
                    }
                }
            }
            info!("Sweeper stopped");
        });

        Self { stop_tx, task }
    }

    /// Signal the loop to exit and wait for it.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(());
        if let Err(e) = self.task.await {
            warn!(error = %e, "Sweeper task ended abnormally");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::DeliveryConfig;
    use crate::test_support::RecordingSink;
    use agentrelay_core::AgentEvent;

    fn short_lived() -> DeliveryConfig {
        DeliveryConfig {
            session_max_age_ms: 20,
            connection_max_age_ms: 20,
            sweep_interval_ms: 10,
            ..DeliveryConfig::default()
        }
    }

    #[tokio::test]
    async fn sweeps_on_interval() {
        let router = Arc::new(EventRouter::new(short_lived()));
        router.dispatch("t1", AgentEvent::text("m", "a")).await;
        let sink = RecordingSink::new();
        router.attach("t2", sink.clone()).await;

        let handle = SweepHandle::spawn(router.clone(), router.config().sweep_interval());
        tokio::time::sleep(Duration::from_millis(150)).await;
        handle.stop().await;

        assert!(router.sessions().is_empty());
        assert_eq!(router.pending().thread_count(), 0);
        assert_eq!(router.connections().size().await, 0);
        assert!(sink.is_closed());
    }

    #[tokio::test]
    async fn stop_ends_task_before_first_tick() {
        let router = Arc::new(EventRouter::new(DeliveryConfig::default()));
        router.dispatch("t1", AgentEvent::text("m", "a")).await;

        let handle = SweepHandle::spawn(router.clone(), Duration::from_secs(3600));
        handle.stop().await;

        assert_eq!(router.sessions().len(), 1);
        assert_eq!(router.pending().size("t1"), 1);
    }

    #[tokio::test]
    async fn dropping_handle_stops_loop() {
        let router = Arc::new(EventRouter::new(short_lived()));
        let handle = SweepHandle::spawn(router.clone(), Duration::from_millis(10));
        let task_router = Arc::downgrade(&router);
        drop(handle);
        drop(router);

        // The task owned the last strong reference; it goes away once the loop exits.
        let mut gone = false;
        for _ in 0..50 {
            if task_router.upgrade().is_none() {
                gone = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(gone);
    }
}
