//! Cancellable delayed work tied to one session.
//!
//! Each task runs on its own tokio task and reports back through the
//! session's event queue. `cancel_all` stops every pending task and bumps the
//! epoch, so a result that was already queued before the cancel is
//! recognised as stale and dropped by the controller.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::event::{EventSink, ScheduledTask, SessionEvent};

#[derive(Debug)]
pub struct Scheduler {
    sink: EventSink,
    token: CancellationToken,
    epoch: u64,
}

impl Scheduler {
    pub fn new(sink: EventSink) -> Self {
        Self {
            sink,
            token: CancellationToken::new(),
            epoch: 0,
        }
    }

    /// Whether an event stamped with `epoch` was scheduled after the last cancel.
    pub fn is_current(&self, epoch: u64) -> bool {
        epoch == self.epoch
    }

    /// Deliver `task` after `delay`.
    pub fn schedule(&self, delay: Duration, task: ScheduledTask) {
        debug!(?task, delay_ms = delay.as_millis() as u64, "scheduling task");
        self.spawn(async move {
            tokio::time::sleep(delay).await;
            task
        });
    }

    /// Run `work` in the background and deliver the task it produces.
    pub fn spawn<F>(&self, work: F)
    where
        F: Future<Output = ScheduledTask> + Send + 'static,
    {
        let token = self.token.clone();
        let sink = self.sink.clone();
        let epoch = self.epoch;

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                task = work => {
                    sink.send(SessionEvent::Scheduled { epoch, task });
                }
            }
        });
    }

    /// Cancel everything pending. Tasks scheduled afterwards are unaffected.
    pub fn cancel_all(&mut self) {
        self.token.cancel();
        self.token = CancellationToken::new();
        self.epoch += 1;
        debug!(epoch = self.epoch, "cancelled pending tasks");
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_delivers_after_delay() {
        let (sink, mut rx) = EventSink::channel();
        let scheduler = Scheduler::new(sink);
        let started = tokio::time::Instant::now();

        scheduler.schedule(Duration::from_secs(3), ScheduledTask::OpponentReply);

        match rx.recv().await {
            Some(SessionEvent::Scheduled { epoch, task }) => {
                assert_eq!(epoch, 0);
                assert_eq!(task, ScheduledTask::OpponentReply);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all_prevents_delivery() {
        let (sink, mut rx) = EventSink::channel();
        let mut scheduler = Scheduler::new(sink);

        scheduler.schedule(Duration::from_secs(1), ScheduledTask::OpponentReply);
        scheduler.cancel_all();
        assert!(!scheduler.is_current(0));

        scheduler.schedule(Duration::from_secs(2), ScheduledTask::Evaluate);

        match rx.recv().await {
            Some(SessionEvent::Scheduled { epoch, task }) => {
                assert_eq!(task, ScheduledTask::Evaluate);
                assert!(scheduler.is_current(epoch));
            }
            other => panic!("unexpected event: {:?}", other),
        }

        let nothing = tokio::time::timeout(Duration::from_secs(10), rx.recv()).await;
        assert!(nothing.is_err());
    }
}
