// src/feed/countdown.rs

use std::sync::Arc;

use tokio::{
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};

use super::{
    controller::{FeedController, TickOutcome},
    source::QuestionSource,
};

/// Background one-second ticker for a feed. The task stops when the handle
/// is dropped.
pub struct Countdown {
    handle: JoinHandle<()>,
}

impl Countdown {
    pub fn start<S: QuestionSource + 'static>(controller: Arc<FeedController<S>>) -> Self {
        let period = controller.config().tick_period;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;

            loop {
                interval.tick().await;
                if let TickOutcome::TimedOut { index, .. } = controller.tick() {
                    tracing::debug!(index, "Countdown expired");
                }
            }
        });

        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
