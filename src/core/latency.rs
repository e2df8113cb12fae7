//! Simulated response latency
//!
//! Replies are produced by a spawned task that sleeps for a fixed delay,
//! classifies the input and hands the response to a callback. The returned
//! [`ScheduledResponse`] owns the task: cancelling or dropping it aborts the
//! reply if it has not fired yet.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::intent::RuleTable;

#[derive(Debug, Clone)]
pub struct LatencySimulator {
    delay: Duration,
    rules: Arc<RuleTable>,
}

impl LatencySimulator {
    pub fn new(delay: Duration, rules: Arc<RuleTable>) -> Self {
        Self { delay, rules }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Run `callback(classify(input))` once, after the delay.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule_response<F>(&self, input: String, callback: F) -> ScheduledResponse
    where
        F: FnOnce(String) + Send + 'static,
    {
        let rules = Arc::clone(&self.rules);
        let delay = self.delay;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            callback(rules.classify(&input).to_string());
        });

        ScheduledResponse {
            handle: Some(handle),
        }
    }
}

/// Handle to a pending reply
#[derive(Debug)]
pub struct ScheduledResponse {
    handle: Option<JoinHandle<()>>,
}

impl ScheduledResponse {
    /// Abort the reply if it has not fired yet
    pub fn cancel(mut self) {
        self.abort();
    }

    fn abort(&mut self) {
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                tracing::debug!("Cancelling scheduled response");
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
impl ScheduledResponse {
    fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for ScheduledResponse {
    fn drop(&mut self) {
        self.abort();
    }
}
