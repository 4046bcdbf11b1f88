//! Result channel and poller
//!
//! Workers push outcomes from any thread; the poller drains at most one per
//! tick on the interactive runtime and never waits for a value.

use crate::models::AnalysisOutcome;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Create the unbounded FIFO between workers and the poller
pub fn result_channel() -> (OutcomeSender, OutcomeReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (OutcomeSender { tx }, OutcomeReceiver { rx })
}

/// Producer side. Cloneable, one clone per live worker.
#[derive(Clone)]
pub struct OutcomeSender {
    tx: UnboundedSender<AnalysisOutcome>,
}

impl OutcomeSender {
    pub fn push(&self, outcome: AnalysisOutcome) {
        let task_id = outcome.task_id();
        if self.tx.send(outcome).is_err() {
            warn!(%task_id, "Result poller is gone, outcome dropped");
        } else {
            debug!(%task_id, "Outcome queued");
        }
    }
}

/// Consumer side. Exactly one exists.
pub struct OutcomeReceiver {
    rx: UnboundedReceiver<AnalysisOutcome>,
}

impl OutcomeReceiver {
    /// Non-blocking pop
    pub fn try_next(&mut self) -> Option<AnalysisOutcome> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}

/// Where drained outcomes are presented
#[async_trait]
pub trait OutcomeSink: Send + Sync {
    async fn deliver(&self, outcome: AnalysisOutcome);
}

pub struct ResultPoller {
    receiver: OutcomeReceiver,
    interval: Duration,
}

impl ResultPoller {
    pub fn new(receiver: OutcomeReceiver) -> Self {
        Self::with_interval(receiver, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_interval(receiver: OutcomeReceiver, interval: Duration) -> Self {
        Self { receiver, interval }
    }

    /// Drain at most one outcome into `sink`. Returns whether one was delivered.
    pub async fn poll_once(&mut self, sink: &dyn OutcomeSink) -> bool {
        match self.receiver.try_next() {
            Some(outcome) => {
                debug!(task_id = %outcome.task_id(), "Delivering outcome");
                sink.deliver(outcome).await;
                true
            }
            None => false,
        }
    }

    /// Poll forever at the configured cadence
    pub async fn run(mut self, sink: &dyn OutcomeSink) {
        let mut ticker = self.ticker();
        loop {
            ticker.tick().await;
            self.poll_once(sink).await;
        }
    }

    /// Poll at the configured cadence until one outcome has been delivered
    pub async fn next_delivery(&mut self, sink: &dyn OutcomeSink) {
        let mut ticker = self.ticker();
        loop {
            ticker.tick().await;
            if self.poll_once(sink).await {
                return;
            }
        }
    }

    fn ticker(&self) -> Interval {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }
}
