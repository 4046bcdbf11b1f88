//! Task dispatcher
//!
//! Runs each analysis on the worker runtime, away from the interactive
//! runtime, and guarantees exactly one outcome per accepted submission.
//! Only one task may be in flight at a time.

use super::channel::OutcomeSender;
use super::{run_analysis, Connector};
use crate::config::Settings;
use crate::error::HabitError;
use crate::models::AnalysisOutcome;
use crate::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::{error, info, warn};
use uuid::Uuid;

const WORKER_THREADS: usize = 2;

/// Multi-threaded runtime that hosts analysis tasks
pub struct WorkerPool {
    runtime: Runtime,
}

impl WorkerPool {
    pub fn new() -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(WORKER_THREADS)
            .thread_name("habit-analysis")
            .enable_all()
            .build()?;
        Ok(Self { runtime })
    }

    pub fn handle(&self) -> Handle {
        self.runtime.handle().clone()
    }

    /// Stop without blocking; safe to call from async code
    pub fn shutdown(self) {
        self.runtime.shutdown_background();
    }
}

pub struct TaskDispatcher {
    connector: Arc<dyn Connector>,
    sender: OutcomeSender,
    workers: Handle,
    in_flight: Arc<AtomicBool>,
}

impl TaskDispatcher {
    pub fn new(connector: Arc<dyn Connector>, sender: OutcomeSender, workers: Handle) -> Self {
        Self {
            connector,
            sender,
            workers,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Start one analysis. The outcome arrives later on the result channel.
    ///
    /// Rejected with `AnalysisInFlight` while a previous task has not yet
    /// pushed its outcome.
    pub fn submit(&self, prompt: String, settings: Settings) -> Result<Uuid> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Analysis submission rejected, another task is in flight");
            return Err(HabitError::AnalysisInFlight);
        }

        let task_id = Uuid::new_v4();
        let guard = InFlightGuard(self.in_flight.clone());
        let connector = self.connector.clone();
        let sender = self.sender.clone();
        let workers = self.workers.clone();

        info!(%task_id, "Dispatching analysis task");

        self.workers.spawn(async move {
            // Dropped last, after the outcome is queued
            let _guard = guard;

            let attempt = workers.spawn(async move {
                run_analysis(task_id, connector.as_ref(), &settings, &prompt).await
            });

            let outcome = match attempt.await {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    error!(%task_id, error = %join_error, "Analysis task aborted");
                    AnalysisOutcome::Failure {
                        task_id,
                        message: format!("Analysis task aborted: {}", join_error),
                    }
                }
            };

            sender.push(outcome);
        });

        Ok(task_id)
    }
}

/// Clears the in-flight flag when the worker finishes, even by panic
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
