//! Presentation state for analysis outcomes
//!
//! Holds what the interactive surface shows: the waiting indicator, the last
//! analysis text or error, and how long the access token stays valid.

use super::channel::OutcomeSink;
use crate::models::AnalysisOutcome;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::info;
use uuid::Uuid;

pub const TOKEN_STATUS_UNKNOWN: &str = "Token not obtained";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub waiting: bool,
    pub pending_task: Option<Uuid>,
    pub last_analysis: Option<String>,
    pub last_error: Option<String>,
    pub token_status: String,
    pub delivered: u64,
    /// Task of the most recently delivered outcome
    pub last_task: Option<Uuid>,
}

impl Default for BoardSnapshot {
    fn default() -> Self {
        Self {
            waiting: false,
            pending_task: None,
            last_analysis: None,
            last_error: None,
            token_status: TOKEN_STATUS_UNKNOWN.to_string(),
            delivered: 0,
            last_task: None,
        }
    }
}

#[derive(Clone)]
pub struct AnalysisBoard {
    state: Arc<RwLock<BoardSnapshot>>,
    deliveries: Arc<watch::Sender<u64>>,
}

impl Default for AnalysisBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisBoard {
    pub fn new() -> Self {
        let (deliveries, _) = watch::channel(0);
        Self {
            state: Arc::new(RwLock::new(BoardSnapshot::default())),
            deliveries: Arc::new(deliveries),
        }
    }

    /// Show the waiting indicator for a freshly submitted task
    pub async fn mark_pending(&self, task_id: Uuid) {
        let mut state = self.state.write().await;
        if state.last_task == Some(task_id) {
            return;
        }
        state.waiting = true;
        state.pending_task = Some(task_id);
    }

    pub async fn snapshot(&self) -> BoardSnapshot {
        self.state.read().await.clone()
    }

    pub async fn last_analysis(&self) -> Option<String> {
        self.state.read().await.last_analysis.clone()
    }

    /// Wait until more than `seen` outcomes have been delivered
    pub async fn wait_for_delivery(&self, seen: u64) -> BoardSnapshot {
        let mut deliveries = self.deliveries.subscribe();
        // The sender lives as long as the board, so this cannot fail
        let _ = deliveries.wait_for(|count| *count > seen).await;
        self.snapshot().await
    }
}

/// Status line shown after a successful analysis
pub fn token_status(ttl_secs: i64) -> String {
    format!("Token valid for {} min", ttl_secs.div_euclid(60))
}

#[async_trait]
impl OutcomeSink for AnalysisBoard {
    async fn deliver(&self, outcome: AnalysisOutcome) {
        let delivered = {
            let mut state = self.state.write().await;
            let task = outcome.task_id();
            // A newer submission may already be pending; only its own outcome clears it
            if state.pending_task == Some(task) {
                state.waiting = false;
                state.pending_task = None;
            }
            state.delivered += 1;
            state.last_task = Some(task);

            match outcome {
                AnalysisOutcome::Success {
                    task_id,
                    text,
                    token_ttl_secs,
                } => {
                    info!(%task_id, "Analysis ready");
                    state.last_analysis = Some(text);
                    state.last_error = None;
                    state.token_status = token_status(token_ttl_secs);
                }
                AnalysisOutcome::Failure { task_id, message } => {
                    info!(%task_id, "Analysis failed: {}", message);
                    state.last_error = Some(message);
                }
            }
            state.delivered
        };

        self.deliveries.send_replace(delivered);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_success_updates_analysis_and_token_status() {
        let board = AnalysisBoard::new();
        let id = Uuid::new_v4();
        board.mark_pending(id).await;
        assert!(board.snapshot().await.waiting);

        board
            .deliver(AnalysisOutcome::Success {
                task_id: id,
                text: "## Плюсы".to_string(),
                token_ttl_secs: 1799,
            })
            .await;

        let snapshot = board.snapshot().await;
        assert!(!snapshot.waiting);
        assert_eq!(snapshot.pending_task, None);
        assert_eq!(snapshot.last_analysis.as_deref(), Some("## Плюсы"));
        assert_eq!(snapshot.token_status, "Token valid for 29 min");
        assert_eq!(snapshot.delivered, 1);
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_analysis() {
        let board = AnalysisBoard::new();
        board
            .deliver(AnalysisOutcome::Success {
                task_id: Uuid::new_v4(),
                text: "old".to_string(),
                token_ttl_secs: 600,
            })
            .await;
        board
            .deliver(AnalysisOutcome::Failure {
                task_id: Uuid::new_v4(),
                message: "timeout".to_string(),
            })
            .await;

        let snapshot = board.snapshot().await;
        assert_eq!(snapshot.last_analysis.as_deref(), Some("old"));
        assert_eq!(snapshot.last_error.as_deref(), Some("timeout"));
        assert_eq!(snapshot.token_status, "Token valid for 10 min");
    }

    #[tokio::test]
    async fn test_next_delivery_wakes_waiter() {
        let board = AnalysisBoard::new();
        let waiter = {
            let board = board.clone();
            tokio::spawn(async move { board.wait_for_delivery(0).await })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        board
            .deliver(AnalysisOutcome::Failure {
                task_id: Uuid::new_v4(),
                message: "down".to_string(),
            })
            .await;

        let snapshot = waiter.await.unwrap();
        assert_eq!(snapshot.last_error.as_deref(), Some("down"));
        assert_eq!(board.snapshot().await.token_status, TOKEN_STATUS_UNKNOWN);

        // Already satisfied, returns at once
        assert_eq!(board.wait_for_delivery(0).await.delivered, 1);
    }

    #[tokio::test]
    async fn test_mark_pending_after_delivery_is_ignored() {
        let board = AnalysisBoard::new();
        let id = Uuid::new_v4();
        board
            .deliver(AnalysisOutcome::Failure {
                task_id: id,
                message: "fast".to_string(),
            })
            .await;
        board.mark_pending(id).await;

        let snapshot = board.snapshot().await;
        assert!(!snapshot.waiting);
        assert_eq!(snapshot.last_task, Some(id));
    }

    #[tokio::test]
    async fn test_stale_outcome_keeps_newer_task_pending() {
        let board = AnalysisBoard::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        board.mark_pending(first).await;
        board.mark_pending(second).await;

        board
            .deliver(AnalysisOutcome::Failure {
                task_id: first,
                message: "slow network".to_string(),
            })
            .await;

        let snapshot = board.snapshot().await;
        assert!(snapshot.waiting);
        assert_eq!(snapshot.pending_task, Some(second));
        assert_eq!(snapshot.last_error.as_deref(), Some("slow network"));

        board
            .deliver(AnalysisOutcome::Success {
                task_id: second,
                text: "## Плюсы".to_string(),
                token_ttl_secs: 60,
            })
            .await;

        let snapshot = board.snapshot().await;
        assert!(!snapshot.waiting);
        assert_eq!(snapshot.pending_task, None);
        assert_eq!(snapshot.delivered, 2);
    }

    #[test]
    fn test_initial_status() {
        assert_eq!(BoardSnapshot::default().token_status, "Token not obtained");
    }
}
