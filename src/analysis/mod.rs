//! Asynchronous analysis pipeline
//!
//! dispatcher → channel → poller → sink.
//! The remote model sits behind `AnalysisSession` so the pipeline can run
//! without a network.

use crate::config::Settings;
use crate::gigachat::GigaChatClient;
use crate::models::{AccessToken, AnalysisOutcome};
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

pub mod board;
pub mod channel;
pub mod dispatcher;

pub use board::{AnalysisBoard, BoardSnapshot};
pub use channel::{result_channel, OutcomeReceiver, OutcomeSender, OutcomeSink, ResultPoller};
pub use dispatcher::{TaskDispatcher, WorkerPool};

/// One authenticated conversation with the remote model
#[async_trait]
pub trait AnalysisSession: Send + Sync {
    async fn authenticate(&self) -> Result<AccessToken>;
    async fn complete(&self, token: &AccessToken, prompt: &str) -> Result<String>;
}

/// Builds a fresh session from the settings of one submission
pub trait Connector: Send + Sync {
    fn connect(&self, settings: &Settings) -> Result<Box<dyn AnalysisSession>>;
}

/// Production connector backed by the GigaChat REST API
pub struct GigaChatConnector;

impl Connector for GigaChatConnector {
    fn connect(&self, settings: &Settings) -> Result<Box<dyn AnalysisSession>> {
        Ok(Box::new(GigaChatClient::new(settings)?))
    }
}

#[async_trait]
impl AnalysisSession for GigaChatClient {
    async fn authenticate(&self) -> Result<AccessToken> {
        self.get_token().await
    }

    async fn complete(&self, token: &AccessToken, prompt: &str) -> Result<String> {
        self.chat(token, prompt).await
    }
}

/// Run one analysis to completion. Every fault becomes a `Failure`.
pub async fn run_analysis(
    task_id: Uuid,
    connector: &dyn Connector,
    settings: &Settings,
    prompt: &str,
) -> AnalysisOutcome {
    match request_analysis(connector, settings, prompt).await {
        Ok((text, token_ttl_secs)) => {
            debug!(%task_id, token_ttl_secs, "Analysis succeeded");
            AnalysisOutcome::Success {
                task_id,
                text,
                token_ttl_secs,
            }
        }
        Err(e) => {
            warn!(%task_id, error = %e, "Analysis failed");
            AnalysisOutcome::Failure {
                task_id,
                message: e.to_string(),
            }
        }
    }
}

async fn request_analysis(
    connector: &dyn Connector,
    settings: &Settings,
    prompt: &str,
) -> Result<(String, i64)> {
    let session = connector.connect(settings)?;
    let token = session.authenticate().await?;
    let ttl = token.ttl_seconds(Utc::now());
    let text = session.complete(&token, prompt).await?;
    Ok((text, ttl))
}
