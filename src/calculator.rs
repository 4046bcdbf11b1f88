//! Calculator facade
//!
//! VALIDATE → PROJECT → REPORT → (SUBMIT ANALYSIS)
//!
//! Everything here runs on the interactive runtime. The only hand-off to the
//! worker runtime is `TaskDispatcher::submit`.

use crate::analysis::{AnalysisBoard, TaskDispatcher};
use crate::config::Settings;
use crate::error::HabitError;
use crate::models::{ProjectionResult, PurchaseHabit};
use crate::projection::project;
use crate::prompt::build_prompt;
use crate::report::{clipboard_text, Report};
use crate::validation::HabitForm;
use crate::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What happened to the optional analysis request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AnalysisStatus {
    Submitted { task_id: Uuid },
    Skipped { reason: String },
    /// A previous request is still running
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Calculation {
    pub habit: PurchaseHabit,
    pub projection: ProjectionResult,
    pub report: Report,
    pub analysis: AnalysisStatus,
}

pub struct HabitCalculator {
    dispatcher: TaskDispatcher,
    board: AnalysisBoard,
    settings: RwLock<Settings>,
    settings_path: Option<PathBuf>,
    last_summary: RwLock<Option<String>>,
}

impl HabitCalculator {
    pub fn new(dispatcher: TaskDispatcher, board: AnalysisBoard, settings: Settings) -> Self {
        Self {
            dispatcher,
            board,
            settings: RwLock::new(settings),
            settings_path: None,
            last_summary: RwLock::new(None),
        }
    }

    /// Persist settings changes to `path`
    pub fn with_settings_path(mut self, path: PathBuf) -> Self {
        self.settings_path = Some(path);
        self
    }

    pub fn board(&self) -> &AnalysisBoard {
        &self.board
    }

    /// Run one calculation. Validation errors abort before the engine runs.
    pub async fn calculate(&self, form: &HabitForm, today: NaiveDate) -> Result<Calculation> {
        let habit = form.validate(today).map_err(|e| {
            debug!(error = %e, "Rejected habit input");
            e
        })?;

        let projection = project(&habit, today);
        let report = Report::from_projection(&projection);
        *self.last_summary.write().await = Some(report.summary.clone());

        info!(
            period = %habit.period(),
            total = %projection.primary_total,
            "Projection computed"
        );

        let analysis = self.request_analysis(form.description(), &habit, &projection).await;

        Ok(Calculation {
            habit,
            projection,
            report,
            analysis,
        })
    }

    async fn request_analysis(
        &self,
        description: Option<&str>,
        habit: &PurchaseHabit,
        projection: &ProjectionResult,
    ) -> AnalysisStatus {
        let settings = self.settings.read().await.clone();

        if !settings.has_credentials() {
            return AnalysisStatus::Skipped {
                reason: "GigaChat credentials not configured".to_string(),
            };
        }

        let Some(description) = description else {
            return AnalysisStatus::Skipped {
                reason: "No habit description given".to_string(),
            };
        };

        let prompt = build_prompt(description, habit, projection);

        match self.dispatcher.submit(prompt, settings) {
            Ok(task_id) => {
                self.board.mark_pending(task_id).await;
                AnalysisStatus::Submitted { task_id }
            }
            Err(HabitError::AnalysisInFlight) => AnalysisStatus::Busy,
            Err(e) => {
                warn!(error = %e, "Analysis not submitted");
                AnalysisStatus::Skipped {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Summary plus the last received analysis, ready for the clipboard
    pub async fn copy_text(&self) -> Option<String> {
        let summary = self.last_summary.read().await.clone()?;
        let analysis = self.board.last_analysis().await;
        Some(clipboard_text(&summary, analysis.as_deref()))
    }

    pub async fn settings(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Replace the settings used by future submissions and save them
    pub async fn update_settings(&self, settings: Settings) -> Result<()> {
        if let Some(path) = &self.settings_path {
            settings.save(path)?;
        }
        *self.settings.write().await = settings;
        info!("Settings updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::testing::{Behavior, ScriptedConnector};
    use crate::analysis::{result_channel, OutcomeReceiver, ResultPoller};
    use crate::models::amount;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::runtime::Handle;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn form(price: &str, description: Option<&str>) -> HabitForm {
        HabitForm {
            price: price.to_string(),
            frequency: "3".to_string(),
            period: Some("week".to_string()),
            description: description.map(str::to_string),
            ..Default::default()
        }
    }

    fn calculator(behavior: Behavior, credentials: &str) -> (HabitCalculator, OutcomeReceiver) {
        let (tx, rx) = result_channel();
        let dispatcher = TaskDispatcher::new(
            Arc::new(ScriptedConnector::new(behavior).with_delay(Duration::from_millis(50))),
            tx,
            Handle::current(),
        );
        let settings = Settings {
            giga_credentials: credentials.to_string(),
            ..Default::default()
        };
        (HabitCalculator::new(dispatcher, AnalysisBoard::new(), settings), rx)
    }

    #[tokio::test]
    async fn test_projection_without_credentials() {
        let (calc, _rx) = calculator(Behavior::Answer, "");
        let result = calc.calculate(&form("150", Some("Кофе")), today()).await.unwrap();

        assert_eq!(result.projection.primary_total, amount("23400"));
        assert_eq!(result.projection.secondary_total, Some(amount("117000")));
        assert!(matches!(result.analysis, AnalysisStatus::Skipped { .. }));
    }

    #[tokio::test]
    async fn test_validation_error_skips_everything() {
        let (calc, _rx) = calculator(Behavior::Answer, "key");
        let result = calc.calculate(&form("0", Some("Кофе")), today()).await;

        assert!(matches!(result, Err(HabitError::InvalidAmount)));
        assert!(calc.copy_text().await.is_none());
        assert!(!calc.board().snapshot().await.waiting);
    }

    #[tokio::test]
    async fn test_blank_description_skips_analysis() {
        let (calc, _rx) = calculator(Behavior::Answer, "key");
        let result = calc.calculate(&form("150", Some("  ")), today()).await.unwrap();
        assert!(matches!(result.analysis, AnalysisStatus::Skipped { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_failure_leaves_projection_intact() {
        let (calc, rx) = calculator(Behavior::NetworkFault, "key");
        let result = calc.calculate(&form("150", Some("Кофе")), today()).await.unwrap();
        assert!(matches!(result.analysis, AnalysisStatus::Submitted { .. }));
        assert!(calc.board().snapshot().await.waiting);

        let board = calc.board().clone();
        let poller = ResultPoller::with_interval(rx, Duration::from_millis(20));
        let polling = tokio::spawn(async move { poller.run(&board).await });

        let snapshot = tokio::time::timeout(Duration::from_secs(5), calc.board().wait_for_delivery(0))
            .await
            .unwrap();
        polling.abort();

        assert_eq!(snapshot.delivered, 1);
        assert!(!snapshot.waiting);
        assert!(snapshot.last_error.unwrap().contains("connection refused"));
        assert_eq!(result.report.summary, "You spend 23 400.00 ₽ per year\nand 117 000.00 ₽ over 5 years.");
        assert_eq!(
            calc.copy_text().await.as_deref(),
            Some("You spend 23 400.00 ₽ per year\nand 117 000.00 ₽ over 5 years.")
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_second_calculation_while_busy() {
        let (calc, mut rx) = calculator(Behavior::Answer, "key");
        let first = calc.calculate(&form("150", Some("Кофе")), today()).await.unwrap();
        let second = calc.calculate(&form("90", Some("Чай")), today()).await.unwrap();

        assert!(matches!(first.analysis, AnalysisStatus::Submitted { .. }));
        assert_eq!(second.analysis, AnalysisStatus::Busy);
        assert_eq!(second.projection.primary_total, amount("14040"));

        let board = calc.board().clone();
        let mut delivered = false;
        for _ in 0..250 {
            if let Some(outcome) = rx.try_next() {
                use crate::analysis::OutcomeSink;
                board.deliver(outcome).await;
                delivered = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(delivered);

        let copied = calc.copy_text().await.unwrap();
        assert!(copied.starts_with("You spend 14 040.00 ₽ per year"));
        assert!(copied.contains("\n\nanalysis of: Привычка: Кофе."));
    }

    #[tokio::test]
    async fn test_update_settings_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("habit_config.json");
        let (calc, _rx) = calculator(Behavior::Answer, "");
        let calc = calc.with_settings_path(path.clone());

        let mut settings = calc.settings().await;
        settings.giga_credentials = "new-key".to_string();
        calc.update_settings(settings.clone()).await.unwrap();

        assert_eq!(calc.settings().await, settings);
        assert_eq!(Settings::load(&path).unwrap(), settings);
    }
}
