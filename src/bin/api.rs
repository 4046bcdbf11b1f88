use habit_cost::{
    analysis::{result_channel, AnalysisBoard, GigaChatConnector, ResultPoller, TaskDispatcher, WorkerPool},
    api::start_server,
    calculator::HabitCalculator,
    config::{Settings, DEFAULT_CONFIG_PATH},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let config_path = std::env::var("HABIT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
    let settings = Settings::load(&config_path)?.with_env_overrides()?;

    if !settings.has_credentials() {
        eprintln!("⚠️  GigaChat credentials not set, analysis disabled");
        eprintln!("📌 Set HABIT_GIGA_CREDENTIALS or edit {}", config_path.display());
    }

    let api_port: u16 = std::env::var("PORT")
        .or_else(|_| std::env::var("API_PORT"))
        .unwrap_or_else(|_| "8080".to_string())
        .parse()?;

    info!("🚀 Habit Cost Estimator - API Server");
    info!("📍 Port: {}", api_port);

    // Analysis tasks run on the worker pool, everything else on this thread
    let workers = WorkerPool::new()?;
    let (tx, rx) = result_channel();
    let dispatcher = TaskDispatcher::new(Arc::new(GigaChatConnector), tx, workers.handle());
    let board = AnalysisBoard::new();

    let calculator = Arc::new(
        HabitCalculator::new(dispatcher, board.clone(), settings).with_settings_path(config_path),
    );

    let poller = ResultPoller::new(rx);
    tokio::spawn(async move { poller.run(&board).await });

    info!("✅ Calculator initialized");
    info!("📡 Starting API server...");

    let served = start_server(calculator, api_port).await;
    workers.shutdown();
    served
}
