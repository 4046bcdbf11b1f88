use clap::Parser;
use habit_cost::{
    analysis::{result_channel, AnalysisBoard, GigaChatConnector, ResultPoller, TaskDispatcher, WorkerPool},
    calculator::{AnalysisStatus, HabitCalculator},
    config::{Settings, DEFAULT_CONFIG_PATH},
    report::render_bars,
    validation::HabitForm,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const CHART_WIDTH: usize = 40;

/// How much does a habit cost?
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Price of one purchase, `.` or `,` as decimal separator
    #[arg(long)]
    price: String,

    /// Purchases per period
    #[arg(long)]
    frequency: String,

    /// day, week or month
    #[arg(long, default_value = "week")]
    period: String,

    /// Project only up to this date (YYYY-MM-DD)
    #[arg(long)]
    until: Option<String>,

    /// What the habit is; enables the GigaChat analysis
    #[arg(long)]
    description: Option<String>,

    /// Settings file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let settings = Settings::load(&cli.config)?.with_env_overrides()?;

    let form = HabitForm {
        price: cli.price,
        frequency: cli.frequency,
        period: Some(cli.period),
        use_date: cli.until.is_some(),
        until: cli.until,
        description: cli.description,
    };

    // Analysis runs on its own runtime; this one only renders and polls
    let workers = WorkerPool::new()?;
    let (tx, rx) = result_channel();
    let dispatcher = TaskDispatcher::new(Arc::new(GigaChatConnector), tx, workers.handle());
    let board = AnalysisBoard::new();
    let calculator = HabitCalculator::new(dispatcher, board.clone(), settings);

    let today = chrono::Local::now().date_naive();
    let calculation = match calculator.calculate(&form, today).await {
        Ok(calculation) => calculation,
        Err(e) => {
            eprintln!("Error: {}", e);
            workers.shutdown();
            std::process::exit(2);
        }
    };

    println!("{}\n", calculation.report.summary);
    print!("{}", render_bars(&calculation.report.bars, CHART_WIDTH));

    match calculation.analysis {
        AnalysisStatus::Submitted { task_id } => {
            info!(%task_id, "Waiting for analysis");
            println!("\nPlease wait, asking GigaChat...");

            let mut poller = ResultPoller::new(rx);
            poller.next_delivery(&board).await;
            let snapshot = board.snapshot().await;

            match (snapshot.last_error, snapshot.last_analysis) {
                (Some(error), _) => eprintln!("\nGigaChat: {}", error),
                (None, Some(text)) => {
                    println!("\n{}\n", text);
                    println!("{}", snapshot.token_status);
                }
                (None, None) => {}
            }
        }
        AnalysisStatus::Skipped { reason } => info!("Analysis skipped: {}", reason),
        AnalysisStatus::Busy => info!("Analysis already running"),
    }

    workers.shutdown();
    Ok(())
}
