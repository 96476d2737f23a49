use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use compsift::backtest;
use compsift_api::{parse_cors_origin, AppState, RestApi};
use compsift_similarity::{CompRanker, RankerConfig, ScoringWeights};
use compsift_storage::{AppraisalRepository, AppraisalSource, RemoteRepository};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Comparable-property ranking service for residential appraisals
#[derive(Parser, Debug)]
#[command(name = "compsift")]
#[command(about = "Select and explain comparable properties for an appraisal", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,

    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default)
    Serve(ServeArgs),
    /// Score the ranker against the comps appraisers actually chose
    Backtest(BacktestArgs),
}

#[derive(Args, Debug, Clone)]
struct SourceArgs {
    /// Appraisal dataset file
    #[arg(long, conflicts_with = "remote_url")]
    data_file: Option<PathBuf>,

    /// URL serving the appraisal dataset document
    #[arg(long)]
    remote_url: Option<String>,

    /// Upstream request timeout in seconds
    #[arg(long, default_value_t = 10)]
    remote_timeout_secs: u64,
}

#[derive(Args, Debug, Clone)]
struct ScoringArgs {
    /// Candidates farther than this many miles are excluded
    #[arg(long)]
    max_radius: Option<f64>,

    /// Number of comps to return
    #[arg(long)]
    top_n: Option<usize>,

    /// JSON file with scoring weights; missing fields keep their defaults
    #[arg(long)]
    weights: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct ServeArgs {
    #[command(flatten)]
    source: SourceArgs,

    #[command(flatten)]
    scoring: ScoringArgs,

    /// HTTP API port
    #[arg(long, default_value_t = 8000)]
    http_port: u16,

    /// Allowed CORS origin (any origin when omitted)
    #[arg(long)]
    cors_origin: Option<String>,

    /// Seconds between dataset file change checks, 0 disables reloading
    #[arg(long, default_value_t = 30)]
    reload_interval_secs: u64,
}

#[derive(Args, Debug, Clone)]
struct BacktestArgs {
    #[command(flatten)]
    source: SourceArgs,

    #[command(flatten)]
    scoring: ScoringArgs,

    /// Also print the result for every appraisal
    #[arg(long)]
    per_appraisal: bool,
}

fn build_ranker(args: &ScoringArgs) -> anyhow::Result<CompRanker> {
    let mut config = RankerConfig::default();

    if let Some(path) = &args.weights {
        let raw = std::fs::read(path)
            .with_context(|| format!("reading weights file {}", path.display()))?;
        let weights: ScoringWeights = serde_json::from_slice(&raw)
            .with_context(|| format!("parsing weights file {}", path.display()))?;
        config.weights = weights;
    }

    let config = config.with_overrides(args.top_n, args.max_radius)?;
    Ok(CompRanker::new(config)?)
}

fn open_source(args: &SourceArgs) -> anyhow::Result<AppraisalSource> {
    match (&args.data_file, &args.remote_url) {
        (Some(path), _) => {
            let repository = AppraisalRepository::open(path)
                .with_context(|| format!("loading dataset {}", path.display()))?;
            info!("Loaded {} appraisals from {:?}", repository.len(), path);
            Ok(AppraisalSource::Local(Arc::new(repository)))
        }
        (None, Some(url)) => {
            let remote = RemoteRepository::new(url.clone(), Duration::from_secs(args.remote_timeout_secs))?;
            Ok(remote.into())
        }
        (None, None) => anyhow::bail!("either --data-file or --remote-url is required"),
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let ranker = build_ranker(&args.scoring)?;
    let cors_origin = args
        .cors_origin
        .as_deref()
        .map(parse_cors_origin)
        .transpose()?
        .flatten();
    let source = open_source(&args.source)?;

    if let AppraisalSource::Local(repository) = &source {
        if args.reload_interval_secs > 0 {
            repository.start_watch(Duration::from_secs(args.reload_interval_secs));
        }
    }

    info!("Appraisal source: {}", source.describe());
    info!(
        "Ranking: top {} within {} miles",
        ranker.config().top_n,
        ranker.config().max_radius_miles
    );
    info!("HTTP API port: {}", args.http_port);
    info!("CORS origin: {}", cors_origin.as_deref().unwrap_or("any"));

    let state = Arc::new(AppState { source, ranker });
    let http_port = args.http_port;
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(state, http_port, cors_origin).await {
                eprintln!("HTTP server error: {}", e);
            }
        })
    });

    info!("CompSift started successfully");
    info!("HTTP API: http://localhost:{}/", http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}

async fn run_backtest(args: BacktestArgs) -> anyhow::Result<()> {
    let ranker = build_ranker(&args.scoring)?;
    let source = open_source(&args.source)?;
    let records = source.records().await?;

    info!("Backtesting {} appraisals from {}", records.len(), source.describe());
    let report = backtest::run(&records, &ranker);

    if args.per_appraisal {
        for outcome in &report.appraisals {
            println!(
                "{}: {}/{} matched ({} recorded)",
                outcome.order_id, outcome.matched, outcome.picked, outcome.recorded
            );
        }
        for skipped in &report.skipped {
            println!("{}: skipped ({})", skipped.order_id, skipped.reason);
        }
    }

    println!("Appraisals evaluated: {}", report.appraisals.len());
    println!("Appraisals skipped:   {}", report.skipped.len());
    println!(
        "Matched comps:        {}/{} picked, {} recorded",
        report.total_matched(),
        report.total_picked(),
        report.total_recorded()
    );
    println!("Precision:            {:.1}%", report.precision() * 100.0);
    println!("Recall:               {:.1}%", report.recall() * 100.0);

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting CompSift v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(Command::Serve(args)) => serve(args).await,
        Some(Command::Backtest(args)) => run_backtest(args).await,
        None => serve(cli.serve).await,
    }
}
