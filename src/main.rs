use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use runwatch::config::{Config, LoggingConfig};
use runwatch::tracker::{ExecutionRecord, Outcome, StatusSummary, TestRunnerService};

#[derive(Parser)]
#[command(
    name = "runwatch",
    about = "In-memory demo API with an asynchronous test runner",
    version,
    long_about = None
)]
struct Cli {
    /// Path to a TOML config file (default: $RUNWATCH_CONFIG, then ./runwatch.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address (overrides [server].bind)
        #[arg(long, env = "RUNWATCH_BIND")]
        bind: Option<String>,
    },

    /// Run the whole test catalog and wait for the result
    RunAll {
        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,

        /// Give up waiting after this many seconds
        #[arg(long, default_value = "60")]
        timeout_secs: u64,
    },

    /// Run a single test and wait for the result
    RunOne {
        /// Test class, e.g. UserServiceTest
        test_class: String,

        /// Test method, e.g. testCreateUser
        test_method: String,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,

        /// Give up waiting after this many seconds
        #[arg(long, default_value = "60")]
        timeout_secs: u64,
    },

    /// List the available test groups and methods
    Catalog {
        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(),
    };
    init_tracing(&config.logging);

    match cli.command {
        Commands::Serve { bind } => {
            let mut config = config;
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            tracing::info!(bind = %config.server.bind, "Starting runwatch daemon");
            runwatch::serve(&config).await?;
        }
        Commands::RunAll { json, timeout_secs } => {
            let service = TestRunnerService::from_config(&config.runner);
            let id = service.start_all().await?;
            tracing::info!(execution_id = %id, "Running full test catalog");
            let record = wait(&service, &id, timeout_secs).await?;
            print_record(&record, json)?;
        }
        Commands::RunOne {
            test_class,
            test_method,
            json,
            timeout_secs,
        } => {
            let service = TestRunnerService::from_config(&config.runner);
            let id = service.start_one(&test_class, &test_method).await?;
            tracing::info!(execution_id = %id, %test_class, %test_method, "Running single test");
            let record = wait(&service, &id, timeout_secs).await?;
            print_record(&record, json)?;
        }
        Commands::Catalog { json } => {
            let service = TestRunnerService::from_config(&config.runner);
            let info = service.catalog_info();
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                for (group, methods) in &info.groups {
                    println!("{}", group);
                    for method in methods {
                        println!("  - {}", method);
                    }
                }
                println!(
                    "\n{} group(s), {} test(s)",
                    info.total_groups, info.total_subjects
                );
            }
        }
    }

    Ok(())
}

async fn wait(service: &TestRunnerService, id: &str, timeout_secs: u64) -> Result<ExecutionRecord> {
    let poll = service.wait_until_terminal(id, Duration::from_millis(100));
    let record = tokio::time::timeout(Duration::from_secs(timeout_secs), poll)
        .await
        .with_context(|| format!("execution {} still running after {}s", id, timeout_secs))??;
    Ok(record)
}

fn print_record(record: &ExecutionRecord, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
        return Ok(());
    }

    println!("\nExecution {}", record.id());
    println!("{:<45} | {:<8} | {:>8} | Message", "Test", "Outcome", "Time");
    println!("{:-<45}-|-{:-<8}-|-{:->8}-|-{:-<40}", "", "", "", "");
    for res in record.results() {
        let outcome = match res.outcome {
            Outcome::Passed => "PASS",
            Outcome::Failed => "FAIL",
            Outcome::Skipped => "SKIP",
        };
        println!(
            "{:<45} | {:<8} | {:>6}ms | {}",
            res.subject(),
            outcome,
            res.duration_ms,
            res.message
        );
    }

    println!("\n=== Output ===");
    for line in record.output() {
        println!("{}", line);
    }

    let summary = StatusSummary::from(record);
    println!(
        "\n{}: {} passed, {} failed, {} skipped",
        summary.state, summary.passed, summary.failed, summary.skipped
    );
    println!();
    Ok(())
}
