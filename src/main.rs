use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use codesense_core::export::write_export;
use codesense_core::{
    spawn_analysis, Config, Mode, Report, ReviewClient, ScoreBand, SelectedFile, Session,
    SessionState,
};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;

#[derive(Parser)]
#[command(name = "codesense")]
#[command(about = "Terminal client for the CodeSense AI code review service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Analysis endpoint for this run (overrides the config file)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Override log level (trace/debug/info/warn/error)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive terminal UI (default)
    Tui,
    /// Review one file and print the report
    Analyze {
        /// Source file to submit
        file: PathBuf,
        /// Also write the text export
        #[arg(short, long)]
        export: bool,
        /// Directory for the export (defaults to the configured export_dir)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },
    /// Show the effective configuration
    Config {
        /// Persist a new default endpoint
        #[arg(long)]
        set_endpoint: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = endpoint.clone();
    }

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            let log_path = config.log_file()?;
            let _guard = init_logging(cli.log_level.as_deref(), &config, Some(&log_path))?;
            run_tui(config).await
        }
        Commands::Analyze { file, export, out_dir } => {
            let _guard = init_logging(cli.log_level.as_deref(), &config, None)?;
            analyze_file(&config, &file, export, out_dir.as_deref()).await
        }
        Commands::Config { set_endpoint } => show_config(config, set_endpoint.as_deref()),
    }
}

/// With a file path, everything goes to that file; stderr belongs to the
/// terminal UI. Without one, logs go to stderr.
fn init_logging(
    log_level: Option<&str>,
    config: &Config,
    file_path: Option<&Path>,
) -> Result<Option<WorkerGuard>> {
    let level = log_level.unwrap_or(config.logging.level.as_str());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (layer, guard) = match file_path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create log dir: {}", parent.display()))?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file: {}", path.display()))?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .boxed();
            (layer, Some(guard))
        }
        None => {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .boxed();
            (layer, None)
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

async fn run_tui(config: Config) -> Result<()> {
    info!(endpoint = %config.endpoint, "starting terminal UI");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();
    let tx = events.sender();
    let mut app = App::new(config);

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event, &tx).await?,
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    result
}

async fn analyze_file(
    config: &Config,
    path: &Path,
    export: bool,
    out_dir: Option<&Path>,
) -> Result<()> {
    let file = SelectedFile::load(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;

    if !file.is_supported_source() {
        eprintln!(
            "{} {} is not a .py/.js/.java/.ts/.cpp/.c file; submitting anyway",
            "warning:".yellow().bold(),
            file.name
        );
    }

    let client = Arc::new(ReviewClient::new(&config.endpoint));
    let mut session = Session::new();
    session.select_file(file);
    let submission = session.submit()?;

    eprintln!("{} {}", "Analyzing".dimmed(), submission.file.name.cyan());
    let completion = spawn_analysis(client, submission)
        .await
        .context("analysis task failed")?;
    session.complete(completion);

    match session.state() {
        SessionState::Succeeded { file, record } => {
            print_report(&Report::build(&file.name, record));

            if export {
                let dir = out_dir
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| config.export_dir());
                let written = write_export(&dir, &file.name, record, config.export)?;
                println!("{} {}", "Exported:".green().bold(), written.display());
            }
            Ok(())
        }
        SessionState::Failed { message, .. } => Err(anyhow!("{}", message)),
        other => Err(anyhow!("analysis ended in unexpected state: {}", other.label())),
    }
}

fn print_report(report: &Report) {
    println!("\n{}", report.title().bold());
    println!("{}", "=".repeat(50).dimmed());

    let score = report.score_label();
    let score = score.as_str();
    let score = match report.band {
        ScoreBand::Good => score.green(),
        ScoreBand::Warning => score.yellow(),
        ScoreBand::Poor => score.red(),
    };
    println!("\n{} {}", "Code Quality Score:".bold().cyan(), score.bold());

    for section in &report.sections {
        println!("\n{}", section.title.bold().cyan());

        if section.items.is_empty() {
            let placeholder = match section.kind {
                Mode::Narrative => "Not provided.",
                Mode::EnumeratedList => "No items reported.",
            };
            println!("{}", placeholder.dimmed().italic());
        }

        for item in &section.items {
            match section.kind {
                Mode::Narrative => println!("{}", item),
                Mode::EnumeratedList => println!("  {} {}", "•".yellow(), item),
            }
        }
    }
    println!();
}

fn show_config(mut config: Config, set_endpoint: Option<&str>) -> Result<()> {
    if let Some(endpoint) = set_endpoint {
        Config::save_endpoint(endpoint)?;
        config.endpoint = endpoint.to_string();
        println!("{} {}", "Saved endpoint:".green().bold(), endpoint);
    }

    println!("{} {}", "Config file:".bold(), Config::config_path()?.display());
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
