use anyhow::Result;
use askweb_common::observability::{LogConfig, LogFormat, init_logging};
use askweb_config::{AskwebConfigLoader, default_config_path};
use askweb_pipeline::{Pipeline, Query};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

mod wiring;

const EMPTY_QUERY_WARNING: &str = "Please enter a question.";
const QUIT: &str = ":q";

/// Answer a question from web search results.
#[derive(Debug, Parser)]
#[command(name = "askweb", version)]
struct Cli {
    /// Question to answer; omit for an interactive prompt.
    question: Option<String>,

    /// Print the full run report as JSON instead of Markdown.
    #[arg(long)]
    json: bool,

    /// Config file (defaults to ./askweb.yaml or the user config dir).
    #[arg(long, env = "ASKWEB_CONFIG")]
    config: Option<PathBuf>,

    /// Also write logs to stderr.
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_path = init_logging(LogConfig {
        emit_stderr: cli.verbose,
        format: LogFormat::from_env(),
        ..LogConfig::default()
    })?;

    let mut loader = AskwebConfigLoader::new();
    if let Some(path) = cli.config.clone().or_else(default_config_path) {
        loader = loader.with_file(path);
    }
    let cfg = loader.load()?;
    tracing::info!(log = %log_path.display(), "askweb.start");

    let pipeline = wiring::build_pipeline(&cfg)?;

    match cli.question.as_deref() {
        Some(question) => ask(&pipeline, question, cli.json).await,
        None => interactive(&pipeline, cli.json).await?,
    }
    Ok(())
}

async fn interactive(pipeline: &Pipeline, json: bool) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("Ask a question ({QUIT} to quit)> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        if line.trim() == QUIT {
            break;
        }
        ask(pipeline, &line, json).await;
    }
    Ok(())
}

/// One question, one printed outcome. Failures are shown, never propagated.
async fn ask(pipeline: &Pipeline, question: &str, json: bool) {
    let Ok(query) = Query::new(question) else {
        eprintln!("{EMPTY_QUERY_WARNING}");
        return;
    };

    let spinner = spinner(json);
    let outcome = pipeline.run(&query).await;
    spinner.finish_and_clear();

    match outcome {
        Ok(report) if json => match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{text}"),
            Err(e) => eprintln!("failed to encode report: {e}"),
        },
        Ok(report) => println!("{}\n", report.answer.to_markdown()),
        Err(e) => println!("{e}"),
    }
}

fn spinner(hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    spinner.set_message("Searching and summarizing...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}
