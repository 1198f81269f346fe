//! CLI entry point for `llm-status`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use llm_status::RequestStatusTracker;
use llm_status::logging::{self, LogSink};
use llm_status::pipeline::{self, PipelinePlan};
use llm_status::settings::Settings;
use llm_status::tui::{self, DemoOptions};

#[derive(Parser, Debug)]
#[command(
    name = "llm-status",
    author,
    version,
    about = "Live status overlay for in-flight language-model requests",
    long_about = "Tracks the phases of a language-model request (thinking, fetching context, \
                  generating, complete) and renders a spinner bubble plus a debug panel.\n\n\
                  Run 'llm-status' to open the interactive demo."
)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write logs to this file (the demo logs nowhere otherwise)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Open the interactive overlay demo (default)
    Demo {
        /// Pipeline plan (TOML) used for every request
        #[arg(long)]
        plan: Option<PathBuf>,
    },
    /// Run one request headless and print its debug log
    Simulate {
        /// Conversation partner name (defaults to the configured one)
        #[arg(long)]
        npc: Option<String>,
        /// Message to send
        #[arg(short, long, default_value = "Hello")]
        message: String,
        /// Pipeline plan (TOML)
        #[arg(long)]
        plan: Option<PathBuf>,
    },
    /// Show or change persistent settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
}

#[derive(Subcommand, Debug, Clone)]
enum SettingsCommand {
    /// Print current settings
    Show,
    /// Set a single setting
    Set { key: String, value: String },
    /// List available setting keys
    Keys,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::set_verbose(cli.verbose);

    let settings_path = match cli.config.clone() {
        Some(path) => path,
        None => Settings::path()?,
    };
    let settings = Settings::load_from(&settings_path)?;

    match cli.command.clone().unwrap_or(Commands::Demo { plan: None }) {
        Commands::Demo { plan } => {
            let sink = cli.log_file.clone().map_or(LogSink::Disabled, LogSink::File);
            logging::init(&sink)?;
            let options = DemoOptions {
                settings_path: Some(settings_path),
                plan: load_plan(plan)?,
            };
            tui::run_demo(settings, options).await
        }
        Commands::Simulate { npc, message, plan } => {
            init_headless_logging(&cli)?;
            let plan = load_plan(plan)?;
            let npc = npc.unwrap_or_else(|| settings.npc_name.clone());
            run_simulate(&settings, &npc, &message, plan).await
        }
        Commands::Settings { command } => {
            init_headless_logging(&cli)?;
            run_settings_command(settings, &settings_path, command)
        }
    }
}

fn init_headless_logging(cli: &Cli) -> Result<()> {
    let sink = cli.log_file.clone().map_or(LogSink::Stderr, LogSink::File);
    logging::init(&sink)
}

fn load_plan(path: Option<PathBuf>) -> Result<PipelinePlan> {
    match path {
        Some(path) => {
            let plan = PipelinePlan::load(&path)?;
            logging::info(format!("Loaded pipeline plan from {}", path.display()));
            Ok(plan)
        }
        None => Ok(PipelinePlan::default()),
    }
}

async fn run_simulate(
    settings: &Settings,
    npc: &str,
    message: &str,
    plan: PipelinePlan,
) -> Result<()> {
    let mut tracker = RequestStatusTracker::with_text(settings.status_text());
    println!("You: {message}");
    let response = pipeline::drive(&mut tracker, npc, message, plan, |entry| {
        println!("  {entry}");
    })
    .await
    .context("Pipeline finished without a response")?;
    println!("{npc}: {response}");
    Ok(())
}

fn run_settings_command(
    mut settings: Settings,
    path: &std::path::Path,
    command: SettingsCommand,
) -> Result<()> {
    match command {
        SettingsCommand::Show => {
            println!("{}", settings.display());
        }
        SettingsCommand::Set { key, value } => {
            settings.set(&key, &value)?;
            settings.save_to(path)?;
            println!("Set {key} = {value}");
        }
        SettingsCommand::Keys => {
            for (key, description) in Settings::available_settings() {
                println!("  {key:<24} {description}");
            }
        }
    }
    Ok(())
}
