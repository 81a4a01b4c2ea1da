use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use tracing::{debug, error, trace};

mod api;
mod config;
mod errors;
mod input;
mod models;
mod workflows;

use crate::api::jira::JiraClient;
use crate::config::settings::Parameters;
use crate::errors::Result;
use crate::input::IssueTable;
use crate::workflows::EpicReport;

#[derive(Parser)]
#[command(name = "jira-epic")]
#[command(version)]
#[command(about = "Create or copy Jira epics together with their issues", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the configuration file (default: ./jira-epic.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new epic and one issue per row of the input table
    Create {
        /// CSV with issue_name, issue_description and issue_type columns
        #[arg(short, long = "input")]
        inputs: Vec<PathBuf>,
    },

    /// Copy an existing epic and its linked issues
    Copy {
        /// Key of the epic to copy (overrides original_epic_key)
        #[arg(long)]
        from: Option<String>,
    },

    /// Validate configuration and test the Jira credentials
    Check,

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Display current configuration (with masked secrets)
    Show,

    /// Get the path to the config file
    Path,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    std::panic::set_hook(Box::new(|info| {
        error!("Unexpected failure: {}", info);
        std::process::exit(2);
    }));

    let config_path = cli.config.as_deref();
    let result = match cli.command {
        Commands::Create { inputs } => match Parameters::load(config_path) {
            Ok(params) => run_create(params, inputs).await.map(|(server, report)| {
                print_report("Epic created!", &server, &report);
            }),
            Err(e) => Err(e),
        },

        Commands::Copy { from } => match Parameters::load(config_path) {
            Ok(params) => run_copy(params, from).await.map(|(server, report)| {
                print_report("Epic copied!", &server, &report);
            }),
            Err(e) => Err(e),
        },

        Commands::Check => handle_check(config_path).await,

        Commands::Config { action } => handle_config(action, config_path),
    };

    if let Err(e) = result {
        if e.is_user_facing() {
            error!("{}", e.to_string().lines().next().unwrap_or_default());
        } else {
            error!("Unexpected error: {:?}", e);
        }
        eprintln!("\n{}", e);
        std::process::exit(e.exit_code());
    }
}

fn init_logging(verbose: u8) {
    let log_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .with_line_number(verbose >= 2)
        .init();

    debug!("jira-epic started with verbosity level: {}", verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());
}

/// Validates everything locally, then authenticates and runs the creator.
/// Returns the server URL alongside the report for printing links.
async fn run_create(mut params: Parameters, inputs: Vec<PathBuf>) -> Result<(String, EpicReport)> {
    params.input_tables.extend(inputs);
    let config = params.validate_creator()?;

    let rows = input::single_input_table(&config.input_tables)?
        .map(IssueTable::open)
        .transpose()?;

    let jira = JiraClient::connect(&config.jira).await?;
    let report = workflows::creator::run(&jira, &config, rows).await?;

    Ok((config.jira.server, report))
}

async fn run_copy(mut params: Parameters, from: Option<String>) -> Result<(String, EpicReport)> {
    if from.is_some() {
        params.original_epic_key = from;
    }
    let config = params.validate_copier()?;

    let jira = JiraClient::connect(&config.jira).await?;
    let report = workflows::copier::copy_epic(&jira, &config).await?;

    Ok((config.jira.server, report))
}

fn print_report(headline: &str, server: &str, report: &EpicReport) {
    println!();
    println!("{}", headline.green().bold());
    println!("  {} {}", "Epic:".bold(), report.epic_key.bright_white());
    println!(
        "  {} {}",
        "Link:".bold(),
        format!("{}/browse/{}", server, report.epic_key).bright_cyan()
    );

    if report.child_keys.is_empty() {
        println!("  {} {}", "Issues:".bold(), "none".dimmed());
    } else {
        println!(
            "  {} {}",
            "Issues:".bold(),
            report.child_keys.join(", ").bright_white()
        );
    }
}

async fn handle_check(config_path: Option<&std::path::Path>) -> Result<()> {
    println!("{}", "Validating configuration...".cyan().bold());
    println!();

    let params = Parameters::load(config_path)?;
    let credentials = params.validate_credentials()?;

    print!("{}", "  Testing Jira connection... ".dimmed());
    std::io::Write::flush(&mut std::io::stdout()).ok();

    match JiraClient::connect(&credentials).await {
        Ok(_) => println!("{}", "✓".green().bold()),
        Err(e) => {
            println!("{}", "✗".red().bold());
            return Err(e);
        }
    }

    let readiness = |result: Result<()>| match result {
        Ok(()) => "ready".green(),
        Err(_) => "incomplete".yellow(),
    };
    println!(
        "  {} {}",
        "create:".dimmed(),
        readiness(params.validate_creator().map(|_| ()))
    );
    println!(
        "  {} {}",
        "copy:".dimmed(),
        readiness(params.validate_copier().map(|_| ()))
    );

    println!();
    println!("{}", "✓ Credentials are valid!".green().bold());
    Ok(())
}

fn handle_config(action: ConfigAction, config_path: Option<&std::path::Path>) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let params = Parameters::load(config_path)?;
            let rendered = render_masked(&params)?;

            println!("{}", "Current Configuration".cyan().bold());
            println!();
            println!("{}", rendered);
            Ok(())
        }

        ConfigAction::Path => {
            let path = Parameters::config_path(config_path);
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn render_masked(params: &Parameters) -> anyhow::Result<String> {
    use anyhow::Context;

    toml::to_string_pretty(&params.masked()).context("Failed to render configuration")
}
