use crate::commands;
use crate::common::CommonParams;
use crate::log_debug;
use crate::providers::Provider;
use crate::types::{Browser, Framework, Language};
use crate::ui;
use clap::builder::{Styles, styling::AnsiColor};
use clap::{Args, Parser, Subcommand, crate_version};
use colored::Colorize;
use std::path::PathBuf;

const LOG_FILE: &str = "testforge-debug.log";

/// CLI structure defining the available commands and global arguments
#[derive(Parser)]
#[command(
    author,
    version = crate_version!(),
    about = "testforge: generate browser tests and CI pipelines with LLMs",
    long_about = "testforge turns plain-language test scenarios into runnable Playwright or Selenium tests and renders CI pipelines to run them.",
    disable_version_flag = true,
    after_help = get_dynamic_help(),
    styles = get_styles(),
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log debug messages to a file
    #[arg(
        short = 'l',
        long = "log",
        global = true,
        help = "Log debug messages to a file"
    )]
    pub log: bool,

    #[arg(
        long = "log-file",
        global = true,
        help = "Specify a custom log file path"
    )]
    pub log_file: Option<String>,

    /// Suppress non-essential output (spinners, progress lines)
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        help = "Suppress non-essential output"
    )]
    pub quiet: bool,

    #[arg(
        short = 'v',
        long = "version",
        global = true,
        help = "Display the version"
    )]
    pub version: bool,
}

/// Enumeration of available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Generate test files from scenarios
    #[command(
        about = "Generate test files from natural-language scenarios",
        long_about = "Generate one test file per scenario. Scenarios come from the arguments and/or a file with one scenario per line; blank lines and lines starting with '#' are skipped.",
        after_help = get_dynamic_help()
    )]
    Generate(GenerateArgs),

    /// Render a CI pipeline that runs the generated tests
    #[command(about = "Render a CI pipeline for the generated tests")]
    Pipeline(PipelineArgs),

    /// Configure providers and defaults
    #[command(
        about = "Configure testforge settings and providers",
        long_about = "Set the default provider and its API key, model and endpoint. Without flags, prints the current configuration."
    )]
    Config {
        #[command(flatten)]
        common: CommonParams,

        #[arg(long, help = "Set API key for the selected provider")]
        api_key: Option<String>,
    },

    /// List supported LLM providers
    #[command(about = "List supported LLM providers and their defaults")]
    ListProviders,
}

#[derive(Args, Debug, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub common: CommonParams,

    /// Scenarios to generate tests for
    #[arg(value_name = "SCENARIO")]
    pub scenarios: Vec<String>,

    #[arg(short, long, help = "Read scenarios from a file, one per line")]
    pub file: Option<PathBuf>,

    #[arg(long, help = "Test framework (playwright, selenium)")]
    pub framework: Option<Framework>,

    #[arg(long, help = "Test language (python, javascript, typescript, java, csharp)")]
    pub language: Option<Language>,

    #[arg(long, help = "Browser to drive (chromium, firefox, webkit)")]
    pub browser: Option<Browser>,

    #[arg(long, help = "Run the browser with a visible window")]
    pub headed: bool,

    #[arg(long, help = "Leave out setup code")]
    pub no_setup: bool,

    #[arg(long, help = "Leave out teardown code")]
    pub no_teardown: bool,

    #[arg(long, value_name = "MS", help = "Default timeout used inside the tests, 1000-120000 ms")]
    pub timeout: Option<u32>,

    #[arg(long, value_name = "SECS", help = "Upper bound for each provider call")]
    pub request_timeout: Option<u64>,

    #[arg(long, help = "Number of provider calls in flight at once")]
    pub concurrency: Option<usize>,

    #[arg(long, help = "Retries after timeouts, rate limits and network errors")]
    pub retries: Option<u32>,

    #[arg(long, help = "URL of the site under test, passed to the model")]
    pub website_url: Option<String>,

    #[arg(long, help = "Base URL the tests should navigate from")]
    pub base_url: Option<String>,

    #[arg(short, long, help = "Directory the test files are written to")]
    pub output_dir: Option<PathBuf>,

    #[arg(short, long, help = "Print the generated code to stdout instead of writing files")]
    pub print: bool,
}

#[derive(Args, Debug)]
pub struct PipelineArgs {
    #[arg(long, default_value = "github_actions", help = "CI system (github_actions, gitlab_ci)")]
    pub ci: String,

    #[arg(long, help = "Test framework; defaults to the configured one")]
    pub framework: Option<String>,

    #[arg(long, help = "Test language; defaults to the configured one")]
    pub language: Option<String>,

    #[arg(long, help = "Do not run on push")]
    pub no_push: bool,

    #[arg(long, help = "Do not run on pull or merge requests")]
    pub no_pull_request: bool,

    #[arg(long, value_name = "EXPR", help = "Five-field cron schedule, e.g. \"0 0 * * *\"")]
    pub cron: Option<String>,

    #[arg(short, long, default_value = ".", help = "Repository root to write the pipeline into")]
    pub output_dir: PathBuf,

    #[arg(short, long, help = "Print the pipeline to stdout instead of writing it")]
    pub print: bool,
}

fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Yellow.on_default().bold())
        .usage(AnsiColor::Cyan.on_default().bold())
        .literal(AnsiColor::Green.on_default().bold())
        .placeholder(AnsiColor::Yellow.on_default())
        .valid(AnsiColor::Blue.on_default().bold())
        .invalid(AnsiColor::Red.on_default().bold())
        .error(AnsiColor::Red.on_default().bold())
}

/// Parse the command-line arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Help footer listing the supported providers
fn get_dynamic_help() -> String {
    let providers_list = Provider::all_names()
        .iter()
        .map(|p| format!("{}", p.bold()))
        .collect::<Vec<_>>()
        .join(" • ");

    format!("\nAvailable LLM Providers: {providers_list}")
}

/// Main function to parse arguments and handle the command
pub async fn main() -> anyhow::Result<()> {
    let cli = parse_args();

    if cli.version {
        ui::print_version(crate_version!());
        return Ok(());
    }

    if cli.log {
        crate::logger::enable_logging();
        let log_file = cli.log_file.as_deref().unwrap_or(LOG_FILE);
        crate::logger::set_log_file(log_file)?;

        if let Ok(config) = crate::config::Config::load() {
            crate::logger::set_verbose_logging(config.performance.verbose_logging);
        }
        log_debug!("Logging to {}", log_file);
    } else {
        crate::logger::disable_logging();
    }

    if cli.quiet {
        ui::set_quiet_mode(true);
    }

    if let Some(command) = cli.command {
        handle_command(command).await
    } else {
        let _ = Cli::parse_from(["testforge", "--help"]);
        Ok(())
    }
}

pub async fn handle_command(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Generate(args) => commands::handle_generate_command(args).await,
        Commands::Pipeline(args) => commands::handle_pipeline_command(args),
        Commands::Config { common, api_key } => commands::handle_config_command(&common, api_key),
        Commands::ListProviders => {
            commands::handle_list_providers_command();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_flags_parse() {
        let cli = Cli::try_parse_from([
            "testforge",
            "generate",
            "Test login",
            "Test checkout",
            "--framework",
            "selenium",
            "--language",
            "TypeScript",
            "--headed",
            "--timeout",
            "5000",
            "--provider",
            "claude",
        ])
        .expect("valid flags");

        let Some(Commands::Generate(args)) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.scenarios, vec!["Test login", "Test checkout"]);
        assert_eq!(args.framework, Some(Framework::Selenium));
        assert_eq!(args.language, Some(Language::TypeScript));
        assert!(args.headed);
        assert_eq!(args.timeout, Some(5000));
        assert_eq!(args.common.provider.as_deref(), Some("anthropic"));
    }

    #[test]
    fn test_pipeline_defaults() {
        let cli = Cli::try_parse_from(["testforge", "pipeline", "--cron", "0 0 * * *"])
            .expect("valid flags");
        let Some(Commands::Pipeline(args)) = cli.command else {
            panic!("expected pipeline");
        };
        assert_eq!(args.ci, "github_actions");
        assert_eq!(args.output_dir, PathBuf::from("."));
        assert!(!args.no_push);
    }

    #[test]
    fn test_unknown_framework_is_rejected() {
        assert!(Cli::try_parse_from(["testforge", "generate", "x", "--framework", "cypress"]).is_err());
    }
}
