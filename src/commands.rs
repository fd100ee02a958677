use crate::cli::{GenerateArgs, PipelineArgs};
use crate::common::CommonParams;
use crate::config::Config;
use crate::generation::{
    BatchResult, GenerationRequest, RetryPolicy, TargetContext, TestGenerator,
};
use crate::pipeline::{CiProvider, PipelineSpec, render_pipeline};
use crate::providers::Provider;
use crate::ui;
use crate::{log_debug, log_warn};
use anyhow::{Context, Result, anyhow};
use colored::Colorize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Merge positional scenarios with those read from `file`.
///
/// File lines are trimmed; blank lines and `#` comments are skipped.
pub fn collect_scenarios(arguments: &[String], file: Option<&Path>) -> Result<Vec<String>> {
    let mut scenarios = arguments.to_vec();
    if let Some(path) = file {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenarios from {}", path.display()))?;
        scenarios.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string),
        );
    }
    Ok(scenarios)
}

/// Write every completed item into `dir`, returning the paths written.
///
/// Two scenarios that slug to the same file name get `_2`, `_3`... suffixes.
pub fn write_generated_tests(batch: &BatchResult, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut used = HashSet::new();
    let mut written = Vec::new();
    for item in batch.items.iter().filter(|item| item.is_completed()) {
        let file_name = unique_file_name(&item.file_name, &mut used);
        let path = dir.join(&file_name);
        fs::write(&path, &item.code)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log_debug!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

fn unique_file_name(file_name: &str, used: &mut HashSet<String>) -> String {
    if used.insert(file_name.to_string()) {
        return file_name.to_string();
    }

    let (stem, extension) = file_name.rsplit_once('.').unwrap_or((file_name, ""));
    (2..)
        .map(|n| {
            if extension.is_empty() {
                format!("{stem}_{n}")
            } else {
                format!("{stem}_{n}.{extension}")
            }
        })
        .find(|candidate| used.insert(candidate.clone()))
        .unwrap_or_else(|| file_name.to_string())
}

fn build_request(
    args: &GenerateArgs,
    config: &Config,
    scenarios: Vec<String>,
) -> Result<GenerationRequest> {
    let provider = args.common.provider_config(config)?;

    let mut options = config.generation_options();
    if let Some(browser) = args.browser {
        options.browser = browser;
    }
    if args.headed {
        options.headless = false;
    }
    options.include_setup = !args.no_setup;
    options.include_teardown = !args.no_teardown;
    if let Some(timeout) = args.timeout {
        options.timeout_ms = timeout;
    }
    if let Some(secs) = args.request_timeout {
        options.request_timeout_secs = secs;
    }

    Ok(GenerationRequest::new(
        provider,
        args.framework.unwrap_or(config.generation.framework),
        args.language.unwrap_or(config.generation.language),
        scenarios,
    )
    .with_options(options)
    .with_target(TargetContext {
        website_url: args.website_url.clone(),
        base_url: args.base_url.clone(),
    }))
}

/// Handle the `generate` command
pub async fn handle_generate_command(args: GenerateArgs) -> Result<()> {
    let config = Config::load()?;
    let scenarios = collect_scenarios(&args.scenarios, args.file.as_deref())?;
    if scenarios.is_empty() {
        return Err(anyhow!(
            "No scenarios given. Pass them as arguments or with --file."
        ));
    }

    let request = build_request(&args, &config, scenarios)?;
    let retry = args.retries.map_or_else(
        || config.retry_policy(),
        |retries| RetryPolicy::attempts(retries.saturating_add(1)),
    );

    let progress = Arc::new(ui::BatchProgress::new(request.effective_scenarios().count()));
    let generator = TestGenerator::with_http_backend()
        .with_concurrency(args.concurrency.unwrap_or(config.generation.concurrency))
        .with_retry(retry)
        .with_observer(progress.clone());

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let batch = generator.generate_with_cancellation(&request, &cancel).await;
    progress.finish();
    let batch = batch?;

    if args.print {
        for item in batch.items.iter().filter(|item| item.is_completed()) {
            println!("{}", format!("// {}", item.file_name).dimmed());
            println!("{}", item.code);
        }
    } else {
        let output_dir = args
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.generation.output_dir));
        let written = write_generated_tests(&batch, &output_dir)?;
        if !written.is_empty() {
            ui::print_success(&format!(
                "Wrote {} test file(s) to {}",
                written.len(),
                output_dir.display()
            ));
        }
    }

    ui::print_info(&ui::format_batch_summary(&batch));
    if batch.cancelled {
        log_warn!("Generation cancelled after {} item(s)", batch.total());
    }
    if batch.successful == 0 && batch.failed > 0 {
        return Err(anyhow!("No tests were generated"));
    }
    Ok(())
}

/// Handle the `pipeline` command
pub fn handle_pipeline_command(args: PipelineArgs) -> Result<()> {
    let ci: CiProvider = args.ci.parse()?;

    let defaults = Config::load().map(|c| c.generation).unwrap_or_default();
    let framework = args
        .framework
        .unwrap_or_else(|| defaults.framework.to_string());
    let language = args
        .language
        .unwrap_or_else(|| defaults.language.to_string());

    let spec = PipelineSpec::new(ci, framework, language)
        .with_push(!args.no_push)
        .with_pull_request(!args.no_pull_request)
        .with_cron(args.cron.unwrap_or_default());
    let document = render_pipeline(&spec)?;

    if args.print {
        print!("{}", document.content);
        return Ok(());
    }

    let path = document.target_path(&args.output_dir);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&path, &document.content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    ui::print_success(&format!(
        "{} pipeline written to {}",
        ci.display_name(),
        path.display()
    ));
    Ok(())
}

/// Show an API key as its last four characters
fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{tail}", "*".repeat(8))
}

/// Handle the `config` command
pub fn handle_config_command(common: &CommonParams, api_key: Option<String>) -> Result<()> {
    let mut config = Config::load()?;
    let changed = common.provider.is_some()
        || common.model.is_some()
        || common.endpoint.is_some()
        || api_key.is_some();

    if changed {
        config.update(
            common.provider.clone(),
            api_key,
            common.model.clone(),
            common.endpoint.clone(),
        )?;
        config.save()?;
        ui::print_success("Configuration updated successfully.");
    }

    print_configuration(&config);
    Ok(())
}

fn print_configuration(config: &Config) {
    println!("{}", "Current configuration".bright_yellow().bold());
    println!("  {} {}", "Default provider:".cyan(), config.default_provider.green());

    let mut names: Vec<&String> = config.providers.keys().collect();
    names.sort();
    for name in names {
        let Some(settings) = config.providers.get(name) else {
            continue;
        };
        println!("\n  {}", name.bright_yellow().bold());
        println!("    {} {}", "Model:".cyan(), settings.model);
        if let Some(endpoint) = &settings.endpoint {
            println!("    {} {}", "Endpoint:".cyan(), endpoint);
        }
        if !settings.api_key.is_empty() {
            println!("    {} {}", "API key:".cyan(), mask_api_key(&settings.api_key));
        }
    }

    let generation = &config.generation;
    println!("\n  {}", "Generation defaults".bright_yellow().bold());
    println!(
        "    {} {} / {} / {}",
        "Target:".cyan(),
        generation.framework,
        generation.language,
        generation.browser
    );
    println!(
        "    {} {} ms (provider calls {} s)",
        "Timeout:".cyan(),
        generation.timeout_ms,
        generation.request_timeout_secs
    );
    println!(
        "    {} {} in flight, {} retries",
        "Calls:".cyan(),
        generation.concurrency,
        generation.max_retries
    );
}

/// Handle the `list-providers` command
pub fn handle_list_providers_command() {
    println!("{}", "Supported LLM providers".bright_yellow().bold());
    for provider in Provider::ALL {
        let key = provider
            .api_key_env()
            .map_or_else(|| "no key needed".to_string(), |var| format!("key: ${var}"));
        println!(
            "  {:<10} {:<16} {} {}",
            provider.name().green().bold(),
            provider.display_name(),
            provider.default_model().cyan(),
            format!("({}, {key})", provider.default_endpoint()).dimmed()
        );
    }
}
