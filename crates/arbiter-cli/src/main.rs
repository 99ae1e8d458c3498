//! Arbiter CLI - render judge prompts, classify replies, run evaluations.
//!
//! Exit codes: 0 when every evaluation passes, 1 when any fails, 2 on error.

mod cli;
mod logging;

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;

use arbiter_core::config::is_json_path;
use arbiter_core::{EvaluationRequest, EvaluationResponse, Evaluator, EvaluatorMode, HarnessConfig};
use arbiter_runtime::{EvaluationHarness, FixedJudge, ProviderRegistry, RuntimeConfig};

use cli::{Cli, Command};

/// A request file holds either one request or a list.
#[derive(Deserialize)]
#[serde(untagged)]
enum RequestFile {
    Many(Vec<EvaluationRequest>),
    One(EvaluationRequest),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init_tracing(cli.verbose) {
        eprintln!("Warning: failed to initialize logging: {}", e);
    }

    let stdout = std::io::stdout();
    match run(&cli, &mut stdout.lock()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Run the command, writing results to `out`; `Ok(false)` means an
/// evaluation failed.
fn run(cli: &Cli, out: &mut impl Write) -> Result<bool> {
    tracing::debug!(command = ?cli.command, mode = ?cli.mode, "Dispatching command");

    match &cli.command {
        Command::Render { config, request } => {
            let evaluator = Evaluator::new(&harness_config(config.as_deref(), cli.mode)?)?;
            for request in load_requests(request)? {
                writeln!(out, "{}", evaluator.render_prompt(&request))?;
            }
            Ok(true)
        }
        Command::Classify { config, reply } => {
            let evaluator = Evaluator::new(&harness_config(config.as_deref(), cli.mode)?)?;
            let response = evaluator.interpret(reply);
            writeln!(out, "{}", serde_json::to_string_pretty(&response)?)?;
            Ok(response.pass)
        }
        Command::Evaluate {
            request,
            config,
            reply,
        } => {
            let runtime = config.as_deref().map(runtime_config).transpose()?;
            let harness = match (runtime, reply) {
                (runtime, Some(reply)) => {
                    let harness_config = match runtime {
                        Some(runtime) => runtime.harness,
                        None => HarnessConfig::new(EvaluatorMode::Relevancy),
                    };
                    EvaluationHarness::new(
                        &with_mode_override(harness_config, cli.mode),
                        Arc::new(FixedJudge::new(reply.clone())),
                    )?
                }
                (Some(mut runtime), None) => {
                    runtime.harness = with_mode_override(runtime.harness, cli.mode);
                    EvaluationHarness::from_runtime_config(
                        &runtime,
                        &ProviderRegistry::with_defaults(),
                    )?
                }
                (None, None) => anyhow::bail!("evaluate needs --config <runtime> or --reply"),
            };

            let requests = load_requests(request)?;
            let responses = evaluate_all(&harness, &requests)?;
            writeln!(out, "{}", serde_json::to_string_pretty(&responses)?)?;
            Ok(responses.iter().all(|r| r.pass))
        }
    }
}

fn evaluate_all(
    harness: &EvaluationHarness,
    requests: &[EvaluationRequest],
) -> Result<Vec<EvaluationResponse>> {
    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime
        .block_on(harness.evaluate_batch(requests))
        .into_iter()
        .enumerate()
        .map(|(i, result)| result.with_context(|| format!("evaluating request {}", i)))
        .collect()
}

/// Load the harness configuration, or start from the mode's defaults.
fn harness_config(path: Option<&Path>, mode: Option<EvaluatorMode>) -> Result<HarnessConfig> {
    let config = match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Loading harness config");
            HarnessConfig::from_file(path)
                .with_context(|| format!("loading harness config {}", path.display()))?
        }
        None => HarnessConfig::new(EvaluatorMode::Relevancy),
    };
    Ok(with_mode_override(config, mode))
}

fn runtime_config(path: &Path) -> Result<RuntimeConfig> {
    tracing::debug!(path = %path.display(), "Loading runtime config");
    RuntimeConfig::from_file(path)
        .with_context(|| format!("loading runtime config {}", path.display()))
}

/// `--mode` wins over the mode in a configuration file.
fn with_mode_override(mut config: HarnessConfig, mode: Option<EvaluatorMode>) -> HarnessConfig {
    if let Some(mode) = mode {
        if mode != config.mode {
            tracing::debug!(from = %config.mode, to = %mode, "Mode overridden from command line");
        }
        config.mode = mode;
    }
    config
}

fn load_requests(path: &Path) -> Result<Vec<EvaluationRequest>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading request file {}", path.display()))?;
    let file: RequestFile = if is_json_path(path) {
        serde_json::from_str(&contents)?
    } else {
        serde_yaml::from_str(&contents)?
    };
    Ok(match file {
        RequestFile::Many(requests) => requests,
        RequestFile::One(request) => vec![request],
    })
}
