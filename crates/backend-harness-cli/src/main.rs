// crates/backend-harness-cli/src/main.rs
// ============================================================================
// Module: Backend Harness CLI Entry Point
// Description: Command dispatcher for backend resolution and constraint checks.
// Purpose: Expose runner argument resolution and flag gating from a shell.
// Dependencies: clap, backend-harness-*, serde, serde_json, thiserror, tracing.
// ============================================================================

//! ## Overview
//! The `backend-harness` CLI performs the startup steps of a test run in
//! isolation: it resolves runner arguments to a backend and flag overrides,
//! and evaluates constraint sets against a configured flag environment.
//! Results are written to stdout as JSON lines; logs go to stderr.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use backend_harness_config::HarnessConfig;
use backend_harness_config::LogLevel;
use backend_harness_core::ConstraintSet;
use backend_harness_core::FlagEnvironment;
use backend_harness_core::FlagMap;
use backend_harness_core::parse_flag_assignments;
use backend_harness_core::satisfies;
use backend_harness_registry::BackendRegistry;
use backend_harness_registry::DEFAULT_BACKEND_PRIORITY;
use backend_harness_registry::TestKernelBackend;
use backend_harness_registry::parse_flag_object;
use backend_harness_registry::parse_run_args;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable holding `NAME:VALUE` flag overrides.
const FLAGS_ENV: &str = "BACKEND_HARNESS_FLAGS";
/// Environment variable consulted for log filters.
const LOG_ENV: &str = "RUST_LOG";
/// Backend registered when the config names none.
const FALLBACK_BACKEND: &str = "cpu";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "backend-harness", version, disable_help_subcommand = true)]
struct Cli {
    /// Path to `backend-harness.toml` (overrides `BACKEND_HARNESS_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Log level (overrides `RUST_LOG` and the config file).
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    log_level: Option<LogLevelArg>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve runner arguments to a backend and flag overrides.
    Resolve(ResolveCommand),
    /// Evaluate a constraint set against the configured flag environment.
    Check(CheckCommand),
    /// List configured backends in priority order.
    Backends,
}

/// Arguments for `resolve`.
#[derive(Args, Debug)]
struct ResolveCommand {
    /// Raw runner arguments, passed after `--`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "RUNNER_ARGS")]
    runner_args: Vec<String>,
}

/// Arguments for `check`.
#[derive(Args, Debug)]
struct CheckCommand {
    /// JSON object of required flag values.
    #[arg(long, value_name = "JSON")]
    constraints: String,
    /// JSON object of flag overrides applied before evaluation.
    #[arg(long, value_name = "JSON")]
    flags: Option<String>,
}

/// Log level selection.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum LogLevelArg {
    /// Errors only.
    Error,
    /// Warnings and errors.
    Warn,
    /// Informational events.
    Info,
    /// Debug events.
    Debug,
    /// Everything.
    Trace,
}

impl From<LogLevelArg> for LogLevel {
    fn from(value: LogLevelArg) -> Self {
        match value {
            LogLevelArg::Error => Self::Error,
            LogLevelArg::Warn => Self::Warn,
            LogLevelArg::Info => Self::Info,
            LogLevelArg::Debug => Self::Debug,
            LogLevelArg::Trace => Self::Trace,
        }
    }
}

// ============================================================================
// SECTION: Output Types
// ============================================================================

/// Where the resolved backend came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum ResolutionSource {
    /// `--backend` in the runner arguments.
    Args,
    /// `run.default_backend` in the config.
    Config,
    /// Highest-priority registered backend.
    Priority,
}

/// Output of `resolve`.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct Resolution {
    /// Resolved backend name.
    backend: String,
    /// Resolution source.
    source: ResolutionSource,
    /// Flag overrides for the run.
    flags: FlagMap,
}

/// Output of `check`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
struct CheckReport {
    /// Whether every constraint held.
    satisfied: bool,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let config = HarnessConfig::load_or_default(cli.config.as_deref())
        .map_err(|err| CliError::new(err.to_string()))?;
    init_logging(&log_filter(
        cli.log_level,
        std::env::var(LOG_ENV).ok().as_deref(),
        config.logging.level,
    ));

    match cli.command {
        Commands::Resolve(command) => command_resolve(&config, &command),
        Commands::Check(command) => {
            let env_flags = std::env::var(FLAGS_ENV).ok();
            command_check(&config, &command, env_flags.as_deref())
        }
        Commands::Backends => command_backends(&config),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Resolves runner arguments and prints the resolution.
fn command_resolve(config: &HarnessConfig, command: &ResolveCommand) -> CliResult<ExitCode> {
    let resolution = resolve(config, &command.runner_args)?;
    info!(backend = %resolution.backend, "backend resolved");
    write_json_line(&resolution)?;
    Ok(ExitCode::SUCCESS)
}

/// Evaluates constraints and prints the report.
fn command_check(
    config: &HarnessConfig,
    command: &CheckCommand,
    env_flags: Option<&str>,
) -> CliResult<ExitCode> {
    let report = check(config, command, env_flags)?;
    write_json_line(&report)?;
    Ok(if report.satisfied { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Prints configured backend names in priority order.
fn command_backends(config: &HarnessConfig) -> CliResult<ExitCode> {
    let registry = build_registry(config)?;
    for name in registry.names() {
        write_stdout_line(&name)?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Builds a registry with a test backend per configured backend.
fn build_registry(config: &HarnessConfig) -> CliResult<BackendRegistry> {
    let registry = BackendRegistry::new();
    if config.backends.is_empty() {
        registry
            .register_with_priority(
                FALLBACK_BACKEND,
                TestKernelBackend::shared_factory(FALLBACK_BACKEND),
                DEFAULT_BACKEND_PRIORITY,
            )
            .map_err(|err| CliError::new(err.to_string()))?;
        return Ok(registry);
    }
    for backend in &config.backends {
        registry
            .register_with_priority(
                backend.name.as_str(),
                TestKernelBackend::shared_factory(backend.name.as_str()),
                backend.priority,
            )
            .map_err(|err| CliError::new(err.to_string()))?;
    }
    Ok(registry)
}

/// Resolves the backend for a run from runner arguments and config.
fn resolve(config: &HarnessConfig, runner_args: &[String]) -> CliResult<Resolution> {
    let registry = build_registry(config)?;
    if let Some(parsed) =
        parse_run_args(runner_args, &registry).map_err(|err| CliError::new(err.to_string()))?
    {
        return Ok(Resolution {
            backend: parsed.name,
            source: ResolutionSource::Args,
            flags: parsed.flags,
        });
    }
    if let Some(default_backend) = &config.run.default_backend {
        debug!(backend = %default_backend, "no backend override; using config default");
        return Ok(Resolution {
            backend: default_backend.clone(),
            source: ResolutionSource::Config,
            flags: FlagMap::new(),
        });
    }
    let backend = registry
        .best_backend()
        .ok_or_else(|| CliError::new("no backend available".to_string()))?;
    Ok(Resolution {
        backend,
        source: ResolutionSource::Priority,
        flags: FlagMap::new(),
    })
}

// ============================================================================
// SECTION: Constraint Checks
// ============================================================================

/// Seeds a flag environment from config defaults and overrides.
fn seed_environment(
    config: &HarnessConfig,
    env_flags: Option<&str>,
    cli_flags: Option<&str>,
) -> CliResult<FlagEnvironment> {
    let env = FlagEnvironment::new();
    for (name, value) in &config.flags {
        let value = value.clone();
        env.register_flag(name.as_str(), move || value.clone());
    }
    if let Some(assignments) = env_flags {
        let overrides = parse_flag_assignments(assignments)
            .map_err(|err| CliError::new(format!("{FLAGS_ENV}: {err}")))?;
        env.set_flags(&overrides);
    }
    if let Some(raw) = cli_flags {
        let overrides = parse_flag_object(raw).map_err(|err| CliError::new(err.to_string()))?;
        env.set_flags(&overrides);
    }
    Ok(env)
}

/// Evaluates the command's constraints against the seeded environment.
fn check(
    config: &HarnessConfig,
    command: &CheckCommand,
    env_flags: Option<&str>,
) -> CliResult<CheckReport> {
    let raw: Value = serde_json::from_str(&command.constraints)
        .map_err(|err| CliError::new(format!("invalid constraints: {err}")))?;
    let constraints = ConstraintSet::from_json(&raw).ok_or_else(|| {
        CliError::new("constraints must be a JSON object of scalar values".to_string())
    })?;
    let env = seed_environment(config, env_flags, command.flags.as_deref())?;
    Ok(CheckReport {
        satisfied: satisfies(&env, &constraints),
    })
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Chooses the log filter directive: CLI level, then `RUST_LOG`, then config.
fn log_filter(cli_level: Option<LogLevelArg>, env_filter: Option<&str>, config: LogLevel) -> String {
    if let Some(level) = cli_level {
        return LogLevel::from(level).as_str().to_string();
    }
    match env_filter {
        Some(filter) if !filter.trim().is_empty() => filter.to_string(),
        _ => config.as_str().to_string(),
    }
}

/// Installs the stderr log subscriber.
fn init_logging(directive: &str) {
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
        .map_err(|err| CliError::new(format!("failed to write stdout: {err}")))
}

/// Writes a value to stdout as a JSON line.
fn write_json_line<T: Serialize>(value: &T) -> CliResult<()> {
    let line = serde_json::to_string(value)
        .map_err(|err| CliError::new(format!("failed to serialize output: {err}")))?;
    write_stdout_line(&line)
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
