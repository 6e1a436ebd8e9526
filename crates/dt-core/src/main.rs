//! Demo Tracker CLI.
//!
//! - `replay`: evaluate a JSONL event log and print a JSON report
//! - `config show` / `config validate`: inspect the resolved tracker config
//!
//! stdout carries command payloads only; logs go to stderr.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use dt_common::{Error, StructuredError};
use dt_config::{load_config, LoadedConfig, ValidationError, CONFIG_SCHEMA_VERSION};
use dt_core::analytics::AttributeFilter;
use dt_core::exit_codes::ExitCode;
use dt_core::logging::{
    event_names, generate_run_id, init_logging, DiagnosticSink, LogConfig, LogEvent, LogFormat,
    Stage, TracingSink,
};
use dt_core::replay::{parse_events, replay, ReplayOptions};
use tracing_subscriber::filter::LevelFilter;

/// Demo Tracker - view/demo analytics over rotating time windows
#[derive(Parser)]
#[command(name = "dt-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to tracker.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    log_level: Option<LevelFilter>,

    /// Log format on stderr (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSONL event log and print analytics as JSON
    Replay(ReplayArgs),

    /// Inspect tracker configuration
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
struct ReplayArgs {
    /// Event log, one JSON object per line
    events: PathBuf,

    /// Number of moving-average points
    #[arg(long, default_value_t = 3)]
    duration: usize,

    /// Extra filtered view average, as key=true|false
    #[arg(long, value_parser = parse_query)]
    query: Option<AttributeFilter>,

    /// Evaluation instant (RFC 3339), not before the latest event; defaults
    /// to the latest event
    #[arg(long, value_parser = parse_at)]
    at: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the effective configuration and where it came from
    Show,

    /// Validate a config file (or the resolved one)
    Validate {
        /// File to validate instead of the resolved config
        path: Option<PathBuf>,
    },
}

fn parse_query(s: &str) -> Result<AttributeFilter, String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    if key.is_empty() {
        return Err("attribute key is empty".to_string());
    }
    let value = match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => true,
        "false" | "0" | "no" => false,
        other => return Err(format!("expected true or false, got '{}'", other)),
    };
    Ok(AttributeFilter::new(key, value))
}

fn parse_at(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 timestamp '{}': {}", s, e))
}

fn main() -> std::process::ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            let code = if err.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            return code.into();
        }
    };

    let log_config = LogConfig::from_env(cli.global.log_level, cli.global.log_format);
    init_logging(&log_config);
    let sink: Arc<dyn DiagnosticSink> = Arc::new(TracingSink::new().with_run_id(generate_run_id()));

    let exit_code = match &cli.command {
        Commands::Replay(args) => run_replay(&cli.global, args, sink),
        Commands::Config(args) => match &args.command {
            ConfigCommands::Show => run_config_show(&cli.global, sink.as_ref()),
            ConfigCommands::Validate { path } => {
                run_config_validate(&cli.global, path.as_deref(), sink.as_ref())
            }
        },
    };
    exit_code.into()
}

// ============================================================================
// Error output
// ============================================================================

fn print_error(structured: &StructuredError) {
    let response = serde_json::json!({
        "schema_version": CONFIG_SCHEMA_VERSION,
        "generated_at": Utc::now().to_rfc3339(),
        "status": "error",
        "error": structured,
    });
    match serde_json::to_string_pretty(&response) {
        Ok(s) => eprintln!("{}", s),
        Err(_) => eprintln!("{}", structured.to_json()),
    }
}

fn output_error(err: &Error) -> ExitCode {
    print_error(&StructuredError::from(err));
    ExitCode::from_error(err)
}

fn output_config_error(err: &ValidationError, sink: &dyn DiagnosticSink) -> ExitCode {
    sink.record(
        LogEvent::error(event_names::CONFIG_ERROR, Stage::Init, err.to_string())
            .with_field("code", err.code()),
    );
    let structured = StructuredError::from(&Error::InvalidConfig(err.to_string()))
        .with_context("validation_code", err.code());
    print_error(&structured);
    match err {
        ValidationError::IoError(_) => ExitCode::IoError,
        _ => ExitCode::ConfigError,
    }
}

fn print_json(value: &impl serde::Serialize) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(s) => {
            println!("{}", s);
            ExitCode::Clean
        }
        Err(e) => output_error(&Error::Json(e)),
    }
}

fn load(global: &GlobalOpts, sink: &dyn DiagnosticSink) -> Result<LoadedConfig, ExitCode> {
    match load_config(global.config.as_deref()) {
        Ok(loaded) => {
            let event = match &loaded.paths.tracker {
                Some(path) => LogEvent::info(event_names::CONFIG_LOADED, Stage::Init, "config loaded")
                    .with_field("path", path.display().to_string())
                    .with_field("source", loaded.paths.tracker_source.to_string())
                    .with_field("hash", &loaded.snapshot.config_hash),
                None => LogEvent::debug(
                    event_names::CONFIG_DEFAULT_USED,
                    Stage::Init,
                    "no tracker.json found, using defaults",
                ),
            };
            sink.record(event);
            Ok(loaded)
        }
        Err(e) => Err(output_config_error(&e, sink)),
    }
}

// ============================================================================
// Commands
// ============================================================================

fn run_replay(global: &GlobalOpts, args: &ReplayArgs, sink: Arc<dyn DiagnosticSink>) -> ExitCode {
    let loaded = match load(global, sink.as_ref()) {
        Ok(l) => l,
        Err(code) => return code,
    };

    sink.record(
        LogEvent::info(event_names::RUN_STARTED, Stage::Replay, "replaying event log")
            .with_field("events", args.events.display().to_string())
            .with_field("duration", args.duration),
    );

    let events = match File::open(&args.events)
        .map_err(Error::from)
        .and_then(|f| parse_events(BufReader::new(f)))
    {
        Ok(events) => events,
        Err(e) => return output_error(&e),
    };

    let options = ReplayOptions {
        duration: args.duration,
        query: args.query.clone(),
        at: args.at,
    };
    let report = match replay(&loaded.tracker, &events, &options, sink.clone()) {
        Ok(report) => report,
        Err(e) => return output_error(&e),
    };

    sink.record(
        LogEvent::info(event_names::RUN_FINISHED, Stage::Replay, "replay finished")
            .with_field("events", events.len())
            .with_field("no_signal", report.no_signal()),
    );

    match print_json(&report) {
        ExitCode::Clean if report.no_signal() => ExitCode::NoSignal,
        code => code,
    }
}

fn run_config_show(global: &GlobalOpts, sink: &dyn DiagnosticSink) -> ExitCode {
    let loaded = match load(global, sink) {
        Ok(l) => l,
        Err(code) => return code,
    };
    print_json(&serde_json::json!({
        "schema_version": CONFIG_SCHEMA_VERSION,
        "generated_at": Utc::now().to_rfc3339(),
        "source": loaded.paths.tracker_source.to_string(),
        "using_defaults": loaded.paths.tracker.is_none(),
        "snapshot": &loaded.snapshot,
        "tracker": &loaded.tracker,
    }))
}

fn run_config_validate(
    global: &GlobalOpts,
    path: Option<&Path>,
    sink: &dyn DiagnosticSink,
) -> ExitCode {
    if let Some(p) = path {
        if !p.exists() {
            return output_config_error(
                &ValidationError::IoError(format!("{} does not exist", p.display())),
                sink,
            );
        }
    }
    let opts = GlobalOpts {
        config: path.map(Path::to_path_buf).or_else(|| global.config.clone()),
        log_level: global.log_level,
        log_format: global.log_format,
    };
    let loaded = match load(&opts, sink) {
        Ok(l) => l,
        Err(code) => return code,
    };
    print_json(&serde_json::json!({
        "schema_version": CONFIG_SCHEMA_VERSION,
        "generated_at": Utc::now().to_rfc3339(),
        "status": "valid",
        "path": loaded.paths.tracker.as_ref().map(|p| p.display().to_string()),
        "using_defaults": loaded.paths.tracker.is_none(),
        "config_hash": loaded.snapshot.config_hash,
    }))
}
