//! CLI commands for exercising the pipeline.
//!
//! Each gate command runs against a fresh [`MemoryHost`] and prints the
//! calls the dispatch function received, so the wire output can be
//! inspected without a browser.

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing::debug;
use tr_common::{Error, OutputFormat, PropBag, PropValue, Result};
use tr_config::{resolve_config, ConfigPaths, ConfigSnapshot, TrackerConfig};

use crate::exit_codes::ExitCode;
use crate::gate::{GtagCall, MemoryHost, PageLocation, TransportGate};
use crate::grammar::map_event_name;
use crate::logging::LogFormat;
use crate::sanitize::{sanitize_params, sanitize_user_properties, DEFAULT_MAX_PARAMS};

const STDIN_MARKER: &str = "-";

/// Normalize analytics events into the vendor wire format.
#[derive(Parser, Debug)]
#[command(name = "tr-core", version, about)]
pub struct Cli {
    /// Measurement id (overrides TR_MEASUREMENT_ID and the config file)
    #[arg(long, global = true)]
    pub measurement_id: Option<String>,

    /// Config file (default: $XDG_CONFIG_HOME/track-relay/config.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log format on stderr
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Page context for gate commands.
#[derive(Args, Debug, Clone)]
pub struct PageArgs {
    /// Current page URL
    #[arg(long, default_value = "http://localhost/")]
    pub url: String,

    /// Current document title
    #[arg(long, default_value = "")]
    pub title: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sanitize a property bag into event parameters
    Sanitize {
        /// Properties as a JSON object, or "-" for stdin
        props: String,
        /// Maximum number of parameters
        #[arg(long, default_value_t = DEFAULT_MAX_PARAMS)]
        max_params: usize,
    },
    /// Sanitize a property bag into user properties
    UserProps {
        /// Properties as a JSON object, or "-" for stdin
        props: String,
    },
    /// Map an event name (alias, snake_case, validate)
    EventName {
        name: String,
    },
    /// Track an event and print the dispatched calls
    Track {
        name: String,
        /// Properties as a JSON object, or "-" for stdin
        #[arg(default_value = "{}")]
        props: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Record a page view and print the dispatched calls
    Pageview {
        /// Properties as a JSON object, or "-" for stdin
        #[arg(default_value = "{}")]
        props: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Set the user id and/or user properties
    Identify {
        #[arg(long)]
        user_id: Option<String>,
        /// User properties as a JSON object
        #[arg(long)]
        props: Option<String>,
    },
    /// Clear user id and user properties
    Reset,
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the resolved configuration
    Show,
}

/// Run the command dispatcher.
pub fn run(cli: &Cli) -> ExitCode {
    match execute(cli) {
        Ok(code) => code,
        Err(e) => {
            report_error(cli.format, &e);
            ExitCode::from(&e)
        }
    }
}

fn execute(cli: &Cli) -> Result<ExitCode> {
    let format = cli.format;
    match &cli.command {
        Commands::Sanitize { props, max_params } => {
            let bag = parse_props(props)?;
            let params = sanitize_params(&bag, *max_params);
            let lines = params.iter().map(|(k, v)| format!("{k}={v}"));
            emit(format, &params, lines)?;
            Ok(ExitCode::Clean)
        }
        Commands::UserProps { props } => {
            let bag = parse_props(props)?;
            let sanitized = sanitize_user_properties(&bag);
            let lines = sanitized.iter().map(|(k, v)| format!("{k}={v}"));
            emit(format, &sanitized, lines)?;
            Ok(if sanitized.is_empty() {
                ExitCode::Dropped
            } else {
                ExitCode::Clean
            })
        }
        Commands::EventName { name } => match map_event_name(name) {
            Some(mapped) => {
                emit(format, &mapped, std::iter::once(mapped.clone()))?;
                Ok(ExitCode::Clean)
            }
            None => {
                debug!(event = %name, "event name rejected");
                Ok(ExitCode::Dropped)
            }
        },
        Commands::Track { name, props, page } => {
            let bag = parse_props(props)?;
            let mut gate = build_gate(cli, Some(page))?;
            gate.track(name, &bag);
            finish(format, gate, "event")
        }
        Commands::Pageview { props, page } => {
            let bag = parse_props(props)?;
            let mut gate = build_gate(cli, Some(page))?;
            gate.pageview(&bag);
            finish(format, gate, "event")
        }
        Commands::Identify { user_id, props } => {
            let mut gate = build_gate(cli, None)?;
            if user_id.is_none() && props.is_none() {
                return Err(Error::InvalidInput(
                    "identify needs --user-id and/or --props".to_string(),
                ));
            }
            if let Some(id) = user_id {
                gate.set_user_id(Some(id.as_str()));
            }
            if let Some(raw) = props {
                gate.set_user_properties(&parse_props(raw)?);
            }
            finish(format, gate, "set")
        }
        Commands::Reset => {
            let mut gate = build_gate(cli, None)?;
            gate.reset();
            finish(format, gate, "set")
        }
        Commands::Config {
            command: ConfigCommands::Show,
        } => {
            let (_, snapshot) = resolve(cli)?;
            let lines = snapshot_lines(&snapshot);
            emit(format, &snapshot, lines.into_iter())?;
            Ok(ExitCode::Clean)
        }
    }
}

fn resolve(cli: &Cli) -> Result<(TrackerConfig, ConfigSnapshot)> {
    resolve_config(
        cli.measurement_id.as_deref(),
        &ConfigPaths::new(cli.config.clone()),
    )
}

fn build_gate(cli: &Cli, page: Option<&PageArgs>) -> Result<TransportGate<MemoryHost>> {
    let (config, _) = resolve(cli)?;
    let mut host = MemoryHost::new();
    if let Some(page) = page {
        host = host
            .with_location(PageLocation::parse(&page.url)?)
            .with_title(page.title.clone());
    }
    Ok(TransportGate::new(config, host))
}

/// Print the backing queue; `Dropped` unless a call of `command` was sent.
fn finish(
    format: OutputFormat,
    gate: TransportGate<MemoryHost>,
    command: &str,
) -> Result<ExitCode> {
    let calls = gate.into_host().take_calls();
    let lines = calls
        .iter()
        .map(|call| serde_json::to_string(call).unwrap_or_default())
        .collect::<Vec<_>>();
    emit(format, &calls, lines.into_iter())?;
    let sent = calls.iter().any(|call: &GtagCall| call.command() == command);
    Ok(if sent { ExitCode::Clean } else { ExitCode::Dropped })
}

/// Parse a props argument into a bag; `-` reads stdin.
pub fn parse_props(raw: &str) -> Result<PropBag> {
    let text = if raw == STDIN_MARKER {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        raw.to_string()
    };
    let value: PropValue =
        serde_json::from_str(&text).map_err(|e| Error::InvalidInput(format!("props: {e}")))?;
    match value {
        PropValue::PlainMap(bag) => Ok(bag),
        other => Err(Error::NotAnObject(other.kind())),
    }
}

fn emit<T: Serialize>(
    format: OutputFormat,
    value: &T,
    text_lines: impl Iterator<Item = String>,
) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputFormat::Text => {
            for line in text_lines {
                writeln!(out, "{line}")?;
            }
        }
    }
    Ok(())
}

fn snapshot_lines(snapshot: &ConfigSnapshot) -> Vec<String> {
    vec![
        format!("source={}", snapshot.source),
        format!(
            "measurement_id={}",
            snapshot.measurement_id.as_deref().unwrap_or("-")
        ),
        format!("loader_src={}", snapshot.loader_src.as_deref().unwrap_or("-")),
        format!("script_id={}", snapshot.script_id),
    ]
}

fn report_error(format: OutputFormat, err: &Error) {
    match format {
        OutputFormat::Json => {
            let body = serde_json::json!({
                "error": err.to_string(),
                "code": err.code(),
            });
            eprintln!("{body}");
        }
        OutputFormat::Text => eprintln!("error: {err}"),
    }
}
