//! Command-line client for the Frank iOS automation agent.
//!
//! Sends one request to the agent embedded in the app under test and prints
//! the answer.
//!
//! # Usage
//!
//! ```bash
//! # Print the UI tree
//! frank dump
//!
//! # Print only the accessibility labels in the tree
//! frank dump --labels
//!
//! # Touch a button
//! frank touch "button marked:'Login'"
//!
//! # Send any message to the matched views
//! frank send "textField" "setText:" "hello"
//!
//! # Type into the on-screen keyboard
//! frank type "hello world"
//!
//! # Call a method on the app delegate
//! frank app-exec "changeLocale:" fr_FR
//!
//! # Query the device
//! frank orientation
//! frank accessibility
//!
//! # Talk to a specific device
//! frank --host 192.168.1.20 --port 37265 orientation
//!
//! # Remember the current host/port in ~/.frank/config.json
//! frank --host 192.168.1.20 config --save
//! ```

use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use frank_core::config::FrankConfig;
use frank_core::element::flatten_labelled;
use frank_core::{Device, FrankError, Response, UiQuery};
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Command-line client for the Frank iOS automation agent.
#[derive(Parser)]
#[command(name = "frank")]
#[command(about = "Send automation commands to a Frank agent running in an iOS app")]
#[command(version)]
struct Cli {
    /// Host running the agent (defaults to the saved config)
    #[arg(long, env = "FRANK_HOST")]
    host: Option<String>,

    /// Port the agent listens on (defaults to the saved config)
    #[arg(short, long, env = "FRANK_PORT")]
    port: Option<u16>,

    /// Per-request timeout in seconds
    #[arg(short, long, env = "FRANK_TIMEOUT")]
    timeout: Option<u64>,

    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Print the application's UI tree
    Dump {
        /// Print only views that carry an accessibility label
        #[arg(long)]
        labels: bool,
    },

    /// Type text into the on-screen keyboard
    Type {
        /// Text to type
        text: String,
    },

    /// Check whether accessibility is enabled in the app
    Accessibility,

    /// Print the device orientation
    Orientation,

    /// Invoke a method on the application delegate
    AppExec {
        /// Method name (e.g., "changeLocale:")
        name: String,
        /// Arguments; values that parse as JSON are sent as JSON
        args: Vec<String>,
    },

    /// Send a message to the views matched by a query
    Send {
        /// UIQuery selector text
        query: String,
        /// Method name
        method: String,
        /// Arguments; values that parse as JSON are sent as JSON
        args: Vec<String>,
    },

    /// Touch the views matched by a query
    Touch {
        /// UIQuery selector text
        query: String,
    },

    /// Flash the views matched by a query
    Flash {
        /// UIQuery selector text
        query: String,
    },

    /// Show the effective configuration
    Config {
        /// Persist the effective configuration to ~/.frank/config.json
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

#[derive(Debug)]
enum CliError {
    Connection(String),
    ActionFailed(String),
    Protocol(String),
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Connection(_) => ExitCode::from(2),
            CliError::ActionFailed(_) => ExitCode::from(1),
            CliError::Protocol(_) => ExitCode::from(3),
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Connection(msg) => write!(f, "Connection error: {}", msg),
            CliError::ActionFailed(msg) => write!(f, "Action failed: {}", msg),
            CliError::Protocol(msg) => write!(f, "Protocol error: {}", msg),
        }
    }
}

impl From<FrankError> for CliError {
    fn from(err: FrankError) -> Self {
        match err {
            FrankError::Timeout { .. } | FrankError::Connection { .. } => {
                CliError::Connection(err.to_string())
            }
            FrankError::Argument(_) => CliError::ActionFailed(err.to_string()),
            other => CliError::Protocol(other.to_string()),
        }
    }
}

/// Merge command-line/environment overrides over the saved configuration.
fn effective_config(cli: &Cli) -> FrankConfig {
    let mut config = FrankConfig::load();
    if let Some(host) = &cli.host {
        config.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }
    config
}

/// Interpret a command-line argument as JSON if possible, else as a string.
fn parse_arg(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = effective_config(&cli);
    let device = Device::from_config(&config).with_connect_timeout(CONNECT_TIMEOUT)?;
    debug!(%device, "using device");

    match cli.command {
        Command::Config { save } => {
            if save {
                config
                    .save()
                    .map_err(|e| CliError::ActionFailed(format!("Failed to save config: {}", e)))?;
            }
            if cli.format == OutputFormat::Json {
                let json = serde_json::to_string_pretty(&config)
                    .map_err(|e| CliError::Protocol(e.to_string()))?;
                println!("{}", json);
            } else {
                println!("host: {}", config.host);
                println!("port: {}", config.port);
                println!("name: {}", config.name);
                println!("timeout: {}s", config.timeout_secs);
            }
            Ok(())
        }
        Command::Dump { labels } => {
            if labels {
                let tree = device.dump_tree().await?;
                let labelled = flatten_labelled(&tree);
                if cli.format == OutputFormat::Json {
                    let labels: Vec<_> = labelled.iter().filter_map(|v| v.label.as_deref()).collect();
                    println!("{}", serde_json::json!({ "labels": labels }));
                } else {
                    for view in labelled {
                        println!(
                            "{} ({})",
                            view.label.as_deref().unwrap_or_default(),
                            view.class.as_deref().unwrap_or("?")
                        );
                    }
                }
            } else {
                let raw = device.dump().await?;
                let text = serde_json::to_string_pretty(&raw)
                    .map_err(|e| CliError::Protocol(e.to_string()))?;
                println!("{}", text);
            }
            Ok(())
        }
        Command::Type { ref text } => {
            device.type_into_keyboard(text).await?;
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::json!({ "success": true }));
            }
            Ok(())
        }
        Command::Accessibility => {
            let enabled = device.accessibility_check().await?;
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::json!({ "accessibility_enabled": enabled }));
            } else {
                println!("{}", if enabled { "enabled" } else { "disabled" });
            }
            Ok(())
        }
        Command::Orientation => {
            let orientation = device.orientation().await?;
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::json!({ "orientation": orientation }));
            } else {
                println!("{}", orientation);
            }
            Ok(())
        }
        Command::AppExec { ref name, ref args } => {
            let args = args.iter().map(|a| parse_arg(a)).collect();
            let response = device.app_exec(name, args).await?;
            report(response, cli.format)
        }
        Command::Send { ref query, ref method, ref args } => {
            let args = args.iter().map(|a| parse_arg(a)).collect();
            let view = device.view(UiQuery::new([query.as_str()]));
            let response = view.send_message(method, args).await?;
            report(response, cli.format)
        }
        Command::Touch { ref query } => {
            let response = device.view(UiQuery::new([query.as_str()])).touch().await?;
            report(response, cli.format)
        }
        Command::Flash { ref query } => {
            let response = device.view(UiQuery::new([query.as_str()])).flash().await?;
            report(response, cli.format)
        }
    }
}

/// Print a map/app-exec response. A `Failure` outcome exits with code 1.
fn report(response: Response, format: OutputFormat) -> Result<(), CliError> {
    match response {
        Response::Success(success) => {
            if format == OutputFormat::Json {
                println!("{}", &*success);
            } else if let Some(results) = success.results() {
                println!("{}", results);
            }
            Ok(())
        }
        Response::Failure(failure) => {
            if format == OutputFormat::Json {
                println!("{}", &*failure);
            }
            Err(CliError::ActionFailed(format!(
                "{}{}",
                failure
                    .reason()
                    .map_or_else(|| "agent reported a failure".to_string(), field_text),
                failure.details().map(|d| format!(" ({})", field_text(d))).unwrap_or_default()
            )))
        }
        Response::Other(payload) => {
            println!("{}", payload);
            Ok(())
        }
    }
}

/// Strings print bare; any other JSON value prints as compact JSON.
fn field_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
