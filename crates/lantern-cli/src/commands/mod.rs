//! CLI command definitions and dispatch.

pub mod card;
pub mod task;
pub mod watch;

use std::collections::BTreeMap;
use std::path::PathBuf;

use a2a_lantern::{A2AClient, Discoverer};
use anyhow::Context as _;
use clap::{Parser, Subcommand};
use lantern_core::LanternConfig;
use tokio_util::sync::CancellationToken;

/// Lantern CLI: discover and talk to A2A agents.
#[derive(Parser)]
#[command(
    name = "lantern",
    version,
    about = "Discover, call and watch A2A agents",
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to <config dir>/lantern/config.toml).
    #[arg(long, global = true, env = "LANTERN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Request timeout in seconds (overrides config).
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Extra request header as NAME=VALUE. Repeatable.
    #[arg(long = "header", short = 'H', global = true, value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch, validate and print an agent's card.
    Card(card::CardArgs),

    /// Validate a local agent card file.
    Validate(card::ValidateArgs),

    /// Send a task and wait for the answer.
    Send(task::SendArgs),

    /// Send a task and print its events as they stream in.
    Stream(task::SendArgs),

    /// Show the status of a task.
    Status(task::TaskArgs),

    /// Cancel a running task.
    Cancel(task::TaskArgs),

    /// Register agents and keep watching their health.
    Watch(watch::WatchArgs),
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {raw:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("header name is empty".into());
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Settings resolved from config file, environment and flags.
pub struct Context {
    pub config: LanternConfig,
    pub output: OutputFormat,
}

impl Context {
    pub fn new(mut config: LanternConfig, cli: &Cli) -> Self {
        if let Some(secs) = cli.timeout {
            config.client.timeout_secs = secs;
            config.discovery.timeout_secs = secs;
        }
        config.client.headers.extend(cli.headers.iter().cloned());
        Self {
            config,
            output: cli.output,
        }
    }

    pub fn client(&self) -> anyhow::Result<A2AClient> {
        Ok(A2AClient::new(self.config.client_options()?))
    }

    pub fn discoverer(&self) -> anyhow::Result<Discoverer> {
        Ok(self.config.discoverer()?)
    }

    pub fn headers(&self) -> anyhow::Result<BTreeMap<String, String>> {
        Ok(self.config.request_headers()?)
    }

    pub fn is_json(&self) -> bool {
        self.output == OutputFormat::Json
    }

    /// Print a value as pretty JSON on stdout.
    pub fn print_json<T: serde::Serialize>(&self, value: &T) -> anyhow::Result<()> {
        println!(
            "{}",
            serde_json::to_string_pretty(value).context("failed to render JSON")?
        );
        Ok(())
    }
}

/// A token cancelled on Ctrl-C.
pub fn ctrl_c_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });
    token
}

/// Execute the CLI command.
pub async fn execute(cli: Cli, config: LanternConfig) -> anyhow::Result<()> {
    let ctx = Context::new(config, &cli);
    match cli.command {
        Commands::Card(args) => card::card(&ctx, args).await,
        Commands::Validate(args) => card::validate(&ctx, args),
        Commands::Send(args) => task::send(&ctx, args).await,
        Commands::Stream(args) => task::stream(&ctx, args).await,
        Commands::Status(args) => task::status(&ctx, args).await,
        Commands::Cancel(args) => task::cancel(&ctx, args).await,
        Commands::Watch(args) => watch::execute(&ctx, args).await,
    }
}
