//! `lantern watch`: discover agents, then keep their registry entries
//! healthy until interrupted.

use std::sync::Arc;

use chrono::Utc;
use clap::Args;
use colored::Colorize;
use futures::future::join_all;
use lantern_core::{
    Agent, AgentRegistry, AgentStatus, CardProbe, HealthMonitor, RegistryConfig,
};

use super::{ctrl_c_token, Context};

#[derive(Args)]
pub struct WatchArgs {
    /// Agent base URLs to discover.
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Only show online agents with this capability (e.g. "streaming").
    #[arg(long)]
    pub capability: Option<String>,
}

pub async fn execute(ctx: &Context, args: WatchArgs) -> anyhow::Result<()> {
    let discoverer = ctx.discoverer()?;
    let registry = Arc::new(AgentRegistry::new(RegistryConfig::from(&ctx.config.registry)));
    let cancel = ctrl_c_token();

    let discoveries = args.urls.iter().map(|url| {
        let discoverer = &discoverer;
        let cancel = &cancel;
        async move { (url, discoverer.discover(cancel, url).await) }
    });
    for (url, result) in join_all(discoveries).await {
        match result {
            Ok(card) => {
                let agent = Agent::from_card(url.clone(), card);
                let name = agent.card.qualified_name();
                registry.register(agent)?;
                println!("  {} {:<38} {}", "✓".green().bold(), name, url.dimmed());
            }
            Err(e) => println!("  {} {:<38} {}", "✗".red().bold(), url, e.to_string().red()),
        }
    }
    if cancel.is_cancelled() {
        return Ok(());
    }

    let config = registry.config().clone();
    let cleanup = registry.clone().spawn_cleanup(cancel.clone());
    let monitor = Arc::new(HealthMonitor::new(
        registry.clone(),
        CardProbe::new(discoverer.clone()),
        config.health_check_interval,
    ));
    let health = monitor.spawn(cancel.clone());

    let mut ticker = tokio::time::interval(config.health_check_interval);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => render(ctx, &registry, args.capability.as_deref())?,
        }
    }

    cleanup.await?;
    health.await?;
    Ok(())
}

fn render(ctx: &Context, registry: &AgentRegistry, capability: Option<&str>) -> anyhow::Result<()> {
    let agents = match capability {
        Some(capability) => registry.find_by_capability(capability),
        None => registry.list(),
    };

    if ctx.is_json() {
        println!("{}", serde_json::to_string(&agents)?);
        return Ok(());
    }

    println!(
        "\n  {}  {}",
        "Registry".bold(),
        Utc::now().format("%H:%M:%S").to_string().dimmed()
    );
    println!(
        "  {:<24} {:<12} {:<30} {}",
        "AGENT".bold(),
        "STATUS".bold(),
        "CAPABILITIES".bold(),
        "LAST SEEN".bold()
    );
    println!("  {}", "─".repeat(80).dimmed());
    if agents.is_empty() {
        println!("  (no agents)");
    }
    for agent in &agents {
        let seen = Utc::now().signed_duration_since(agent.last_seen).num_seconds();
        println!(
            "  {:<24} {:<12} {:<30} {}",
            agent.id,
            colored_status(agent.status),
            agent.card.capabilities.enabled().join(","),
            format!("{seen}s ago").dimmed()
        );
    }
    Ok(())
}

fn colored_status(status: AgentStatus) -> colored::ColoredString {
    let label = status.to_string();
    match status {
        AgentStatus::Online => label.green(),
        AgentStatus::Offline => label.red(),
        AgentStatus::Error => label.yellow(),
        AgentStatus::Discovering => label.dimmed(),
    }
}
