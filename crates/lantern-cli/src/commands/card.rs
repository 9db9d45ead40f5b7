//! `lantern card` / `lantern validate`: inspect agent cards.

use std::path::PathBuf;

use a2a_lantern::{build_discovery_url, AgentCard, Discoverer};
use anyhow::Context as _;
use clap::Args;
use colored::Colorize;

use super::{ctrl_c_token, Context};

#[derive(Args)]
pub struct CardArgs {
    /// Agent base URL (scheme optional, e.g. "localhost:8083").
    pub url: String,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Path to an agent card JSON document.
    pub file: PathBuf,
}

pub async fn card(ctx: &Context, args: CardArgs) -> anyhow::Result<()> {
    let discoverer = ctx.discoverer()?;
    let cancel = ctrl_c_token();

    if !ctx.is_json() {
        println!(
            "\n  {} Fetching {}...",
            "→".dimmed(),
            build_discovery_url(&args.url).cyan()
        );
    }

    let card = discoverer
        .discover(&cancel, &args.url)
        .await
        .with_context(|| format!("discovery of {} failed", args.url))?;

    if ctx.is_json() {
        return ctx.print_json(&card);
    }
    print_card(&card);
    Ok(())
}

pub fn validate(ctx: &Context, args: ValidateArgs) -> anyhow::Result<()> {
    let body = std::fs::read(&args.file)
        .with_context(|| format!("cannot read {}", args.file.display()))?;
    let card = Discoverer::parse(&body)
        .with_context(|| format!("{} is not a valid agent card", args.file.display()))?;

    if ctx.is_json() {
        return ctx.print_json(&card);
    }
    println!(
        "\n  {} {} is a valid agent card ({})",
        "✓".green().bold(),
        args.file.display().to_string().cyan(),
        card.qualified_name()
    );
    Ok(())
}

pub(crate) fn print_card(card: &AgentCard) {
    println!("\n  {} {}", card.name.bold(), format!("v{}", card.version).dimmed());
    if !card.description.is_empty() {
        println!("  {}", card.description);
    }
    if let Some(url) = &card.url {
        println!("  {:<14} {}", "URL:".dimmed(), url);
    }

    let capabilities = card.capabilities.enabled();
    println!(
        "  {:<14} {}",
        "Capabilities:".dimmed(),
        if capabilities.is_empty() {
            "none".dimmed().to_string()
        } else {
            capabilities.join(", ")
        }
    );
    if let Some(auth) = &card.authentication {
        println!("  {:<14} {}", "Auth:".dimmed(), auth.schemes.join(", "));
    }

    if !card.endpoints.is_empty() {
        println!("\n  {}", "Endpoints".bold());
        for endpoint in &card.endpoints {
            println!(
                "    {:<10} {}  {}",
                endpoint.kind.to_string().yellow(),
                endpoint.url,
                endpoint.methods.join(" ").dimmed()
            );
        }
    }

    if !card.skills.is_empty() {
        println!("\n  {}", "Skills".bold());
        for skill in &card.skills {
            println!("    {:<24} {}", skill.id.green(), skill.description);
        }
    }
    println!();
}
