//! `lantern send | stream | status | cancel`: task operations.

use a2a_lantern::{A2AError, AgentAddress, Message, StreamResponse, TaskRequest, TaskResponse};
use anyhow::Context as _;
use clap::Args;
use colored::Colorize;
use futures::StreamExt;

use super::{ctrl_c_token, Context};

#[derive(Args)]
pub struct SendArgs {
    /// Agent endpoint base URL.
    pub url: String,

    /// Message text.
    pub text: String,

    /// Logical agent id behind a gateway (endpoint becomes URL/AGENT_ID).
    #[arg(long)]
    pub agent_id: Option<String>,

    /// Task id (generated when omitted).
    #[arg(long)]
    pub task_id: Option<String>,
}

#[derive(Args)]
pub struct TaskArgs {
    /// Agent endpoint base URL.
    pub url: String,

    /// Task id.
    pub task_id: String,

    /// Logical agent id behind a gateway.
    #[arg(long)]
    pub agent_id: Option<String>,
}

fn address(url: &str, agent_id: Option<&str>) -> anyhow::Result<AgentAddress> {
    let addr = AgentAddress::parse(url).with_context(|| format!("invalid agent URL {url:?}"))?;
    Ok(match agent_id {
        Some(id) => addr.with_agent(id),
        None => addr,
    })
}

fn task_request(args: &SendArgs) -> TaskRequest {
    let message = Message::user_text(args.text.clone());
    match &args.task_id {
        Some(id) => TaskRequest::new(id.clone(), message),
        None => TaskRequest::with_random_id(message),
    }
}

pub async fn send(ctx: &Context, args: SendArgs) -> anyhow::Result<()> {
    let addr = address(&args.url, args.agent_id.as_deref())?;
    let request = task_request(&args);
    let client = ctx.client()?;

    let response = client.send_task(&addr, &request).await?;

    if ctx.is_json() {
        return ctx.print_json(&response);
    }
    print_response(&response);
    Ok(())
}

pub async fn stream(ctx: &Context, args: SendArgs) -> anyhow::Result<()> {
    let addr = address(&args.url, args.agent_id.as_deref())?;
    let request = task_request(&args);
    let client = ctx.client()?;
    let cancel = ctrl_c_token();

    if !ctx.is_json() {
        println!(
            "\n  {} Streaming task {} from {}\n",
            "→".dimmed(),
            request.id.cyan(),
            addr
        );
    }

    let mut events = client.stream_task(&cancel, &addr, &request);
    let mut received = 0usize;
    while let Some(item) = events.next().await {
        match item {
            Ok(event) => {
                received += 1;
                if ctx.is_json() {
                    println!("{}", serde_json::to_string(&event)?);
                } else {
                    print_event(&event);
                }
            }
            Err(A2AError::Cancelled) => {
                if !ctx.is_json() {
                    println!("\n  {} Cancelled after {received} events", "■".yellow());
                }
                return Ok(());
            }
            Err(e) => return Err(e).context("stream failed"),
        }
    }

    if !ctx.is_json() {
        println!("\n  {} Stream closed ({received} events)", "✓".green().bold());
    }
    Ok(())
}

pub async fn status(ctx: &Context, args: TaskArgs) -> anyhow::Result<()> {
    let addr = address(&args.url, args.agent_id.as_deref())?;
    let status = ctx.client()?.get_task_status(&addr, &args.task_id).await?;

    if ctx.is_json() {
        return ctx.print_json(&status);
    }
    println!("\n  {:<12} {}", "Task:".dimmed(), status.id);
    println!("  {:<12} {}", "Status:".dimmed(), status.status.bold());
    if let Some(progress) = status.progress_fraction() {
        println!("  {:<12} {:.0}%", "Progress:".dimmed(), progress * 100.0);
    }
    if let Some(started) = status.started_at {
        println!("  {:<12} {}", "Started:".dimmed(), started.to_rfc3339());
    }
    if let Some(completed) = status.completed_at {
        println!("  {:<12} {}", "Completed:".dimmed(), completed.to_rfc3339());
    }
    if let Some(error) = &status.error {
        println!("  {:<12} {}", "Error:".dimmed(), error.red());
    }
    println!();
    Ok(())
}

pub async fn cancel(ctx: &Context, args: TaskArgs) -> anyhow::Result<()> {
    let addr = address(&args.url, args.agent_id.as_deref())?;
    ctx.client()?.cancel_task(&addr, &args.task_id).await?;

    if ctx.is_json() {
        return ctx.print_json(&serde_json::json!({ "id": args.task_id, "cancelled": true }));
    }
    println!("\n  {} Task {} cancelled\n", "✓".green().bold(), args.task_id.cyan());
    Ok(())
}

fn print_response(response: &TaskResponse) {
    println!("\n  {:<10} {}", "Task:".dimmed(), response.id);
    println!("  {:<10} {}", "Status:".dimmed(), response.status.bold());
    if let Some(error) = &response.error {
        println!("  {:<10} {}", "Error:".dimmed(), error.red());
    }
    if let Some(message) = &response.message {
        let text = message.text_content();
        if !text.is_empty() {
            println!("\n{}", text);
        }
    }
    println!();
}

fn print_event(event: &StreamResponse) {
    let time = event
        .timestamp
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_default();
    let kind = if event.kind.is_empty() { "event" } else { &event.kind };
    println!(
        "  {} {:<10} {}",
        time.dimmed(),
        kind.yellow(),
        event.data
    );
    if event.done {
        println!("  {} terminal event", "✓".green().bold());
    }
}
