//! Health monitoring: periodic reachability checks of registered agents.
//!
//! A [`HealthProbe`] maps one agent to an [`AgentStatus`]. The monitor runs
//! the probe against every registered agent and writes changes back through
//! the registry's public API, so probe results never bypass its locking.

use std::sync::Arc;
use std::time::Duration;

use a2a_lantern::{build_discovery_url, A2AError, Discoverer, ErrorKind};
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::agent::{Agent, AgentStatus};
use crate::error::LanternError;
use crate::registry::AgentRegistry;

/// Trait for agent reachability checks.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Check one agent.
    async fn probe(&self, agent: &Agent) -> AgentStatus;
}

/// Probes an agent by fetching its card once, without retries.
///
/// A valid card means `Online`; network failures and 5xx mean `Offline`;
/// anything else the agent answered with (4xx, an unreadable or invalid
/// card) means `Error`.
#[derive(Debug, Clone, Default)]
pub struct CardProbe {
    discoverer: Discoverer,
}

impl CardProbe {
    pub fn new(discoverer: Discoverer) -> Self {
        Self { discoverer }
    }
}

#[async_trait]
impl HealthProbe for CardProbe {
    async fn probe(&self, agent: &Agent) -> AgentStatus {
        let card_url = match Url::parse(&build_discovery_url(&agent.url)) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(agent_id = %agent.id, url = %agent.url, error = %e, "Agent URL is not probeable");
                return AgentStatus::Error;
            }
        };

        let result = self
            .discoverer
            .fetch_once(&card_url)
            .await
            .and_then(|body| Discoverer::parse(&body));

        match result {
            Ok(_) => AgentStatus::Online,
            Err(e) => {
                let status = status_for(&e);
                tracing::warn!(agent_id = %agent.id, error = %e, status = %status, "Health probe failed");
                status
            }
        }
    }
}

fn status_for(error: &A2AError) -> AgentStatus {
    match error.kind() {
        ErrorKind::Network => AgentStatus::Offline,
        ErrorKind::HttpStatus if error.status().is_some_and(|s| s >= 500) => AgentStatus::Offline,
        _ => AgentStatus::Error,
    }
}

/// Runs a [`HealthProbe`] against every registered agent.
pub struct HealthMonitor<P: HealthProbe = CardProbe> {
    registry: Arc<AgentRegistry>,
    probe: P,
    interval: Duration,
}

impl<P: HealthProbe + 'static> HealthMonitor<P> {
    pub fn new(registry: Arc<AgentRegistry>, probe: P, interval: Duration) -> Self {
        Self {
            registry,
            probe,
            interval,
        }
    }

    /// Probe all agents concurrently and record the results.
    ///
    /// Reachable agents get their `last_seen` refreshed. For the rest only a
    /// status change is written, so an agent that stays unreachable keeps
    /// ageing toward eviction. Returns each probed agent's id and status.
    pub async fn check_all(&self) -> Vec<(String, AgentStatus)> {
        let agents = self.registry.list();
        let probes = agents.iter().map(|agent| async move {
            let status = self.probe.probe(agent).await;
            (agent, status)
        });
        let results = futures::future::join_all(probes).await;

        let mut report = Vec::with_capacity(results.len());
        for (agent, status) in results {
            let written = if status == AgentStatus::Online {
                if agent.status == status {
                    self.registry.touch(&agent.id)
                } else {
                    self.registry.update_status(&agent.id, status)
                }
            } else if agent.status != status {
                self.registry.update_status(&agent.id, status)
            } else {
                Ok(())
            };

            match written {
                Ok(()) => report.push((agent.id.clone(), status)),
                // Unregistered while the probe was in flight.
                Err(LanternError::NotFound(_)) => {
                    tracing::debug!(agent_id = %agent.id, "Agent vanished during health check");
                }
                Err(e) => tracing::warn!(agent_id = %agent.id, error = %e, "Failed to record health"),
            }
        }

        tracing::debug!(checked = report.len(), "Health check round complete");
        report
    }

    /// Run [`check_all`](Self::check_all) every interval until `cancel` fires.
    pub fn spawn(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let period = self.interval.max(Duration::from_millis(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!("Health monitor stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        tokio::select! {
                            _ = cancel.cancelled() => break,
                            _ = self.check_all() => {}
                        }
                    }
                }
            }
        })
    }
}
