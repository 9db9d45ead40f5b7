//! Agent Registry: the in-memory set of known agents.
//!
//! All state lives in one map behind a reader/writer lock. Readers get
//! clone-out copies, so nothing handed out by the registry aliases its
//! internal state. A background cleanup task evicts agents that have not
//! been seen within the stale threshold.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::agent::{Agent, AgentStatus};
use crate::error::{LanternError, LanternResult};

/// Default interval between cleanup passes.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Default age after which an unseen agent is evicted.
pub const DEFAULT_STALE_THRESHOLD: Duration = Duration::from_secs(10 * 60);

/// Default capacity of the registry.
pub const DEFAULT_MAX_AGENTS: usize = 100;

/// Default interval between health-check rounds.
pub const DEFAULT_HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Runtime settings of an [`AgentRegistry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    pub cleanup_interval: Duration,
    pub stale_threshold: Duration,
    pub max_agents: usize,
    pub health_check_interval: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            stale_threshold: DEFAULT_STALE_THRESHOLD,
            max_agents: DEFAULT_MAX_AGENTS,
            health_check_interval: DEFAULT_HEALTH_CHECK_INTERVAL,
        }
    }
}

/// Thread-safe registry of discovered agents, keyed by agent id.
#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: RwLock<HashMap<String, Agent>>,
    config: RegistryConfig,
}

impl AgentRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            agents: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // Every operation leaves the map consistent before it can panic, so a
    // poisoned lock still guards valid data.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Agent>> {
        self.agents.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Agent>> {
        self.agents.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Mutations ────────────────────────────────────────────

    /// Insert or replace an agent.
    pub fn register(&self, agent: Agent) -> LanternResult<()> {
        if agent.id.trim().is_empty() {
            return Err(LanternError::InvalidAgent("agent id is empty".into()));
        }

        let mut agents = self.write();
        if !agents.contains_key(&agent.id) && agents.len() >= self.config.max_agents {
            return Err(LanternError::RegistryFull {
                max: self.config.max_agents,
            });
        }

        tracing::info!(
            agent_id = %agent.id,
            name = %agent.name,
            url = %agent.url,
            status = %agent.status,
            "Registered agent"
        );
        agents.insert(agent.id.clone(), agent);
        Ok(())
    }

    /// Remove an agent, returning the removed record.
    pub fn unregister(&self, id: &str) -> LanternResult<Agent> {
        let removed = self
            .write()
            .remove(id)
            .ok_or_else(|| LanternError::NotFound(id.to_string()))?;
        tracing::info!(agent_id = %id, "Unregistered agent");
        Ok(removed)
    }

    /// Set an agent's status and refresh its `last_seen`.
    pub fn update_status(&self, id: &str, status: AgentStatus) -> LanternResult<()> {
        let mut agents = self.write();
        let agent = agents
            .get_mut(id)
            .ok_or_else(|| LanternError::NotFound(id.to_string()))?;
        if agent.status != status {
            tracing::debug!(agent_id = %id, from = %agent.status, to = %status, "Agent status changed");
        }
        agent.status = status;
        agent.last_seen = Utc::now();
        Ok(())
    }

    /// Refresh `last_seen` after a successful interaction.
    pub fn touch(&self, id: &str) -> LanternResult<()> {
        let mut agents = self.write();
        let agent = agents
            .get_mut(id)
            .ok_or_else(|| LanternError::NotFound(id.to_string()))?;
        agent.last_seen = Utc::now();
        Ok(())
    }

    /// Remove every agent not seen for longer than the stale threshold, as
    /// measured at `now`. Returns the evicted agents.
    pub fn evict_stale(&self, now: DateTime<Utc>) -> Vec<Agent> {
        let threshold = self.config.stale_threshold;
        let is_stale = |agent: &Agent| {
            now.signed_duration_since(agent.last_seen)
                .to_std()
                .map(|age| age > threshold)
                .unwrap_or(false)
        };

        let mut agents = self.write();
        let stale: Vec<String> = agents
            .values()
            .filter(|agent| is_stale(agent))
            .map(|agent| agent.id.clone())
            .collect();

        let evicted: Vec<Agent> = stale
            .iter()
            .filter_map(|id| agents.remove(id))
            .collect();
        drop(agents);

        for agent in &evicted {
            tracing::warn!(
                agent_id = %agent.id,
                last_seen = %agent.last_seen,
                "Evicted stale agent"
            );
        }
        evicted
    }

    // ── Queries ──────────────────────────────────────────────

    pub fn get(&self, id: &str) -> LanternResult<Agent> {
        self.read()
            .get(id)
            .cloned()
            .ok_or_else(|| LanternError::NotFound(id.to_string()))
    }

    /// Snapshot of all agents, ordered by id.
    pub fn list(&self) -> Vec<Agent> {
        let mut agents: Vec<Agent> = self.read().values().cloned().collect();
        agents.sort_by(|a, b| a.id.cmp(&b.id));
        agents
    }

    /// Online agents whose card declares `capability`.
    pub fn find_by_capability(&self, capability: &str) -> Vec<Agent> {
        let mut agents: Vec<Agent> = self
            .read()
            .values()
            .filter(|agent| agent.status == AgentStatus::Online && agent.supports(capability))
            .cloned()
            .collect();
        agents.sort_by(|a, b| a.id.cmp(&b.id));
        agents
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // ── Background cleanup ───────────────────────────────────

    /// Run [`evict_stale`](Self::evict_stale) every cleanup interval until
    /// `cancel` fires.
    pub fn spawn_cleanup(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let period = self.config.cleanup_interval.max(Duration::from_millis(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!("Registry cleanup stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let evicted = self.evict_stale(Utc::now());
                        if !evicted.is_empty() {
                            tracing::info!(evicted = evicted.len(), remaining = self.len(), "Registry cleanup pass");
                        }
                    }
                }
            }
        })
    }
}
