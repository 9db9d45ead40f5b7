//! # lantern-core
//!
//! Runtime side of Lantern: a registry of discovered A2A agents, background
//! health checks and stale-entry cleanup, plus configuration, credentials and
//! telemetry shared by the CLI.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use lantern_core::{Agent, AgentRegistry, LanternConfig, RegistryConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = LanternConfig::load(None)?;
//!     let registry = Arc::new(AgentRegistry::new(RegistryConfig::from(&config.registry)));
//!
//!     let discoverer = config.discoverer()?;
//!     let cancel = CancellationToken::new();
//!     let card = discoverer.discover(&cancel, "localhost:8083").await?;
//!     registry.register(Agent::from_card("http://localhost:8083", card))?;
//!
//!     let cleanup = registry.clone().spawn_cleanup(cancel.clone());
//!     for agent in registry.find_by_capability("streaming") {
//!         println!("{} streams", agent.name);
//!     }
//!     cancel.cancel();
//!     cleanup.await?;
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod auth;
pub mod config;
pub mod error;
pub mod health;
pub mod registry;
pub mod telemetry;

// Re-exports
pub use agent::{Agent, AgentStatus};
pub use auth::{AuthKind, Credentials};
pub use config::LanternConfig;
pub use error::{LanternError, LanternResult};
pub use health::{CardProbe, HealthMonitor, HealthProbe};
pub use registry::{AgentRegistry, RegistryConfig};

// Re-export a2a-lantern types for convenience
pub use a2a_lantern;
