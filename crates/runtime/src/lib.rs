//! Runtime orchestration for tap-dial combat sessions.
//!
//! This crate wires the pure rules from `combat-core` to a session store,
//! a clock, an event bus and tap providers. Consumers embed
//! [`CombatService`] to create sessions, submit taps, retreat, and claim
//! rewards.
//!
//! Modules are organized by responsibility:
//! - [`service`] hosts the facade and its builder
//! - [`api`] exposes the error and provider types downstream clients use
//! - [`events`] provides the topic-based event bus
//! - [`repository`] provides in-memory and file-backed session stores
//! - [`clock`] and [`config`] cover time and runtime settings
pub mod api;
pub mod clock;
pub mod config;
pub mod events;
pub mod repository;
pub mod service;

pub use api::{RandomTaps, Result, RuntimeError, ScriptedTaps, TapProvider};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{RuntimeConfig, StorageConfig};
pub use events::{EventBus, Topic};
pub use repository::{
    FileSessionRepository, InMemorySessionRepo, RepositoryError, SessionRepository,
};
pub use service::{ActionReport, CombatService, CombatServiceBuilder};
