//! Data-driven balance tables and loaders.
//!
//! This crate reads [`combat_core::CombatConfig`] from data files so band
//! widths, zone multipliers, crit odds and reward tables can be tuned
//! without a rebuild:
//! - TOML (`.toml`), the format shipped in `data/combat.toml`
//! - RON (`.ron`)
//!
//! Content is consumed by the runtime at startup and never appears in
//! session state.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{ConfigFormat, ConfigLoader, LoadResult};
