//! Repository layer for combat sessions.
//!
//! Repositories hold the data that CHANGES during play: one
//! [`CombatSession`](combat_core::CombatSession) per encounter. Balance tables
//! are loaded once at startup and never stored here.

mod error;
mod file;
mod memory;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::FileSessionRepository;
pub use memory::InMemorySessionRepo;
pub use traits::SessionRepository;
