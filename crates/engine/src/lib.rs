//! abyssrun engine library.
//!
//! Drives the game through abyss runs from screen text and memory telemetry.
//!
//! ## Structure
//!
//! - `infrastructure/` - Ports, the snapshot bus, sensing and adapters
//! - `use_cases/` - Decisions, waits, navigation and state handlers
//! - `app` - Application composition

pub mod app;
pub mod infrastructure;
pub mod use_cases;

/// Test fixtures shared by unit tests.
#[cfg(test)]
pub mod test_fixtures;

pub use app::{AbyssRunner, Ports, RunnerError};
