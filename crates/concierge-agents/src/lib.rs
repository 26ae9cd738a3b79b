//! Live wiring for the Takeshiba concierge: rig-backed role generation,
//! weather lookup, static role rosters, session orchestration, telemetry and
//! the command-line surface.

pub mod agents;
pub mod cli;
pub mod config;
pub mod prompts;
pub mod rosters;
pub mod session;
pub mod telemetry;
pub mod weather;
