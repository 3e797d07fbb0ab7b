//! Solar Rush: a city energy grid fed by renewable sources, simulated headless.

/// Collectors and repairers acting on sources and the grid.
pub mod actors;
pub mod cli;
pub mod config;
pub mod io;
/// Grid, ledger, scheduler and session engine.
pub mod sim;
pub mod sources;
