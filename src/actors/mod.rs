//! Actors that interact with the grid: collectors inject energy, repairers
//! restore broken sources.

pub mod collector;
pub mod repairer;

pub use collector::Collector;
pub use repairer::{RepairCompletion, RepairJob, RepairOutcome, RepairTicket, Repairer};
