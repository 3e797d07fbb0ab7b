//! Renewable energy sources that collectors harvest and repairers restore.

/// Energy source state machine (producing, broken, under repair).
pub mod source;
pub mod types;

pub use source::{EnergySource, SourceArena, SourceState};
pub use types::{Position, SourceId, SourceKind};
