//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use solar_rush::actors::Repairer;
use solar_rush::sim::controller::Operator;
use solar_rush::sim::engine::Session;
use solar_rush::sim::grid::Grid;
use solar_rush::sim::ledger::{ConsumerRecord, ConsumptionLedger};
use solar_rush::sim::notify::RecordingNotifier;
use solar_rush::sim::types::{GridParams, ObstacleParams, SessionConfig};
use solar_rush::sources::{EnergySource, Position, SourceKind};

/// Grid with max 100, overload 80, blackout 100 and base drain 2, starting at `initial`.
pub fn grid_at(initial: f32, ledger: ConsumptionLedger) -> Grid {
    Grid::new(
        GridParams {
            initial_capacity: initial,
            ..GridParams::new(100.0, 80.0, 100.0, 2.0)
        },
        ledger,
    )
}

/// Grid with no base drain, so consumer servicing is the only outflow.
pub fn drainless_grid(initial: f32, max_failures: u32, ledger: ConsumptionLedger) -> Grid {
    Grid::new(
        GridParams {
            initial_capacity: initial,
            max_failures,
            ..GridParams::new(100.0, 80.0, 100.0, 0.0)
        },
        ledger,
    )
}

/// Single hospital drawing 5 every 10 s.
pub fn hospital_only() -> ConsumptionLedger {
    ConsumptionLedger::new(vec![ConsumerRecord::new("Hospital", 5.0, 10_000)])
}

/// Session config with spikes and obstacles switched off.
pub fn quiet_session_config() -> SessionConfig {
    SessionConfig {
        grid: GridParams {
            initial_capacity: 50.0,
            spike_probability: 0.0,
            ..GridParams::new(100.0, 80.0, 100.0, 1.0)
        },
        obstacles: ObstacleParams {
            enabled: false,
            ..ObstacleParams::default()
        },
        ..SessionConfig::default()
    }
}

/// Two of each source kind, no noise, spread along the x axis.
pub fn field_sources() -> Vec<EnergySource> {
    [
        (SourceKind::Solar, 0.0, 4.0),
        (SourceKind::Solar, 100.0, 4.0),
        (SourceKind::Wind, 200.0, 6.0),
        (SourceKind::Wind, 300.0, 6.0),
        (SourceKind::Hydro, 400.0, 8.0),
        (SourceKind::Hydro, 500.0, 8.0),
    ]
    .into_iter()
    .map(|(kind, x, output)| EnergySource::new(kind, Position::new(x, 0.0), output, 5_000, 3_000))
    .collect()
}

/// Repairer at the origin with range 50 and speed 200.
pub fn default_repairer() -> Repairer {
    Repairer::new(Position::default(), 50.0, 200.0, 1.0)
}

/// Builds a session that records notifications.
pub fn recording_session<O: Operator>(
    config: SessionConfig,
    ledger: ConsumptionLedger,
    sources: Vec<EnergySource>,
    operator: O,
) -> Session<O, RecordingNotifier> {
    Session::new(
        config,
        ledger,
        sources,
        default_repairer(),
        operator,
        RecordingNotifier::default(),
    )
}
