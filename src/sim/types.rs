//! Core simulation types: grid parameters, session configuration, tick records.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::grid::GridStatus;

/// Static grid configuration, fixed for the whole session.
///
/// # Examples
///
/// ```
/// use solar_rush::sim::types::GridParams;
///
/// let params = GridParams::new(100.0, 80.0, 100.0, 2.0);
/// assert_eq!(params.initial_capacity, 0.0);
/// assert_eq!(params.max_failures, 5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GridParams {
    /// Upper bound on stored energy.
    pub max_capacity: f32,
    /// Capacity at or above which the grid is overloaded (advisory).
    pub overload_threshold: f32,
    /// Capacity at or above which the grid blacks out (terminal).
    pub blackout_threshold: f32,
    /// Stored energy when the session starts.
    pub initial_capacity: f32,
    /// Drain applied on every tick.
    pub base_consumption: f32,
    /// Factor applied to drain and consumer demand during a spike.
    pub demand_spike_multiplier: f32,
    /// Probability that a spike check starts a spike (0.0 to 1.0).
    pub spike_probability: f32,
    /// Failure count that ends the session.
    pub max_failures: u32,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            max_capacity: 100.0,
            overload_threshold: 80.0,
            blackout_threshold: 100.0,
            initial_capacity: 30.0,
            base_consumption: 1.0,
            demand_spike_multiplier: 1.5,
            spike_probability: 0.2,
            max_failures: 5,
        }
    }
}

impl GridParams {
    /// Creates grid parameters with an empty grid and default spike/failure settings.
    ///
    /// # Panics
    ///
    /// Panics unless `0 < overload_threshold < blackout_threshold <= max_capacity`
    /// and `base_consumption >= 0`.
    pub fn new(
        max_capacity: f32,
        overload_threshold: f32,
        blackout_threshold: f32,
        base_consumption: f32,
    ) -> Self {
        let params = Self {
            max_capacity,
            overload_threshold,
            blackout_threshold,
            initial_capacity: 0.0,
            base_consumption,
            ..Self::default()
        };
        params.assert_valid();
        params
    }

    pub(crate) fn assert_valid(&self) {
        assert!(
            self.overload_threshold > 0.0
                && self.overload_threshold < self.blackout_threshold
                && self.blackout_threshold <= self.max_capacity,
            "thresholds must satisfy 0 < overload < blackout <= max_capacity"
        );
        assert!(
            (0.0..=self.max_capacity).contains(&self.initial_capacity),
            "initial_capacity must be in [0, max_capacity]"
        );
        assert!(self.base_consumption >= 0.0, "base_consumption must be >= 0");
        assert!(self.demand_spike_multiplier >= 1.0);
        assert!((0.0..=1.0).contains(&self.spike_probability));
        assert!(self.max_failures > 0, "max_failures must be > 0");
    }
}

/// Player role chosen before the session. Each role carries one bonus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    None,
    Collector,
    Engineer,
    Strategist,
    GridManager,
}

/// Multipliers derived from the chosen [`Role`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoleBonus {
    /// Scales every collected amount before it reaches the grid.
    pub collection_multiplier: f32,
    /// Scales repair dwell time.
    pub repair_time_multiplier: f32,
    /// Scales the interval between obstacle warnings.
    pub warning_time_multiplier: f32,
    /// Divides the grid's base consumption.
    pub grid_efficiency_multiplier: f32,
}

impl Default for RoleBonus {
    fn default() -> Self {
        Self {
            collection_multiplier: 1.0,
            repair_time_multiplier: 1.0,
            warning_time_multiplier: 1.0,
            grid_efficiency_multiplier: 1.0,
        }
    }
}

impl Role {
    pub fn bonus(self) -> RoleBonus {
        let base = RoleBonus::default();
        match self {
            Role::None => base,
            Role::Collector => RoleBonus {
                collection_multiplier: 1.2,
                ..base
            },
            Role::Engineer => RoleBonus {
                repair_time_multiplier: 0.7,
                ..base
            },
            Role::Strategist => RoleBonus {
                warning_time_multiplier: 1.5,
                ..base
            },
            Role::GridManager => RoleBonus {
                grid_efficiency_multiplier: 1.15,
                ..base
            },
        }
    }
}

/// Obstacle timing.
#[derive(Debug, Clone, PartialEq)]
pub struct ObstacleParams {
    /// Set to `false` to run without obstacles.
    pub enabled: bool,
    /// Base interval between obstacle spawns (ms), scaled by the role bonus.
    pub interval_ms: u64,
    /// Delay between the warning and the obstacle taking effect (ms).
    pub warning_time_ms: u64,
    /// How long an active obstacle lasts (ms).
    pub duration_ms: u64,
}

impl Default for ObstacleParams {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 20_000,
            warning_time_ms: 5_000,
            duration_ms: 10_000,
        }
    }
}

/// Everything a session needs at construction; replaces ambient global state.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Master random seed.
    pub seed: u64,
    pub role: Role,
    /// Session length (ms); reaching it without winning is a loss.
    pub time_limit_ms: u64,
    /// Collected energy needed to win.
    pub energy_target: f32,
    /// Grid tick cadence (ms).
    pub tick_interval_ms: u64,
    /// Demand spike check cadence (ms).
    pub spike_check_interval_ms: u64,
    /// How long a demand spike lasts (ms).
    pub spike_duration_ms: u64,
    pub grid: GridParams,
    pub obstacles: ObstacleParams,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            role: Role::None,
            time_limit_ms: 180_000,
            energy_target: 300.0,
            tick_interval_ms: 1_000,
            spike_check_interval_ms: 10_000,
            spike_duration_ms: 8_000,
            grid: GridParams::default(),
            obstacles: ObstacleParams::default(),
        }
    }
}

/// Complete record of one grid tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickRecord {
    /// Virtual time of the tick (ms).
    pub time_ms: u64,
    /// Capacity after drain and servicing.
    pub capacity: f32,
    /// Drain rate in effect for this tick.
    pub consumption: f32,
    pub status: GridStatus,
    pub demand_spike: bool,
    /// Cumulative failure counter after this tick.
    pub failures: u32,
    /// Consumers serviced this tick.
    pub serviced: usize,
    /// Consumers that hit a shortfall this tick, in roster order.
    pub shortfalls: Vec<String>,
    /// Sources broken at the end of the tick.
    pub broken_sources: usize,
    /// Energy collected so far in the session.
    pub energy_collected: f32,
}

impl fmt::Display for TickRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>6.1}s | grid={:>6.2}  drain={:.2}{} | status={:<22} | \
             failures={} served={} broken={} | collected={:.1}",
            self.time_ms as f32 / 1000.0,
            self.capacity,
            self.consumption,
            if self.demand_spike { " (spike)" } else { "" },
            self.status.to_string(),
            self.failures,
            self.serviced,
            self.broken_sources,
            self.energy_collected,
        )?;
        if !self.shortfalls.is_empty() {
            write!(f, " | shortfall: {}", self.shortfalls.join(", "))?;
        }
        Ok(())
    }
}
