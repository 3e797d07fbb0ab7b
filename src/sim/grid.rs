//! Grid simulation engine: stored capacity, drain, consumer servicing and
//! threshold transitions.

use std::fmt;

use rand::Rng;
use serde::Serialize;

use super::ledger::ConsumptionLedger;
use super::notify::GridEvent;
use super::types::GridParams;

const OVERLOAD_WARNING: &str = "Grid overload! Reduce the energy supply!";
const SPIKE_WARNING: &str = "Demand spike! Energy demand is rising!";

/// Why a session ended in blackout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlackoutCause {
    /// Capacity reached the blackout threshold.
    OverSupply,
    /// Capacity drained to zero.
    Depleted,
    /// The building failure counter reached its limit.
    BuildingFailures,
}

impl BlackoutCause {
    /// Human-readable cause reported through the terminal notification.
    pub fn message(self) -> &'static str {
        match self {
            BlackoutCause::OverSupply => "Blackout! The grid was overloaded.",
            BlackoutCause::Depleted => "Power outage! The city has run out of energy.",
            BlackoutCause::BuildingFailures => {
                "Too many building failures! The city is in blackout."
            }
        }
    }

    /// `true` for the two capacity-threshold causes.
    pub fn is_capacity_based(self) -> bool {
        matches!(self, BlackoutCause::OverSupply | BlackoutCause::Depleted)
    }
}

/// Externally visible grid state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GridStatus {
    Normal,
    Overloaded,
    Blackout(BlackoutCause),
}

impl fmt::Display for GridStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridStatus::Normal => f.write_str("normal"),
            GridStatus::Overloaded => f.write_str("overloaded"),
            GridStatus::Blackout(BlackoutCause::OverSupply) => f.write_str("blackout:over_supply"),
            GridStatus::Blackout(BlackoutCause::Depleted) => f.write_str("blackout:depleted"),
            GridStatus::Blackout(BlackoutCause::BuildingFailures) => {
                f.write_str("blackout:building_failures")
            }
        }
    }
}

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    /// `true` when the grid was already terminal and nothing happened.
    pub halted: bool,
    /// Names of consumers serviced, in roster order.
    pub serviced: Vec<String>,
    /// Names of consumers that hit a shortfall, in roster order.
    pub shortfalls: Vec<String>,
}

/// The city grid.
///
/// Mutated only through [`add_energy`](Grid::add_energy), [`tick`](Grid::tick)
/// and the demand-spike operations. Notifications are queued and drained by
/// the owner with [`take_events`](Grid::take_events).
#[derive(Debug, Clone)]
pub struct Grid {
    params: GridParams,
    current_capacity: f32,
    current_consumption: f32,
    overloaded: bool,
    demand_spike_active: bool,
    building_failures: u32,
    terminal: Option<BlackoutCause>,
    ledger: ConsumptionLedger,
    events: Vec<GridEvent>,
}

impl Grid {
    /// Creates a grid at `params.initial_capacity`.
    ///
    /// Status is not evaluated until the first inflow or outflow.
    ///
    /// # Panics
    ///
    /// Panics if `params` violates the threshold ordering or ranges.
    pub fn new(params: GridParams, ledger: ConsumptionLedger) -> Self {
        params.assert_valid();
        Self {
            current_capacity: params.initial_capacity,
            current_consumption: params.base_consumption,
            params,
            overloaded: false,
            demand_spike_active: false,
            building_failures: 0,
            terminal: None,
            ledger,
            events: Vec::new(),
        }
    }

    /// Adds collected energy, capped at `max_capacity`.
    ///
    /// Returns `false` without touching state when the grid is terminal or
    /// `amount` is negative or not finite.
    pub fn add_energy(&mut self, amount: f32) -> bool {
        if self.terminal.is_some() || !amount.is_finite() || amount < 0.0 {
            return false;
        }
        self.current_capacity = (self.current_capacity + amount).min(self.params.max_capacity);
        tracing::debug!(amount, capacity = self.current_capacity, "energy added");
        self.check_status();
        true
    }

    /// Runs one periodic tick at virtual time `now_ms`.
    ///
    /// Base drain first, then every due consumer in roster order, then a
    /// single status evaluation.
    pub fn tick(&mut self, now_ms: u64) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        if self.terminal.is_some() {
            outcome.halted = true;
            return outcome;
        }

        // 1. Base drain
        self.current_capacity = (self.current_capacity - self.current_consumption).max(0.0);

        // 2. Consumer servicing
        let spike = self
            .demand_spike_active
            .then_some(self.params.demand_spike_multiplier);
        let mut failures_exhausted = false;
        for consumer in self.ledger.iter_mut() {
            if !consumer.is_due(now_ms) {
                continue;
            }
            let demand = consumer.effective_demand(spike);
            if self.current_capacity >= demand {
                self.current_capacity -= demand;
                consumer.record_service(now_ms);
                outcome.serviced.push(consumer.name().to_string());
            } else {
                self.building_failures = self
                    .building_failures
                    .saturating_add(consumer.record_shortfall(now_ms));
                tracing::warn!(
                    consumer = consumer.name(),
                    demand,
                    capacity = self.current_capacity,
                    failures = self.building_failures,
                    "consumer shortfall"
                );
                self.events.push(GridEvent::Warning(format!(
                    "{} has a power outage!",
                    consumer.name()
                )));
                outcome.shortfalls.push(consumer.name().to_string());
                if self.building_failures >= self.params.max_failures {
                    failures_exhausted = true;
                }
            }
        }
        if failures_exhausted {
            self.terminate(BlackoutCause::BuildingFailures);
        }

        // 3. Status
        self.check_status();

        tracing::debug!(
            now_ms,
            capacity = self.current_capacity,
            consumption = self.current_consumption,
            serviced = outcome.serviced.len(),
            shortfalls = outcome.shortfalls.len(),
            "grid tick"
        );
        outcome
    }

    /// Runs the periodic spike check: one Bernoulli draw with the configured
    /// probability, skipped entirely while a spike is active.
    ///
    /// Returns `true` if a spike started.
    pub fn check_demand_spike<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.demand_spike_active || self.terminal.is_some() {
            return false;
        }
        if rng.random::<f32>() < self.params.spike_probability {
            self.start_demand_spike()
        } else {
            false
        }
    }

    /// Starts a demand spike. Spikes never stack: returns `false` and changes
    /// nothing if one is already active or the grid is terminal.
    pub fn start_demand_spike(&mut self) -> bool {
        if self.demand_spike_active || self.terminal.is_some() {
            return false;
        }
        self.demand_spike_active = true;
        self.current_consumption =
            self.params.base_consumption * self.params.demand_spike_multiplier;
        tracing::info!(consumption = self.current_consumption, "demand spike started");
        self.events.push(GridEvent::Warning(SPIKE_WARNING.to_string()));
        true
    }

    /// Ends the active demand spike and restores baseline consumption.
    pub fn end_demand_spike(&mut self) -> bool {
        if !self.demand_spike_active {
            return false;
        }
        self.demand_spike_active = false;
        self.current_consumption = self.params.base_consumption;
        tracing::info!(consumption = self.current_consumption, "demand spike ended");
        true
    }

    /// Drains queued notifications.
    pub fn take_events(&mut self) -> Vec<GridEvent> {
        std::mem::take(&mut self.events)
    }

    fn check_status(&mut self) {
        if self.terminal.is_some() {
            return;
        }
        let capacity = self.current_capacity;

        if capacity >= self.params.overload_threshold && !self.overloaded {
            self.overloaded = true;
            tracing::warn!(capacity, "grid overloaded");
            self.events
                .push(GridEvent::Warning(OVERLOAD_WARNING.to_string()));
        } else if capacity < self.params.overload_threshold && self.overloaded {
            self.overloaded = false;
            tracing::info!(capacity, "grid back to normal");
        }

        if capacity >= self.params.blackout_threshold {
            self.terminate(BlackoutCause::OverSupply);
        } else if capacity <= 0.0 {
            self.terminate(BlackoutCause::Depleted);
        }
    }

    fn terminate(&mut self, cause: BlackoutCause) {
        if self.terminal.is_some() {
            return;
        }
        self.terminal = Some(cause);
        tracing::info!(?cause, capacity = self.current_capacity, "grid terminal");
        self.events.push(GridEvent::Terminal {
            message: cause.message().to_string(),
            success: false,
        });
    }

    pub fn status(&self) -> GridStatus {
        match self.terminal {
            Some(cause) => GridStatus::Blackout(cause),
            None if self.overloaded => GridStatus::Overloaded,
            None => GridStatus::Normal,
        }
    }

    pub fn current_capacity(&self) -> f32 {
        self.current_capacity
    }

    pub fn current_consumption(&self) -> f32 {
        self.current_consumption
    }

    pub fn building_failures(&self) -> u32 {
        self.building_failures
    }

    pub fn is_overloaded(&self) -> bool {
        self.overloaded
    }

    /// `true` once the capacity-based blackout fired (either cause).
    pub fn is_blackout(&self) -> bool {
        self.terminal.is_some_and(BlackoutCause::is_capacity_based)
    }

    /// `true` once any terminal condition fired.
    pub fn is_terminal(&self) -> bool {
        self.terminal.is_some()
    }

    pub fn terminal_cause(&self) -> Option<BlackoutCause> {
        self.terminal
    }

    pub fn demand_spike_active(&self) -> bool {
        self.demand_spike_active
    }

    pub fn params(&self) -> &GridParams {
        &self.params
    }

    pub fn ledger(&self) -> &ConsumptionLedger {
        &self.ledger
    }
}
