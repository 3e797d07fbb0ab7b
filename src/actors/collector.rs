//! Collector actor: harvests sources into the grid.

use rand::rngs::StdRng;

use crate::sim::grid::Grid;
use crate::sources::EnergySource;

/// Gathers energy from sources and feeds it into the grid.
///
/// The role multiplier is actor-side configuration applied before the
/// grid sees the amount.
#[derive(Debug, Clone)]
pub struct Collector {
    /// Factor applied to every harvested amount.
    pub multiplier: f32,
    collected: f32,
}

impl Collector {
    pub fn new(multiplier: f32) -> Self {
        assert!(multiplier.is_finite() && multiplier >= 0.0);
        Self {
            multiplier,
            collected: 0.0,
        }
    }

    /// Harvests `source` and adds the scaled amount to `grid`.
    ///
    /// Returns the amount accepted by the grid, or `None` if the source had
    /// nothing to give or the grid refused the energy (terminal).
    pub fn collect(
        &mut self,
        grid: &mut Grid,
        source: &mut EnergySource,
        now_ms: u64,
        rng: &mut StdRng,
    ) -> Option<f32> {
        if grid.is_terminal() {
            return None;
        }
        let amount = source.harvest(now_ms, rng)? * self.multiplier;
        if grid.add_energy(amount) {
            self.collected += amount;
            Some(amount)
        } else {
            None
        }
    }

    /// Energy accepted by the grid so far.
    pub fn collected(&self) -> f32 {
        self.collected
    }
}
