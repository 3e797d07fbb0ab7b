use rand::rngs::StdRng;
use slotmap::SlotMap;

use super::types::{Position, SourceId, SourceKind, gaussian_noise};

/// Arena owning every source of a session.
pub type SourceArena = SlotMap<SourceId, EnergySource>;

/// Whether a source can currently produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Producing,
    Broken,
}

/// A renewable energy source on the play field.
///
/// A producing source yields `output` energy per harvest and then needs
/// `recharge_ms` before it can be harvested again. Obstacles can halt a
/// source (no output, not broken) or break it (needs a repair).
#[derive(Debug, Clone)]
pub struct EnergySource {
    pub kind: SourceKind,

    pub position: Position,

    /// Energy per harvest before noise and role multipliers.
    pub output: f32,

    /// Standard deviation of the harvest noise as a fraction of output.
    pub noise_std: f32,

    /// Cooldown between two harvests (ms).
    pub recharge_ms: u64,

    /// Base repair dwell time (ms).
    pub repair_time_ms: u64,

    state: SourceState,
    repairing: bool,
    halted: bool,
    ready_at_ms: u64,
}

impl EnergySource {
    /// Creates a producing source, ready to harvest immediately.
    ///
    /// # Arguments
    ///
    /// * `kind` - Solar, wind or hydro
    /// * `position` - Location used for repair range checks
    /// * `output` - Energy per harvest (must be >= 0)
    /// * `recharge_ms` - Cooldown between harvests
    /// * `repair_time_ms` - Base repair dwell time
    ///
    /// # Panics
    ///
    /// Panics if `output` is negative or not finite.
    pub fn new(
        kind: SourceKind,
        position: Position,
        output: f32,
        recharge_ms: u64,
        repair_time_ms: u64,
    ) -> Self {
        assert!(output.is_finite() && output >= 0.0);
        Self {
            kind,
            position,
            output,
            noise_std: 0.0,
            recharge_ms,
            repair_time_ms,
            state: SourceState::Producing,
            repairing: false,
            halted: false,
            ready_at_ms: 0,
        }
    }

    /// Sets the harvest noise.
    pub fn with_noise(mut self, noise_std: f32) -> Self {
        self.noise_std = noise_std.max(0.0);
        self
    }

    pub fn state(&self) -> SourceState {
        self.state
    }

    pub fn is_broken(&self) -> bool {
        self.state == SourceState::Broken
    }

    /// `true` while a repairer holds this source as its target.
    pub fn is_repairing(&self) -> bool {
        self.repairing
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Returns `true` if a harvest at `now_ms` would yield energy.
    pub fn can_produce(&self, now_ms: u64) -> bool {
        self.state == SourceState::Producing && !self.halted && now_ms >= self.ready_at_ms
    }

    /// Harvests the source, starting its cooldown.
    ///
    /// Returns `None` when broken, halted or still recharging.
    pub fn harvest(&mut self, now_ms: u64, rng: &mut StdRng) -> Option<f32> {
        if !self.can_produce(now_ms) {
            return None;
        }
        self.ready_at_ms = now_ms + self.recharge_ms;
        let noise_mult = 1.0 + gaussian_noise(rng, self.noise_std);
        Some((self.output * noise_mult).max(0.0))
    }

    /// Breaks a producing source. Returns `false` if it was already broken.
    pub fn break_down(&mut self) -> bool {
        if self.is_broken() {
            return false;
        }
        self.state = SourceState::Broken;
        true
    }

    /// Claims the source for a repair. Fails unless broken and unclaimed.
    pub fn begin_repair(&mut self) -> bool {
        if !self.is_broken() || self.repairing {
            return false;
        }
        self.repairing = true;
        true
    }

    /// Releases a repair claim without restoring the source.
    pub fn cancel_repair(&mut self) {
        self.repairing = false;
    }

    /// Restores the source to producing.
    pub fn finish_repair(&mut self) {
        self.repairing = false;
        self.state = SourceState::Producing;
    }

    pub fn set_halted(&mut self, halted: bool) {
        self.halted = halted;
    }
}
