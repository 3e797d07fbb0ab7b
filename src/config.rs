//! TOML-based scenario configuration and preset definitions.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::actors::Repairer;
use crate::sim::ledger::{ConsumerRecord, ConsumptionLedger};
use crate::sim::types::{GridParams, ObstacleParams, Role, SessionConfig};
use crate::sources::{EnergySource, Position, SourceKind};

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Session timing, objective and operator.
    pub session: SessionSection,
    /// Grid thresholds and drain.
    pub grid: GridSection,
    /// Demand spike parameters.
    pub demand_spike: DemandSpikeSection,
    /// Obstacle timing.
    pub obstacles: ObstacleSection,
    /// Engineer placement and movement.
    pub repairer: RepairerSection,
    /// Consumer roster, in servicing order.
    pub consumers: Vec<ConsumerSection>,
    /// Energy sources on the field.
    pub sources: Vec<SourceSection>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self::baseline()
    }
}

/// Session timing, objective and operator.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionSection {
    /// Master random seed.
    pub seed: u64,
    /// Player role; selects one bonus.
    pub role: Role,
    /// Session length (ms).
    pub time_limit_ms: u64,
    /// Collected energy that wins the session.
    pub energy_target: f32,
    /// Grid tick interval (ms, must be > 0).
    pub tick_interval_ms: u64,
    /// Operator type: `"idle"` or `"greedy"`.
    pub controller: String,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            seed: 42,
            role: Role::None,
            time_limit_ms: 180_000,
            energy_target: 300.0,
            tick_interval_ms: 1000,
            controller: "greedy".to_string(),
        }
    }
}

/// Grid thresholds and drain.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridSection {
    pub max_capacity: f32,
    pub overload_threshold: f32,
    pub blackout_threshold: f32,
    /// Stored energy at session start.
    pub initial_capacity: f32,
    /// Drain per tick.
    pub base_consumption: f32,
    /// Failure count that ends the session.
    pub max_failures: u32,
}

impl Default for GridSection {
    fn default() -> Self {
        let p = GridParams::default();
        Self {
            max_capacity: p.max_capacity,
            overload_threshold: p.overload_threshold,
            blackout_threshold: p.blackout_threshold,
            initial_capacity: p.initial_capacity,
            base_consumption: p.base_consumption,
            max_failures: p.max_failures,
        }
    }
}

/// Demand spike parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemandSpikeSection {
    /// Factor applied to drain and consumer demand (must be >= 1).
    pub multiplier: f32,
    /// Chance that a check starts a spike (0.0-1.0).
    pub probability: f32,
    /// Interval between spike checks (ms).
    pub check_interval_ms: u64,
    /// How long a spike lasts (ms).
    pub duration_ms: u64,
}

impl Default for DemandSpikeSection {
    fn default() -> Self {
        Self {
            multiplier: 1.5,
            probability: 0.2,
            check_interval_ms: 10_000,
            duration_ms: 8_000,
        }
    }
}

/// Obstacle timing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObstacleSection {
    pub enabled: bool,
    /// Interval between obstacle spawns before the role multiplier (ms).
    pub interval_ms: u64,
    /// Delay between the warning and the obstacle taking effect (ms).
    pub warning_time_ms: u64,
    /// How long an active obstacle lasts (ms).
    pub duration_ms: u64,
}

impl Default for ObstacleSection {
    fn default() -> Self {
        let p = ObstacleParams::default();
        Self {
            enabled: p.enabled,
            interval_ms: p.interval_ms,
            warning_time_ms: p.warning_time_ms,
            duration_ms: p.duration_ms,
        }
    }
}

/// Engineer placement and movement.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepairerSection {
    pub x: f32,
    pub y: f32,
    /// Maximum distance to a source for a repair to start.
    pub range: f32,
    /// Movement speed (units per second).
    pub speed: f32,
}

impl Default for RepairerSection {
    fn default() -> Self {
        Self {
            x: 400.0,
            y: 300.0,
            range: 50.0,
            speed: 200.0,
        }
    }
}

/// One `[[consumers]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsumerSection {
    pub name: String,
    /// Energy drawn per service.
    pub consumption_rate: f32,
    /// Interval between services (ms).
    pub cadence_ms: u64,
    /// Failures added per shortfall.
    #[serde(default = "default_failure_penalty")]
    pub failure_penalty: u32,
}

fn default_failure_penalty() -> u32 {
    1
}

/// One `[[sources]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSection {
    pub kind: SourceKind,
    pub x: f32,
    pub y: f32,
    /// Energy per harvest.
    pub output: f32,
    /// Cooldown between harvests (ms).
    pub recharge_ms: u64,
    /// Base repair time (ms).
    pub repair_time_ms: u64,
    /// Harvest noise as a fraction of output.
    #[serde(default)]
    pub noise_std: f32,
}

impl SourceSection {
    fn of_kind(kind: SourceKind, x: f32, y: f32) -> Self {
        let (output, recharge_ms, repair_time_ms) = match kind {
            SourceKind::Solar => (4.0, 5_000, 3_000),
            SourceKind::Wind => (6.0, 6_000, 4_000),
            SourceKind::Hydro => (8.0, 8_000, 5_000),
        };
        Self {
            kind,
            x,
            y,
            output,
            recharge_ms,
            repair_time_ms,
            noise_std: 0.1,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, thiserror::Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"grid.overload_threshold"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn default_consumers() -> Vec<ConsumerSection> {
    ConsumptionLedger::city_roster()
        .iter()
        .map(|c| ConsumerSection {
            name: c.name().to_string(),
            consumption_rate: c.consumption_rate,
            cadence_ms: c.cadence_ms,
            failure_penalty: c.failure_penalty,
        })
        .collect()
}

/// Two of each kind, spread across the play field.
fn default_sources() -> Vec<SourceSection> {
    vec![
        SourceSection::of_kind(SourceKind::Solar, 200.0, 200.0),
        SourceSection::of_kind(SourceKind::Solar, 300.0, 200.0),
        SourceSection::of_kind(SourceKind::Wind, 500.0, 250.0),
        SourceSection::of_kind(SourceKind::Wind, 600.0, 250.0),
        SourceSection::of_kind(SourceKind::Hydro, 350.0, 400.0),
        SourceSection::of_kind(SourceKind::Hydro, 450.0, 400.0),
    ]
}

impl ScenarioConfig {
    /// Returns the baseline scenario: the city roster and six sources.
    pub fn baseline() -> Self {
        Self {
            session: SessionSection::default(),
            grid: GridSection::default(),
            demand_spike: DemandSpikeSection::default(),
            obstacles: ObstacleSection::default(),
            repairer: RepairerSection::default(),
            consumers: default_consumers(),
            sources: default_sources(),
        }
    }

    /// Returns the heatwave preset: frequent, steep demand spikes and a
    /// hungrier city.
    pub fn heatwave() -> Self {
        let mut consumers = default_consumers();
        consumers.push(ConsumerSection {
            name: "Air conditioning".to_string(),
            consumption_rate: 4.0,
            cadence_ms: 8_000,
            failure_penalty: 1,
        });
        Self {
            grid: GridSection {
                base_consumption: 1.5,
                ..GridSection::default()
            },
            demand_spike: DemandSpikeSection {
                multiplier: 2.0,
                probability: 0.4,
                duration_ms: 10_000,
                ..DemandSpikeSection::default()
            },
            consumers,
            ..Self::baseline()
        }
    }

    /// Returns the fragile preset: frequent obstacles, slow repairs and a
    /// low failure tolerance.
    pub fn fragile() -> Self {
        let mut sources = default_sources();
        for s in &mut sources {
            s.repair_time_ms *= 2;
        }
        Self {
            grid: GridSection {
                max_failures: 3,
                ..GridSection::default()
            },
            obstacles: ObstacleSection {
                interval_ms: 12_000,
                warning_time_ms: 3_000,
                ..ObstacleSection::default()
            },
            repairer: RepairerSection {
                speed: 120.0,
                ..RepairerSection::default()
            },
            sources,
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "heatwave", "fragile"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "heatwave" => Ok(Self::heatwave()),
            "fragile" => Ok(Self::fragile()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid. A valid scenario
    /// never trips the constructor assertions of the built components.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let s = &self.session;
        if s.time_limit_ms == 0 {
            errors.push(ConfigError::new("session.time_limit_ms", "must be > 0"));
        }
        if s.tick_interval_ms == 0 {
            errors.push(ConfigError::new("session.tick_interval_ms", "must be > 0"));
        }
        if !s.energy_target.is_finite() || s.energy_target <= 0.0 {
            errors.push(ConfigError::new("session.energy_target", "must be finite and > 0"));
        }
        if s.controller != "idle" && s.controller != "greedy" {
            errors.push(ConfigError::new(
                "session.controller",
                format!("must be \"idle\" or \"greedy\", got \"{}\"", s.controller),
            ));
        }

        let g = &self.grid;
        for (field, value) in [
            ("grid.max_capacity", g.max_capacity),
            ("grid.overload_threshold", g.overload_threshold),
            ("grid.blackout_threshold", g.blackout_threshold),
            ("grid.initial_capacity", g.initial_capacity),
            ("grid.base_consumption", g.base_consumption),
        ] {
            if !value.is_finite() {
                errors.push(ConfigError::new(field, "must be finite"));
            }
        }
        if g.overload_threshold <= 0.0 {
            errors.push(ConfigError::new("grid.overload_threshold", "must be > 0"));
        }
        if g.overload_threshold >= g.blackout_threshold {
            errors.push(ConfigError::new(
                "grid.overload_threshold",
                "must be < grid.blackout_threshold",
            ));
        }
        if g.blackout_threshold > g.max_capacity {
            errors.push(ConfigError::new(
                "grid.blackout_threshold",
                "must be <= grid.max_capacity",
            ));
        }
        if !(0.0..=g.max_capacity).contains(&g.initial_capacity) {
            errors.push(ConfigError::new(
                "grid.initial_capacity",
                "must be in [0.0, grid.max_capacity]",
            ));
        }
        if g.base_consumption < 0.0 {
            errors.push(ConfigError::new("grid.base_consumption", "must be >= 0"));
        }
        if g.max_failures == 0 {
            errors.push(ConfigError::new("grid.max_failures", "must be > 0"));
        }

        let d = &self.demand_spike;
        if !d.multiplier.is_finite() || d.multiplier < 1.0 {
            errors.push(ConfigError::new(
                "demand_spike.multiplier",
                "must be finite and >= 1.0",
            ));
        }
        if !(0.0..=1.0).contains(&d.probability) {
            errors.push(ConfigError::new(
                "demand_spike.probability",
                "must be in [0.0, 1.0]",
            ));
        }
        if d.check_interval_ms == 0 {
            errors.push(ConfigError::new(
                "demand_spike.check_interval_ms",
                "must be > 0",
            ));
        }

        let o = &self.obstacles;
        if o.enabled && o.interval_ms == 0 {
            errors.push(ConfigError::new("obstacles.interval_ms", "must be > 0"));
        }
        if o.enabled && o.duration_ms == 0 {
            errors.push(ConfigError::new("obstacles.duration_ms", "must be > 0"));
        }

        let r = &self.repairer;
        if !r.x.is_finite() || !r.y.is_finite() {
            errors.push(ConfigError::new("repairer.position", "must be finite"));
        }
        if !r.range.is_finite() || r.range < 0.0 {
            errors.push(ConfigError::new("repairer.range", "must be finite and >= 0"));
        }
        if !r.speed.is_finite() || r.speed < 0.0 {
            errors.push(ConfigError::new("repairer.speed", "must be finite and >= 0"));
        }

        let mut names = HashSet::new();
        for (i, c) in self.consumers.iter().enumerate() {
            if c.name.trim().is_empty() {
                errors.push(ConfigError::new(format!("consumers[{i}].name"), "must not be empty"));
            } else if !names.insert(c.name.as_str()) {
                errors.push(ConfigError::new(
                    format!("consumers[{i}].name"),
                    format!("duplicate consumer \"{}\"", c.name),
                ));
            }
            if !c.consumption_rate.is_finite() || c.consumption_rate < 0.0 {
                errors.push(ConfigError::new(
                    format!("consumers[{i}].consumption_rate"),
                    "must be finite and >= 0",
                ));
            }
            if !(1..=g.max_failures.max(1)).contains(&c.failure_penalty) {
                errors.push(ConfigError::new(
                    format!("consumers[{i}].failure_penalty"),
                    "must be in [1, grid.max_failures]",
                ));
            }
            if c.cadence_ms == 0 {
                errors.push(ConfigError::new(format!("consumers[{i}].cadence_ms"), "must be > 0"));
            }
        }

        for (i, src) in self.sources.iter().enumerate() {
            if !src.output.is_finite() || src.output < 0.0 {
                errors.push(ConfigError::new(format!("sources[{i}].output"), "must be >= 0"));
            }
            if !src.noise_std.is_finite() || src.noise_std < 0.0 {
                errors.push(ConfigError::new(
                    format!("sources[{i}].noise_std"),
                    "must be finite and >= 0",
                ));
            }
            if !src.x.is_finite() || !src.y.is_finite() {
                errors.push(ConfigError::new(format!("sources[{i}].position"), "must be finite"));
            }
        }

        errors
    }

    /// Builds the session configuration.
    pub fn to_session_config(&self) -> SessionConfig {
        let s = &self.session;
        let g = &self.grid;
        let d = &self.demand_spike;
        let o = &self.obstacles;
        SessionConfig {
            seed: s.seed,
            role: s.role,
            time_limit_ms: s.time_limit_ms,
            energy_target: s.energy_target,
            tick_interval_ms: s.tick_interval_ms,
            spike_check_interval_ms: d.check_interval_ms,
            spike_duration_ms: d.duration_ms,
            grid: GridParams {
                max_capacity: g.max_capacity,
                overload_threshold: g.overload_threshold,
                blackout_threshold: g.blackout_threshold,
                initial_capacity: g.initial_capacity,
                base_consumption: g.base_consumption,
                demand_spike_multiplier: d.multiplier,
                spike_probability: d.probability,
                max_failures: g.max_failures,
            },
            obstacles: ObstacleParams {
                enabled: o.enabled,
                interval_ms: o.interval_ms,
                warning_time_ms: o.warning_time_ms,
                duration_ms: o.duration_ms,
            },
        }
    }

    /// Builds the consumer roster in configured order.
    pub fn build_ledger(&self) -> ConsumptionLedger {
        ConsumptionLedger::new(
            self.consumers
                .iter()
                .map(|c| {
                    ConsumerRecord::new(c.name.clone(), c.consumption_rate, c.cadence_ms)
                        .with_failure_penalty(c.failure_penalty)
                })
                .collect(),
        )
    }

    /// Builds the energy sources in configured order.
    pub fn build_sources(&self) -> Vec<EnergySource> {
        self.sources
            .iter()
            .map(|s| {
                EnergySource::new(
                    s.kind,
                    Position::new(s.x, s.y),
                    s.output,
                    s.recharge_ms,
                    s.repair_time_ms,
                )
                .with_noise(s.noise_std)
            })
            .collect()
    }

    /// Builds the repairer. Its time multiplier is set from the role by the session.
    pub fn build_repairer(&self) -> Repairer {
        let r = &self.repairer;
        Repairer::new(Position::new(r.x, r.y), r.range, r.speed, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = ScenarioConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
        assert!(e.to_string().starts_with("config error: preset:"));
    }

    #[test]
    fn baseline_uses_city_roster_and_six_sources() {
        let cfg = ScenarioConfig::baseline();
        let ledger = cfg.build_ledger();
        assert_eq!(ledger, ConsumptionLedger::city_roster());
        let sources = cfg.build_sources();
        assert_eq!(sources.len(), 6);
        for kind in [SourceKind::Solar, SourceKind::Wind, SourceKind::Hydro] {
            assert_eq!(sources.iter().filter(|s| s.kind == kind).count(), 2);
        }
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[session]
seed = 7
role = "engineer"
time_limit_ms = 60000
energy_target = 120.0
controller = "idle"

[grid]
max_capacity = 150.0
overload_threshold = 110.0
blackout_threshold = 140.0
initial_capacity = 40.0
base_consumption = 0.5
max_failures = 4

[demand_spike]
multiplier = 1.8
probability = 0.3

[obstacles]
enabled = false

[repairer]
x = 10.0
y = 20.0
range = 60.0
speed = 150.0

[[consumers]]
name = "School"
consumption_rate = 2.0
cadence_ms = 5000

[[consumers]]
name = "Mall"
consumption_rate = 6.0
cadence_ms = 12000
failure_penalty = 2

[[sources]]
kind = "wind"
x = 100.0
y = 100.0
output = 5.0
recharge_ms = 4000
repair_time_ms = 2500
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        let cfg = cfg.as_ref();
        assert_eq!(cfg.map(|c| c.session.role), Some(Role::Engineer));
        assert_eq!(cfg.map(|c| c.consumers.len()), Some(2));
        assert_eq!(cfg.map(|c| c.consumers[0].failure_penalty), Some(1));
        assert_eq!(cfg.map(|c| c.consumers[1].failure_penalty), Some(2));
        assert_eq!(cfg.map(|c| c.sources[0].kind), Some(SourceKind::Wind));
        assert!(cfg.map(|c| c.validate().is_empty()).unwrap_or(false));

        let session = cfg.map(ScenarioConfig::to_session_config);
        assert_eq!(session.as_ref().map(|s| s.grid.max_failures), Some(4));
        assert_eq!(
            session.as_ref().map(|s| s.grid.demand_spike_multiplier),
            Some(1.8)
        );
        assert_eq!(session.as_ref().map(|s| s.spike_check_interval_ms), Some(10_000));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[grid]
max_capacity = 100.0
bogus_field = true
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn unknown_role_rejected() {
        let toml = r#"
[session]
role = "mayor"
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn validation_catches_threshold_order() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.grid.overload_threshold = 100.0;
        cfg.grid.blackout_threshold = 90.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "grid.overload_threshold"));
    }

    #[test]
    fn validation_catches_blackout_above_max() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.grid.blackout_threshold = 120.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "grid.blackout_threshold"));
    }

    #[test]
    fn validation_catches_bad_probability() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.demand_spike.probability = 1.5;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "demand_spike.probability"));
    }

    #[test]
    fn validation_catches_bad_controller() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.session.controller = "bogus".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "session.controller"));
    }

    #[test]
    fn validation_catches_duplicate_consumer() {
        let mut cfg = ScenarioConfig::baseline();
        let dup = cfg.consumers[0].clone();
        cfg.consumers.push(dup);
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "consumers[3].name"));
    }

    #[test]
    fn validation_reports_every_error() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.session.tick_interval_ms = 0;
        cfg.grid.max_failures = 0;
        cfg.sources[0].output = -1.0;
        let fields: Vec<String> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "session.tick_interval_ms",
                "grid.max_failures",
                "sources[0].output"
            ]
        );
    }

    #[test]
    fn validation_rejects_non_finite_numbers() {
        let cases: [(&str, fn(&mut ScenarioConfig)); 14] = [
            ("session.energy_target", |c| c.session.energy_target = f32::INFINITY),
            ("grid.max_capacity", |c| c.grid.max_capacity = f32::INFINITY),
            ("grid.overload_threshold", |c| c.grid.overload_threshold = f32::NAN),
            ("grid.blackout_threshold", |c| c.grid.blackout_threshold = f32::NAN),
            ("grid.initial_capacity", |c| c.grid.initial_capacity = f32::NAN),
            ("grid.base_consumption", |c| c.grid.base_consumption = f32::NAN),
            ("demand_spike.multiplier", |c| c.demand_spike.multiplier = f32::INFINITY),
            ("demand_spike.probability", |c| c.demand_spike.probability = f32::NAN),
            ("repairer.range", |c| c.repairer.range = f32::INFINITY),
            ("repairer.speed", |c| c.repairer.speed = f32::NAN),
            ("repairer.position", |c| c.repairer.x = f32::NAN),
            ("consumers[0].consumption_rate", |c| {
                c.consumers[0].consumption_rate = f32::INFINITY
            }),
            ("sources[0].noise_std", |c| c.sources[0].noise_std = f32::NAN),
            ("sources[0].position", |c| c.sources[0].y = f32::INFINITY),
        ];
        for (field, corrupt) in cases {
            let mut cfg = ScenarioConfig::baseline();
            corrupt(&mut cfg);
            let errors = cfg.validate();
            assert!(
                errors.iter().any(|e| e.field == field),
                "{field} should be rejected: {errors:?}"
            );
        }
    }

    #[test]
    fn non_finite_toml_values_fail_validation() {
        let toml = r#"
[grid]
base_consumption = nan

[[consumers]]
name = "Stadium"
consumption_rate = inf
cadence_ms = 5000
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "TOML accepts nan and inf: {:?}", cfg.err());
        let fields: Vec<String> = cfg
            .map(|c| c.validate().into_iter().map(|e| e.field).collect())
            .unwrap_or_default();
        assert_eq!(
            fields,
            vec!["grid.base_consumption", "consumers[0].consumption_rate"]
        );
    }

    #[test]
    fn validation_bounds_failure_penalty() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.consumers[0].failure_penalty = 0;
        cfg.consumers[1].failure_penalty = u32::MAX;
        cfg.consumers[2].failure_penalty = cfg.grid.max_failures;
        let fields: Vec<String> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["consumers[0].failure_penalty", "consumers[1].failure_penalty"]
        );
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn heatwave_has_steeper_spikes() {
        let base = ScenarioConfig::baseline();
        let heat = ScenarioConfig::heatwave();
        assert!(heat.demand_spike.multiplier > base.demand_spike.multiplier);
        assert!(heat.demand_spike.probability > base.demand_spike.probability);
        assert!(heat.consumers.len() > base.consumers.len());
    }

    #[test]
    fn fragile_has_slower_repairs() {
        let base = ScenarioConfig::baseline();
        let fragile = ScenarioConfig::fragile();
        assert!(fragile.grid.max_failures < base.grid.max_failures);
        assert!(fragile.sources[0].repair_time_ms > base.sources[0].repair_time_ms);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[session]
seed = 99
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.session.seed), Some(99));
        assert_eq!(cfg.as_ref().map(|c| c.grid.max_capacity), Some(100.0));
        assert_eq!(cfg.as_ref().map(|c| c.consumers.len()), Some(3));
        assert_eq!(cfg.as_ref().map(|c| c.sources.len()), Some(6));
    }
}
