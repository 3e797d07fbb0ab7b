//! Session engine that dispatches scheduled timers to the grid, the actors
//! and the obstacle system.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::actors::{Collector, RepairCompletion, RepairOutcome, RepairTicket, Repairer};
use crate::sources::{EnergySource, SourceArena, SourceId};

use super::clock::Scheduler;
use super::controller::{Action, Operator, SessionView};
use super::grid::Grid;
use super::ledger::ConsumptionLedger;
use super::notify::{GridEvent, Notifier};
use super::obstacle::{Obstacle, ObstacleKind};
use super::types::{SessionConfig, TickRecord};

/// Seed offset for the obstacle RNG so it does not track the spike draws.
const OBSTACLE_SEED_OFFSET: u64 = 17;
/// Seed offset for harvest noise.
const HARVEST_SEED_OFFSET: u64 = 31;

const WIN_MESSAGE: &str = "You won! The city runs on renewable energy.";
const TIME_UP_MESSAGE: &str = "Time is up! The city needs more energy.";

/// Timer payloads. Each variant is one scheduled callback.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionTimer {
    GridTick,
    SpikeCheck,
    SpikeEnd,
    ObstacleSpawn,
    ObstacleActivate,
    ObstacleEnd,
    RepairComplete {
        source: SourceId,
        ticket: RepairTicket,
    },
    TimeLimit,
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub message: String,
    pub success: bool,
    /// Virtual time at which the session ended (ms).
    pub at_ms: u64,
}

/// One game session.
///
/// Generic over the operator and notifier for static dispatch. All mutation
/// happens inside timer dispatch or the public actor operations, never
/// concurrently.
pub struct Session<O: Operator, N: Notifier> {
    config: SessionConfig,
    grid: Grid,
    sources: SourceArena,
    collector: Collector,
    repairer: Repairer,
    scheduler: Scheduler<SessionTimer>,
    spike_rng: StdRng,
    obstacle_rng: StdRng,
    harvest_rng: StdRng,
    operator: O,
    notifier: N,
    obstacle: Option<Obstacle>,
    outcome: Option<SessionOutcome>,
    records: Vec<TickRecord>,
}

impl<O: Operator, N: Notifier> Session<O, N> {
    /// Creates a session and arms its repeating timers.
    ///
    /// Role bonuses from `config.role` are applied here: the collector
    /// multiplier, the repairer's time multiplier, the obstacle interval
    /// and the grid's base consumption.
    ///
    /// # Arguments
    ///
    /// * `config` - Session configuration
    /// * `ledger` - Consumer roster
    /// * `sources` - Energy sources, in field order
    /// * `repairer` - The engineer (its multiplier is overridden by the role)
    /// * `operator` - Decision policy run after every grid tick
    /// * `notifier` - Receiver of warnings and the terminal message
    ///
    /// # Panics
    ///
    /// Panics if a timer interval in `config` is zero or the grid
    /// parameters are invalid.
    pub fn new(
        config: SessionConfig,
        ledger: ConsumptionLedger,
        sources: Vec<EnergySource>,
        mut repairer: Repairer,
        operator: O,
        notifier: N,
    ) -> Self {
        let bonus = config.role.bonus();

        let mut grid_params = config.grid.clone();
        grid_params.base_consumption /= bonus.grid_efficiency_multiplier;
        let grid = Grid::new(grid_params, ledger);

        let mut arena = SourceArena::with_capacity_and_key(sources.len());
        for source in sources {
            arena.insert(source);
        }

        repairer.repair_time_multiplier = bonus.repair_time_multiplier;

        let mut scheduler = Scheduler::new();
        scheduler.schedule_every(config.tick_interval_ms, SessionTimer::GridTick);
        scheduler.schedule_every(config.spike_check_interval_ms, SessionTimer::SpikeCheck);
        if config.obstacles.enabled {
            let interval =
                (config.obstacles.interval_ms as f32 * bonus.warning_time_multiplier) as u64;
            scheduler.schedule_every(interval, SessionTimer::ObstacleSpawn);
        }
        scheduler.schedule_once(config.time_limit_ms, SessionTimer::TimeLimit);

        tracing::info!(
            seed = config.seed,
            role = ?config.role,
            sources = arena.len(),
            consumers = grid.ledger().len(),
            "session created"
        );

        Self {
            spike_rng: StdRng::seed_from_u64(config.seed),
            obstacle_rng: StdRng::seed_from_u64(config.seed.wrapping_add(OBSTACLE_SEED_OFFSET)),
            harvest_rng: StdRng::seed_from_u64(config.seed.wrapping_add(HARVEST_SEED_OFFSET)),
            collector: Collector::new(bonus.collection_multiplier),
            config,
            grid,
            sources: arena,
            repairer,
            scheduler,
            operator,
            notifier,
            obstacle: None,
            outcome: None,
            records: Vec::new(),
        }
    }

    /// Dispatches every timer due up to `until_ms`, stopping early when the
    /// session ends.
    pub fn advance_to(&mut self, until_ms: u64) {
        while self.outcome.is_none() {
            let Some((now, timer)) = self.scheduler.pop_due(until_ms) else {
                break;
            };
            self.dispatch(now, timer);
        }
        if self.outcome.is_none() {
            self.scheduler.advance_to(until_ms);
        }
    }

    /// Runs until the session ends and returns the tick records.
    pub fn run(&mut self) -> Vec<TickRecord> {
        self.advance_to(self.config.time_limit_ms);
        self.records.clone()
    }

    fn dispatch(&mut self, now: u64, timer: SessionTimer) {
        match timer {
            SessionTimer::GridTick => self.on_grid_tick(now),
            SessionTimer::SpikeCheck => {
                if self.grid.check_demand_spike(&mut self.spike_rng) {
                    self.scheduler
                        .schedule_once(self.config.spike_duration_ms, SessionTimer::SpikeEnd);
                }
                self.flush_grid_events(now);
            }
            SessionTimer::SpikeEnd => {
                self.grid.end_demand_spike();
            }
            SessionTimer::ObstacleSpawn => self.spawn_obstacle(now),
            SessionTimer::ObstacleActivate => self.activate_obstacle(now),
            SessionTimer::ObstacleEnd => self.clear_obstacle(),
            SessionTimer::RepairComplete { source, ticket } => {
                self.complete_repair(source, ticket);
            }
            SessionTimer::TimeLimit => self.finish(now, TIME_UP_MESSAGE, false),
        }
    }

    fn on_grid_tick(&mut self, now: u64) {
        let consumption = self.grid.current_consumption();
        let tick = self.grid.tick(now);
        if tick.halted {
            return;
        }
        self.records.push(TickRecord {
            time_ms: now,
            capacity: self.grid.current_capacity(),
            consumption,
            status: self.grid.status(),
            demand_spike: self.grid.demand_spike_active(),
            failures: self.grid.building_failures(),
            serviced: tick.serviced.len(),
            shortfalls: tick.shortfalls,
            broken_sources: self.sources.values().filter(|s| s.is_broken()).count(),
            energy_collected: self.collector.collected(),
        });
        self.flush_grid_events(now);

        if self.outcome.is_none() {
            self.operate(now);
        }
    }

    fn operate(&mut self, now: u64) {
        let view = SessionView {
            now_ms: now,
            grid: &self.grid,
            sources: &self.sources,
            repairer: &self.repairer,
            collection_multiplier: self.collector.multiplier,
        };
        let actions = self.operator.plan(&view);
        for action in actions {
            if self.outcome.is_some() {
                break;
            }
            match action {
                Action::Collect(id) => {
                    self.collect(id);
                }
                Action::MoveRepairer(target) => {
                    self.repairer
                        .move_toward(target, self.config.tick_interval_ms);
                }
                Action::StartRepair(id) => {
                    self.start_repair(id);
                }
                Action::AbandonRepair => {
                    self.abandon_repair();
                }
            }
        }
    }

    /// Collector action: harvest `id` into the grid.
    ///
    /// Returns `true` if energy reached the grid. A safe no-op after the
    /// session ended.
    pub fn collect(&mut self, id: SourceId) -> bool {
        if self.outcome.is_some() {
            return false;
        }
        let now = self.scheduler.now_ms();
        let Some(source) = self.sources.get_mut(id) else {
            return false;
        };
        let collected =
            self.collector
                .collect(&mut self.grid, source, now, &mut self.harvest_rng);
        self.flush_grid_events(now);

        if collected.is_some()
            && self.outcome.is_none()
            && self.collector.collected() >= self.config.energy_target
        {
            self.finish(now, WIN_MESSAGE, true);
        }
        collected.is_some()
    }

    /// Repairer action: start repairing `id` and schedule the completion.
    pub fn start_repair(&mut self, id: SourceId) -> RepairOutcome {
        if self.outcome.is_some() {
            return RepairOutcome::SessionOver;
        }
        let now = self.scheduler.now_ms();
        let outcome = self.repairer.start_repair(&mut self.sources, id, now);
        if let RepairOutcome::Started(job) = outcome {
            self.scheduler.schedule_once(
                job.completes_at_ms - now,
                SessionTimer::RepairComplete {
                    source: job.source,
                    ticket: job.ticket,
                },
            );
        }
        outcome
    }

    /// Completion callback. Normally fired by the scheduler; stale
    /// completions are ignored.
    pub fn complete_repair(&mut self, id: SourceId, ticket: RepairTicket) -> RepairCompletion {
        if self.outcome.is_some() {
            return RepairCompletion::SessionOver;
        }
        self.repairer.complete_repair(&mut self.sources, id, ticket)
    }

    /// Drops the repairer's target. Its pending completion becomes stale.
    pub fn abandon_repair(&mut self) -> bool {
        if self.outcome.is_some() {
            return false;
        }
        self.repairer.abandon_repair(&mut self.sources).is_some()
    }

    /// Removes a source from the field. Pending repairs on it become stale.
    pub fn destroy_source(&mut self, id: SourceId) -> bool {
        if self.outcome.is_some() {
            return false;
        }
        self.sources.remove(id).is_some()
    }

    fn spawn_obstacle(&mut self, now: u64) {
        if self.obstacle.is_some() {
            return;
        }
        let kind = ObstacleKind::random(&mut self.obstacle_rng);
        let obstacle = Obstacle::announce(
            kind,
            now,
            self.config.obstacles.warning_time_ms,
            self.config.obstacles.duration_ms,
        );
        tracing::info!(
            obstacle = kind.label(),
            activates_at_ms = obstacle.activates_at_ms,
            "obstacle announced"
        );
        self.notifier.on_warning(&obstacle.warning());
        self.obstacle = Some(obstacle);
        self.scheduler.schedule_once(
            self.config.obstacles.warning_time_ms,
            SessionTimer::ObstacleActivate,
        );
    }

    fn activate_obstacle(&mut self, now: u64) {
        let Some(obstacle) = self.obstacle.filter(|o| o.is_active(now)) else {
            return;
        };
        let kind = obstacle.kind;

        if let Some(halted) = kind.halts() {
            for source in self.sources.values_mut().filter(|s| s.kind == halted) {
                source.set_halted(true);
            }
        }
        if let Some(target_kind) = kind.breaks() {
            let candidates: Vec<SourceId> = self
                .sources
                .iter()
                .filter(|(_, s)| s.kind == target_kind && !s.is_broken())
                .map(|(id, _)| id)
                .collect();
            if !candidates.is_empty() {
                let pick = candidates[self.obstacle_rng.random_range(0..candidates.len())];
                if let Some(source) = self.sources.get_mut(pick) {
                    source.break_down();
                    tracing::warn!(obstacle = kind.label(), source = %source.kind, "source broken");
                }
            }
        }

        tracing::info!(obstacle = kind.label(), "obstacle active");
        self.scheduler.schedule_once(
            obstacle.ends_at_ms - obstacle.activates_at_ms,
            SessionTimer::ObstacleEnd,
        );
    }

    fn clear_obstacle(&mut self) {
        if let Some(obstacle) = self.obstacle.take() {
            for source in self.sources.values_mut() {
                source.set_halted(false);
            }
            tracing::info!(obstacle = obstacle.kind.label(), "obstacle cleared");
        }
    }

    fn flush_grid_events(&mut self, now: u64) {
        for event in self.grid.take_events() {
            match &event {
                GridEvent::Warning(_) => self.notifier.dispatch(&event),
                GridEvent::Terminal { message, success } => {
                    let (message, success) = (message.clone(), *success);
                    self.finish(now, &message, success);
                }
            }
        }
    }

    /// Ends the session once; later calls are ignored.
    fn finish(&mut self, now: u64, message: &str, success: bool) {
        if self.outcome.is_some() {
            return;
        }
        tracing::info!(
            at_ms = now,
            success,
            message,
            failures = self.grid.building_failures(),
            shortfalls = self.grid.ledger().total_shortfalls(),
            "session over"
        );
        self.notifier.on_terminal(message, success);
        self.outcome = Some(SessionOutcome {
            message: message.to_string(),
            success,
            at_ms: now,
        });
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn sources(&self) -> &SourceArena {
        &self.sources
    }

    /// Source ids in field order.
    pub fn source_ids(&self) -> Vec<SourceId> {
        self.sources.keys().collect()
    }

    pub fn repairer(&self) -> &Repairer {
        &self.repairer
    }

    /// Mutable access for placing the repairer directly.
    pub fn repairer_mut(&mut self) -> &mut Repairer {
        &mut self.repairer
    }

    pub fn collector(&self) -> &Collector {
        &self.collector
    }

    pub fn active_obstacle(&self) -> Option<&Obstacle> {
        self.obstacle.as_ref()
    }

    pub fn records(&self) -> &[TickRecord] {
        &self.records
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}
