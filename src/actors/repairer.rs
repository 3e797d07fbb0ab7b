//! Repairer actor: movement, repair jobs and stale-completion tracking.

use crate::sources::{Position, SourceArena, SourceId};

/// Identifies one repair attempt. Each start draws a new ticket, so a
/// completion for an abandoned attempt never matches the current job, even
/// on the same source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RepairTicket(u64);

/// The repairer's current target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepairJob {
    pub source: SourceId,
    pub ticket: RepairTicket,
    /// Virtual time at which the repair completes (ms).
    pub completes_at_ms: u64,
}

/// Result of a repair request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RepairOutcome {
    /// Repair accepted; the caller schedules completion at `completes_at_ms`.
    Started(RepairJob),
    /// The repairer already has a target.
    Busy,
    /// The source does not exist (never did, or destroyed).
    UnknownSource,
    /// The source is producing.
    NotBroken,
    /// Another repairer holds the source.
    AlreadyUnderRepair,
    /// The source is farther than the repair range.
    OutOfRange { distance: f32 },
    /// The session is over.
    SessionOver,
}

/// Result of a completion callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairCompletion {
    /// The source is producing again.
    Restored,
    /// The completion does not match the current job, or the source is gone.
    Stale,
    /// The session is over.
    SessionOver,
}

/// An engineer that walks to broken sources and repairs them.
///
/// Holds at most one target. Completion is validated against the current
/// job, never assumed.
#[derive(Debug, Clone)]
pub struct Repairer {
    pub position: Position,
    /// Maximum distance to a source for a repair to start.
    pub range: f32,
    /// Movement speed (units per second).
    pub speed: f32,
    /// Scales source repair time (role bonus).
    pub repair_time_multiplier: f32,
    job: Option<RepairJob>,
    next_ticket: u64,
    completed: u32,
}

impl Repairer {
    /// # Panics
    ///
    /// Panics if `range`, `speed` or `repair_time_multiplier` is negative.
    pub fn new(position: Position, range: f32, speed: f32, repair_time_multiplier: f32) -> Self {
        assert!(range >= 0.0 && speed >= 0.0 && repair_time_multiplier >= 0.0);
        Self {
            position,
            range,
            speed,
            repair_time_multiplier,
            job: None,
            next_ticket: 0,
            completed: 0,
        }
    }

    pub fn is_repairing(&self) -> bool {
        self.job.is_some()
    }

    pub fn current_job(&self) -> Option<RepairJob> {
        self.job
    }

    /// Number of repairs that restored a source.
    pub fn completed(&self) -> u32 {
        self.completed
    }

    /// Starts repairing `id` at `now_ms`.
    pub fn start_repair(&mut self, sources: &mut SourceArena, id: SourceId, now_ms: u64) -> RepairOutcome {
        if self.job.is_some() {
            return RepairOutcome::Busy;
        }
        let Some(source) = sources.get_mut(id) else {
            return RepairOutcome::UnknownSource;
        };
        if !source.is_broken() {
            return RepairOutcome::NotBroken;
        }
        if source.is_repairing() {
            return RepairOutcome::AlreadyUnderRepair;
        }
        let distance = self.position.distance(source.position);
        if distance > self.range {
            return RepairOutcome::OutOfRange { distance };
        }

        source.begin_repair();
        let dwell_ms = (source.repair_time_ms as f32 * self.repair_time_multiplier).round() as u64;
        let job = RepairJob {
            source: id,
            ticket: RepairTicket(self.next_ticket),
            completes_at_ms: now_ms + dwell_ms,
        };
        self.next_ticket += 1;
        self.job = Some(job);
        tracing::info!(kind = %source.kind, dwell_ms, "repair started");
        RepairOutcome::Started(job)
    }

    /// Completion callback for `(id, ticket)`.
    ///
    /// Restores the source only if it is still the current target and still
    /// exists. A destroyed target frees the repairer.
    pub fn complete_repair(
        &mut self,
        sources: &mut SourceArena,
        id: SourceId,
        ticket: RepairTicket,
    ) -> RepairCompletion {
        let Some(job) = self.job else {
            return RepairCompletion::Stale;
        };
        if job.source != id || job.ticket != ticket {
            tracing::debug!("stale repair completion ignored");
            return RepairCompletion::Stale;
        }
        self.job = None;
        match sources.get_mut(id) {
            Some(source) => {
                source.finish_repair();
                self.completed += 1;
                tracing::info!(kind = %source.kind, "repair completed");
                RepairCompletion::Restored
            }
            None => {
                tracing::debug!("repair target destroyed before completion");
                RepairCompletion::Stale
            }
        }
    }

    /// Drops the current target, releasing the source's repair claim.
    pub fn abandon_repair(&mut self, sources: &mut SourceArena) -> Option<RepairJob> {
        let job = self.job.take()?;
        if let Some(source) = sources.get_mut(job.source) {
            source.cancel_repair();
        }
        tracing::info!("repair abandoned");
        Some(job)
    }

    /// Walks toward `target` for `elapsed_ms`. Returns `false` while repairing.
    pub fn move_toward(&mut self, target: Position, elapsed_ms: u64) -> bool {
        if self.job.is_some() {
            return false;
        }
        let max_step = self.speed * elapsed_ms as f32 / 1000.0;
        self.position = self.position.step_toward(target, max_step);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{EnergySource, SourceKind};

    fn arena_with_broken(at: Position) -> (SourceArena, SourceId) {
        let mut arena = SourceArena::with_key();
        let mut source = EnergySource::new(SourceKind::Wind, at, 6.0, 6000, 4000);
        source.break_down();
        let id = arena.insert(source);
        (arena, id)
    }

    fn repairer() -> Repairer {
        Repairer::new(Position::new(0.0, 0.0), 50.0, 200.0, 1.0)
    }

    #[test]
    fn start_and_complete() {
        let (mut arena, id) = arena_with_broken(Position::new(30.0, 40.0));
        let mut r = repairer();
        let RepairOutcome::Started(job) = r.start_repair(&mut arena, id, 1000) else {
            panic!("repair should start");
        };
        assert_eq!(job.completes_at_ms, 5000);
        assert!(arena[id].is_repairing());

        assert_eq!(
            r.complete_repair(&mut arena, id, job.ticket),
            RepairCompletion::Restored
        );
        assert!(!arena[id].is_broken());
        assert!(!r.is_repairing());
        assert_eq!(r.completed(), 1);
    }

    #[test]
    fn multiplier_shortens_dwell() {
        let (mut arena, id) = arena_with_broken(Position::new(10.0, 0.0));
        let mut r = Repairer::new(Position::default(), 50.0, 200.0, 0.7);
        let outcome = r.start_repair(&mut arena, id, 0);
        assert!(matches!(outcome, RepairOutcome::Started(job) if job.completes_at_ms == 2800));
    }

    #[test]
    fn out_of_range_and_not_broken() {
        let (mut arena, id) = arena_with_broken(Position::new(100.0, 0.0));
        let mut r = repairer();
        assert_eq!(
            r.start_repair(&mut arena, id, 0),
            RepairOutcome::OutOfRange { distance: 100.0 }
        );

        let healthy = arena.insert(EnergySource::new(
            SourceKind::Solar,
            Position::default(),
            4.0,
            0,
            0,
        ));
        assert_eq!(r.start_repair(&mut arena, healthy, 0), RepairOutcome::NotBroken);
        assert!(!r.is_repairing());
    }

    #[test]
    fn one_target_per_repairer_and_one_repairer_per_source() {
        let (mut arena, id) = arena_with_broken(Position::new(10.0, 0.0));
        let mut other = arena[id].clone();
        other.cancel_repair();
        let second = arena.insert(other);

        let mut a = repairer();
        let mut b = repairer();
        assert!(matches!(a.start_repair(&mut arena, id, 0), RepairOutcome::Started(_)));
        assert_eq!(a.start_repair(&mut arena, second, 0), RepairOutcome::Busy);
        assert_eq!(
            b.start_repair(&mut arena, id, 0),
            RepairOutcome::AlreadyUnderRepair
        );
    }

    #[test]
    fn retarget_makes_old_completion_stale() {
        let (mut arena, id) = arena_with_broken(Position::new(10.0, 0.0));
        let mut r = repairer();
        let RepairOutcome::Started(first) = r.start_repair(&mut arena, id, 0) else {
            panic!("repair should start");
        };
        assert_eq!(r.abandon_repair(&mut arena), Some(first));
        assert!(!arena[id].is_repairing());

        let RepairOutcome::Started(second) = r.start_repair(&mut arena, id, 1000) else {
            panic!("repair should restart");
        };
        assert_ne!(first.ticket, second.ticket);

        assert_eq!(
            r.complete_repair(&mut arena, id, first.ticket),
            RepairCompletion::Stale
        );
        assert!(arena[id].is_broken());
        assert_eq!(
            r.complete_repair(&mut arena, id, second.ticket),
            RepairCompletion::Restored
        );
    }

    #[test]
    fn destroyed_source_completion_is_stale() {
        let (mut arena, id) = arena_with_broken(Position::new(10.0, 0.0));
        let mut r = repairer();
        let RepairOutcome::Started(job) = r.start_repair(&mut arena, id, 0) else {
            panic!("repair should start");
        };
        arena.remove(id);
        assert_eq!(
            r.complete_repair(&mut arena, id, job.ticket),
            RepairCompletion::Stale
        );
        assert!(!r.is_repairing());
        assert_eq!(r.start_repair(&mut arena, id, 0), RepairOutcome::UnknownSource);
    }

    #[test]
    fn cannot_move_while_repairing() {
        let (mut arena, id) = arena_with_broken(Position::new(10.0, 0.0));
        let mut r = repairer();
        assert!(r.move_toward(Position::new(100.0, 0.0), 100));
        assert_eq!(r.position, Position::new(20.0, 0.0));

        r.position = Position::default();
        r.start_repair(&mut arena, id, 0);
        assert!(!r.move_toward(Position::new(100.0, 0.0), 1000));
        assert_eq!(r.position, Position::default());
    }
}
