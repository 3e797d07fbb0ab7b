//! Operators decide what the actors do on each grid tick.

use crate::actors::Repairer;
use crate::sources::{Position, SourceArena, SourceId};

use super::grid::Grid;

/// Read-only snapshot handed to an operator.
pub struct SessionView<'a> {
    pub now_ms: u64,
    pub grid: &'a Grid,
    pub sources: &'a SourceArena,
    pub repairer: &'a Repairer,
    /// Collector multiplier, so operators can project collected amounts.
    pub collection_multiplier: f32,
}

/// An actor command, applied by the session in the order returned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Collect(SourceId),
    MoveRepairer(Position),
    StartRepair(SourceId),
    AbandonRepair,
}

/// Decision policy for the actors.
pub trait Operator {
    fn plan(&mut self, view: &SessionView<'_>) -> Vec<Action>;
}

/// Does nothing; the grid runs on its initial charge.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdleOperator;

impl Operator for IdleOperator {
    fn plan(&mut self, _view: &SessionView<'_>) -> Vec<Action> {
        Vec::new()
    }
}

/// Greedy heuristic operator.
///
/// Collects from every ready source as long as the projected capacity stays
/// `headroom` below the overload threshold, and sends the repairer to the
/// nearest unclaimed broken source.
#[derive(Debug, Clone, Copy)]
pub struct GreedyOperator {
    pub headroom: f32,
}

impl Default for GreedyOperator {
    fn default() -> Self {
        Self { headroom: 5.0 }
    }
}

impl GreedyOperator {
    pub fn new(headroom: f32) -> Self {
        Self { headroom }
    }

    fn plan_collection(&self, view: &SessionView<'_>, actions: &mut Vec<Action>) {
        let ceiling = view.grid.params().overload_threshold - self.headroom;
        let mut projected = view.grid.current_capacity();
        for (id, source) in view.sources.iter() {
            if !source.can_produce(view.now_ms) {
                continue;
            }
            let amount = source.output * view.collection_multiplier;
            if projected + amount < ceiling {
                projected += amount;
                actions.push(Action::Collect(id));
            }
        }
    }

    fn plan_repair(&self, view: &SessionView<'_>, actions: &mut Vec<Action>) {
        if view.repairer.is_repairing() {
            return;
        }
        let here = view.repairer.position;
        let target = view
            .sources
            .iter()
            .filter(|(_, s)| s.is_broken() && !s.is_repairing())
            .map(|(id, s)| (id, s.position, here.distance(s.position)))
            .min_by(|a, b| a.2.total_cmp(&b.2));

        if let Some((id, position, distance)) = target {
            if distance <= view.repairer.range {
                actions.push(Action::StartRepair(id));
            } else {
                actions.push(Action::MoveRepairer(position));
            }
        }
    }
}

impl Operator for GreedyOperator {
    fn plan(&mut self, view: &SessionView<'_>) -> Vec<Action> {
        let mut actions = Vec::new();
        self.plan_collection(view, &mut actions);
        self.plan_repair(view, &mut actions);
        actions
    }
}
