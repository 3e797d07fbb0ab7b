//! Post-hoc session summary computed from tick records.

use std::fmt;

use serde::Serialize;

use super::engine::SessionOutcome;
use super::grid::GridStatus;
use super::types::TickRecord;

/// Aggregate indicators for a complete session.
///
/// Computed from `&[TickRecord]` after the run so the report always agrees
/// with the exported telemetry.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    /// Grid ticks that ran.
    pub ticks: usize,
    /// Highest capacity at the end of a tick.
    pub peak_capacity: f32,
    /// Lowest capacity at the end of a tick.
    pub min_capacity: f32,
    /// Mean end-of-tick capacity.
    pub mean_capacity: f32,
    /// Ticks that ended overloaded.
    pub overloaded_ticks: usize,
    /// Ticks that ran under a demand spike.
    pub spike_ticks: usize,
    /// Consumer shortfalls across all ticks.
    pub total_shortfalls: usize,
    /// Failure counter after the last tick.
    pub final_failures: u32,
    /// Energy accepted by the grid from collection.
    pub energy_collected: f32,
    /// Repairs that restored a source.
    pub repairs_completed: u32,
    /// Terminal message, if the session ended.
    pub outcome: Option<String>,
    /// Whether the session ended in a win.
    pub success: bool,
    /// Virtual time at which the session ended (ms).
    pub ended_at_ms: Option<u64>,
}

impl SessionReport {
    /// Computes the report from the tick records.
    ///
    /// # Arguments
    ///
    /// * `records` - Every tick record of the session
    /// * `outcome` - How the session ended, if it did
    /// * `energy_collected` - Collector total (includes collection between ticks)
    /// * `repairs_completed` - Restored sources
    pub fn from_records(
        records: &[TickRecord],
        outcome: Option<&SessionOutcome>,
        energy_collected: f32,
        repairs_completed: u32,
    ) -> Self {
        let (outcome_message, success, ended_at_ms) = match outcome {
            Some(o) => (Some(o.message.clone()), o.success, Some(o.at_ms)),
            None => (None, false, None),
        };

        if records.is_empty() {
            return Self {
                ticks: 0,
                peak_capacity: 0.0,
                min_capacity: 0.0,
                mean_capacity: 0.0,
                overloaded_ticks: 0,
                spike_ticks: 0,
                total_shortfalls: 0,
                final_failures: 0,
                energy_collected,
                repairs_completed,
                outcome: outcome_message,
                success,
                ended_at_ms,
            };
        }

        let mut peak = f32::MIN;
        let mut min = f32::MAX;
        let mut sum = 0.0_f32;
        let mut overloaded = 0_usize;
        let mut spikes = 0_usize;
        let mut shortfalls = 0_usize;

        for r in records {
            peak = peak.max(r.capacity);
            min = min.min(r.capacity);
            sum += r.capacity;
            if r.status == GridStatus::Overloaded {
                overloaded += 1;
            }
            if r.demand_spike {
                spikes += 1;
            }
            shortfalls += r.shortfalls.len();
        }

        Self {
            ticks: records.len(),
            peak_capacity: peak,
            min_capacity: min,
            mean_capacity: sum / records.len() as f32,
            overloaded_ticks: overloaded,
            spike_ticks: spikes,
            total_shortfalls: shortfalls,
            final_failures: records.last().map_or(0, |r| r.failures),
            energy_collected,
            repairs_completed,
            outcome: outcome_message,
            success,
            ended_at_ms,
        }
    }
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Session Report ---")?;
        writeln!(f, "Ticks:                 {}", self.ticks)?;
        writeln!(
            f,
            "Capacity:              peak {:.2}, min {:.2}, mean {:.2}",
            self.peak_capacity, self.min_capacity, self.mean_capacity
        )?;
        writeln!(f, "Overloaded ticks:      {}", self.overloaded_ticks)?;
        writeln!(f, "Demand spike ticks:    {}", self.spike_ticks)?;
        writeln!(f, "Shortfalls:            {}", self.total_shortfalls)?;
        writeln!(f, "Building failures:     {}", self.final_failures)?;
        writeln!(f, "Energy collected:      {:.2}", self.energy_collected)?;
        writeln!(f, "Repairs completed:     {}", self.repairs_completed)?;
        match &self.outcome {
            Some(message) => write!(
                f,
                "Outcome:               {} ({})",
                message,
                if self.success { "win" } else { "loss" }
            ),
            None => write!(f, "Outcome:               running"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::grid::BlackoutCause;

    fn record(capacity: f32, status: GridStatus, shortfalls: &[&str]) -> TickRecord {
        TickRecord {
            time_ms: 0,
            capacity,
            consumption: 1.0,
            status,
            demand_spike: false,
            failures: 0,
            serviced: 0,
            shortfalls: shortfalls.iter().map(|s| s.to_string()).collect(),
            broken_sources: 0,
            energy_collected: 0.0,
        }
    }

    #[test]
    fn capacity_statistics() {
        let records = vec![
            record(20.0, GridStatus::Normal, &[]),
            record(85.0, GridStatus::Overloaded, &[]),
            record(50.0, GridStatus::Normal, &[]),
        ];
        let report = SessionReport::from_records(&records, None, 0.0, 0);
        assert_eq!(report.ticks, 3);
        assert_eq!(report.peak_capacity, 85.0);
        assert_eq!(report.min_capacity, 20.0);
        assert!((report.mean_capacity - 155.0 / 3.0).abs() < 1e-4);
        assert_eq!(report.overloaded_ticks, 1);
    }

    #[test]
    fn counts_shortfalls_and_last_failures() {
        let mut records = vec![
            record(3.0, GridStatus::Normal, &["Hospital"]),
            record(0.0, GridStatus::Blackout(BlackoutCause::Depleted), &["Factory", "Hospital"]),
        ];
        records[0].failures = 1;
        records[1].failures = 3;
        records[1].demand_spike = true;
        let report = SessionReport::from_records(&records, None, 12.0, 1);
        assert_eq!(report.total_shortfalls, 3);
        assert_eq!(report.final_failures, 3);
        assert_eq!(report.spike_ticks, 1);
        assert_eq!(report.repairs_completed, 1);
    }

    #[test]
    fn outcome_is_carried() {
        let outcome = SessionOutcome {
            message: "done".to_string(),
            success: true,
            at_ms: 4_000,
        };
        let report = SessionReport::from_records(&[], Some(&outcome), 300.0, 0);
        assert_eq!(report.ticks, 0);
        assert!(report.success);
        assert_eq!(report.ended_at_ms, Some(4_000));
        assert!(report.to_string().contains("done (win)"));
    }
}
