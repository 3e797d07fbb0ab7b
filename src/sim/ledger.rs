//! Per-consumer bookkeeping for scheduled grid demand.

/// One registered consumer (hospital, charging station, factory, ...).
///
/// Only the service bookkeeping mutates during a session; name, rate and
/// cadence are fixed when the roster is built.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumerRecord {
    name: String,
    /// Energy drawn per service at baseline demand.
    pub consumption_rate: f32,
    /// Minimum interval between two services (ms).
    pub cadence_ms: u64,
    /// Virtual time of the last service attempt, successful or not (ms).
    pub last_serviced_at: u64,
    /// Weight added to the global failure counter per shortfall.
    pub failure_penalty: u32,
    /// Successful services so far.
    pub services: u32,
    /// Shortfalls so far.
    pub shortfalls: u32,
}

impl ConsumerRecord {
    /// Creates a consumer with a failure penalty of 1.
    ///
    /// # Panics
    ///
    /// Panics if `consumption_rate` is negative or not finite.
    pub fn new(name: impl Into<String>, consumption_rate: f32, cadence_ms: u64) -> Self {
        assert!(consumption_rate.is_finite() && consumption_rate >= 0.0);
        Self {
            name: name.into(),
            consumption_rate,
            cadence_ms,
            last_serviced_at: 0,
            failure_penalty: 1,
            services: 0,
            shortfalls: 0,
        }
    }

    /// Overrides the failure penalty.
    pub fn with_failure_penalty(mut self, failure_penalty: u32) -> Self {
        self.failure_penalty = failure_penalty;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` once at least `cadence_ms` has elapsed since the last attempt.
    pub fn is_due(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_serviced_at) >= self.cadence_ms
    }

    /// Demand for this service, scaled while a demand spike is active.
    pub fn effective_demand(&self, spike_multiplier: Option<f32>) -> f32 {
        match spike_multiplier {
            Some(m) => self.consumption_rate * m,
            None => self.consumption_rate,
        }
    }

    /// Marks a successful service at `now_ms`.
    pub fn record_service(&mut self, now_ms: u64) {
        self.services += 1;
        self.last_serviced_at = now_ms;
    }

    /// Marks a shortfall at `now_ms` and returns the penalty to add to the
    /// failure counter.
    pub fn record_shortfall(&mut self, now_ms: u64) -> u32 {
        self.shortfalls += 1;
        self.last_serviced_at = now_ms;
        self.failure_penalty
    }
}

/// The fixed consumer roster, serviced in list order every tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsumptionLedger {
    consumers: Vec<ConsumerRecord>,
}

impl ConsumptionLedger {
    pub fn new(consumers: Vec<ConsumerRecord>) -> Self {
        Self { consumers }
    }

    /// The city roster: hospital, EV charging station and factory.
    pub fn city_roster() -> Self {
        Self::new(vec![
            ConsumerRecord::new("Hospital", 5.0, 10_000),
            ConsumerRecord::new("EV charging station", 3.0, 10_000),
            ConsumerRecord::new("Factory", 10.0, 15_000),
        ])
    }

    pub fn len(&self) -> usize {
        self.consumers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConsumerRecord> {
        self.consumers.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ConsumerRecord> {
        self.consumers.iter_mut()
    }

    /// Looks a consumer up by name.
    pub fn get(&self, name: &str) -> Option<&ConsumerRecord> {
        self.consumers.iter().find(|c| c.name == name)
    }

    /// Sum of shortfalls across all consumers.
    pub fn total_shortfalls(&self) -> u32 {
        self.consumers.iter().map(|c| c.shortfalls).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_consumer_defaults() {
        let c = ConsumerRecord::new("Hospital", 5.0, 10_000);
        assert_eq!(c.name(), "Hospital");
        assert_eq!(c.failure_penalty, 1);
        assert_eq!(c.last_serviced_at, 0);
        assert_eq!(c.services, 0);
    }

    #[test]
    #[should_panic]
    fn negative_rate_panics() {
        ConsumerRecord::new("Broken", -1.0, 1000);
    }

    #[test]
    fn due_after_cadence_elapses() {
        let mut c = ConsumerRecord::new("Factory", 10.0, 15_000);
        assert!(!c.is_due(14_999));
        assert!(c.is_due(15_000));
        c.record_service(15_000);
        assert!(!c.is_due(29_999));
        assert!(c.is_due(30_000));
    }

    #[test]
    fn shortfall_also_resets_window() {
        let mut c = ConsumerRecord::new("Hospital", 5.0, 10_000).with_failure_penalty(2);
        assert_eq!(c.record_shortfall(10_000), 2);
        assert_eq!(c.last_serviced_at, 10_000);
        assert_eq!(c.shortfalls, 1);
        assert!(!c.is_due(19_000));
    }

    #[test]
    fn spike_scales_demand() {
        let c = ConsumerRecord::new("Hospital", 5.0, 10_000);
        assert_eq!(c.effective_demand(None), 5.0);
        assert_eq!(c.effective_demand(Some(1.5)), 7.5);
    }

    #[test]
    fn city_roster_order_is_fixed() {
        let ledger = ConsumptionLedger::city_roster();
        let names: Vec<&str> = ledger.iter().map(ConsumerRecord::name).collect();
        assert_eq!(names, vec!["Hospital", "EV charging station", "Factory"]);
        assert_eq!(ledger.get("Factory").map(|c| c.cadence_ms), Some(15_000));
    }
}
