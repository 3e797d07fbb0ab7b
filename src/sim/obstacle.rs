//! Environmental obstacles that halt or break energy sources.

use rand::Rng;

use crate::sources::SourceKind;

/// Environmental event that disturbs production for a while.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleKind {
    /// Halts solar panels and breaks one wind turbine.
    Storm,
    /// Halts wind turbines.
    Calm,
    /// Halts hydro dams.
    Drought,
    /// Breaks one hydro dam.
    Flood,
}

impl ObstacleKind {
    pub const ALL: [ObstacleKind; 4] = [
        ObstacleKind::Storm,
        ObstacleKind::Calm,
        ObstacleKind::Drought,
        ObstacleKind::Flood,
    ];

    /// Picks a kind uniformly at random.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    pub fn label(self) -> &'static str {
        match self {
            ObstacleKind::Storm => "Storm",
            ObstacleKind::Calm => "Calm",
            ObstacleKind::Drought => "Drought",
            ObstacleKind::Flood => "Flood",
        }
    }

    /// Source kind whose output stops while the obstacle is active.
    pub fn halts(self) -> Option<SourceKind> {
        match self {
            ObstacleKind::Storm => Some(SourceKind::Solar),
            ObstacleKind::Calm => Some(SourceKind::Wind),
            ObstacleKind::Drought => Some(SourceKind::Hydro),
            ObstacleKind::Flood => None,
        }
    }

    /// Source kind of which one producing instance breaks on activation.
    pub fn breaks(self) -> Option<SourceKind> {
        match self {
            ObstacleKind::Storm => Some(SourceKind::Wind),
            ObstacleKind::Flood => Some(SourceKind::Hydro),
            ObstacleKind::Calm | ObstacleKind::Drought => None,
        }
    }
}

/// An announced obstacle with its active window `[activates_at_ms, ends_at_ms)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub kind: ObstacleKind,
    /// Activation time (inclusive).
    pub activates_at_ms: u64,
    /// End time (exclusive).
    pub ends_at_ms: u64,
}

impl Obstacle {
    /// Announces an obstacle at `now_ms` that activates after `warning_ms`
    /// and lasts `duration_ms`.
    ///
    /// # Panics
    ///
    /// Panics if `duration_ms` is zero.
    pub fn announce(kind: ObstacleKind, now_ms: u64, warning_ms: u64, duration_ms: u64) -> Self {
        assert!(duration_ms > 0);
        let activates_at_ms = now_ms + warning_ms;
        Self {
            kind,
            activates_at_ms,
            ends_at_ms: activates_at_ms + duration_ms,
        }
    }

    /// Returns `true` when `now_ms` falls within the active window.
    pub fn is_active(&self, now_ms: u64) -> bool {
        now_ms >= self.activates_at_ms && now_ms < self.ends_at_ms
    }

    /// Warning shown when the obstacle is announced.
    pub fn warning(&self) -> String {
        format!("{} approaching!", self.kind.label())
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn active_only_inside_window() {
        let o = Obstacle::announce(ObstacleKind::Storm, 20_000, 5_000, 10_000);
        assert!(!o.is_active(24_999));
        assert!(o.is_active(25_000));
        assert!(o.is_active(34_999));
        assert!(!o.is_active(35_000));
    }

    #[test]
    fn every_kind_has_an_effect() {
        for kind in ObstacleKind::ALL {
            assert!(kind.halts().is_some() || kind.breaks().is_some());
        }
    }

    #[test]
    fn random_kind_is_seeded() {
        let mut a = StdRng::seed_from_u64(3);
        let mut b = StdRng::seed_from_u64(3);
        for _ in 0..10 {
            assert_eq!(ObstacleKind::random(&mut a), ObstacleKind::random(&mut b));
        }
    }

    #[test]
    fn warning_names_the_obstacle() {
        let o = Obstacle::announce(ObstacleKind::Flood, 0, 1, 1);
        assert_eq!(o.warning(), "Flood approaching!");
    }
}
