use std::time::Duration;

/// Thresholds for the two-phase idleness check. The first check confirms the
/// user has been away at all; the second runs after the debounce window and
/// so expects the original threshold plus the time the debounce took.
pub struct IdleGate {
    threshold: Duration,
    debounce: Duration,
}

impl IdleGate {
    pub fn from_seconds(threshold_s: u64, debounce_s: u64) -> Self {
        Self {
            threshold: Duration::from_secs(threshold_s),
            debounce: Duration::from_secs(debounce_s),
        }
    }

    pub fn confirms_idle(&self, idle_seconds: f64) -> bool {
        idle_seconds >= self.threshold.as_secs_f64()
    }

    pub fn confirms_sustained_idle(&self, idle_seconds: f64) -> bool {
        idle_seconds >= (self.threshold + self.debounce).as_secs_f64()
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }
}

#[cfg(test)]
mod gate_tests {
    use super::IdleGate;

    #[test]
    fn first_check_passes_exactly_at_the_threshold() {
        let gate = IdleGate::from_seconds(120, 2);
        assert!(!gate.confirms_idle(0.0));
        assert!(!gate.confirms_idle(119.9));
        assert!(gate.confirms_idle(120.0));
        assert!(gate.confirms_idle(150.0));
    }

    #[test]
    fn second_check_accounts_for_the_debounce_window() {
        let gate = IdleGate::from_seconds(120, 2);
        assert!(!gate.confirms_sustained_idle(0.5));
        assert!(!gate.confirms_sustained_idle(121.9));
        assert!(gate.confirms_sustained_idle(122.0));
        assert!(gate.confirms_sustained_idle(200.0));
    }
}
