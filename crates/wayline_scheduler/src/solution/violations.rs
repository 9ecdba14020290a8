use fxhash::FxHashSet;
use jiff::SignedDuration;
use serde::Serialize;

/// Constraint breaches observed on a step or aggregated over a route.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    /// Service starts before the chosen window opens.
    LeadTime,
    /// Service starts after the chosen window closes.
    Delay,
    /// The load entering or leaving the step exceeds the vehicle capacity.
    Load,
    /// The vehicle lacks a skill the job requires.
    Skills,
    /// A shipment's pickup and delivery appear out of order, or one half is
    /// missing from the route.
    Precedence,
    /// A vehicle break never appears in the step sequence. Aggregate only:
    /// there is no step to attach it to.
    MissingBreak,
}

#[derive(Serialize, Debug, Clone)]
pub struct Violations {
    pub lead_time: SignedDuration,
    pub delay: SignedDuration,
    pub start_lead_time: SignedDuration,
    pub end_delay: SignedDuration,
    pub types: FxHashSet<ViolationKind>,
}

impl Violations {
    pub fn record_lead_time(&mut self, lead_time: SignedDuration) {
        self.types.insert(ViolationKind::LeadTime);
        self.lead_time += lead_time;
    }

    pub fn record_delay(&mut self, delay: SignedDuration) {
        self.types.insert(ViolationKind::Delay);
        self.delay += delay;
    }

    pub fn record(&mut self, kind: ViolationKind) {
        self.types.insert(kind);
    }

    pub fn contains(&self, kind: ViolationKind) -> bool {
        self.types.contains(&kind)
    }

    pub fn is_clean(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for Violations {
    fn default() -> Self {
        Violations {
            lead_time: SignedDuration::ZERO,
            delay: SignedDuration::ZERO,
            start_lead_time: SignedDuration::ZERO,
            end_delay: SignedDuration::ZERO,
            types: FxHashSet::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accumulates() {
        let mut violations = Violations::default();
        violations.record_lead_time(SignedDuration::from_secs(10));
        violations.record_lead_time(SignedDuration::from_secs(5));
        violations.record(ViolationKind::Load);

        assert_eq!(violations.lead_time, SignedDuration::from_secs(15));
        assert!(violations.contains(ViolationKind::LeadTime));
        assert!(violations.contains(ViolationKind::Load));
        assert!(!violations.contains(ViolationKind::Delay));
        assert!(!violations.is_clean());
    }
}
