use jiff::Timestamp;
use serde::Serialize;

use crate::problem::{job::JobIdx, vehicle::BreakIdx};

/// External pinning of a step's service start, carried over from a solution
/// being re-validated: `at` fixes it exactly, `after`/`before` bound it.
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForcedService {
    pub at: Option<Timestamp>,
    pub after: Option<Timestamp>,
    pub before: Option<Timestamp>,
}

impl ForcedService {
    pub(crate) fn timestamps(&self) -> impl Iterator<Item = Timestamp> + '_ {
        [self.at, self.after, self.before].into_iter().flatten()
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Start,
    Job(JobIdx),
    Break(BreakIdx),
    End,
}

/// One entry of the fixed step sequence handed to the scheduler. The sequence
/// always begins with a start step and ends with an end step, even when the
/// vehicle has no physical start or end location.
#[derive(Serialize, Debug, Clone, Copy)]
pub struct InputStep {
    kind: StepKind,
    forced_service: ForcedService,
}

impl InputStep {
    pub fn start() -> Self {
        InputStep { kind: StepKind::Start, forced_service: ForcedService::default() }
    }

    pub fn end() -> Self {
        InputStep { kind: StepKind::End, forced_service: ForcedService::default() }
    }

    pub fn job(index: impl Into<JobIdx>) -> Self {
        InputStep { kind: StepKind::Job(index.into()), forced_service: ForcedService::default() }
    }

    pub fn vehicle_break(index: impl Into<BreakIdx>) -> Self {
        InputStep { kind: StepKind::Break(index.into()), forced_service: ForcedService::default() }
    }

    pub fn with_forced_service(mut self, forced_service: ForcedService) -> Self {
        self.forced_service = forced_service;
        self
    }

    pub fn with_service_at(mut self, at: Timestamp) -> Self {
        self.forced_service.at = Some(at);
        self
    }

    pub fn kind(&self) -> StepKind {
        self.kind
    }

    pub fn forced_service(&self) -> &ForcedService {
        &self.forced_service
    }

    pub fn is_break(&self) -> bool {
        matches!(self.kind, StepKind::Break(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forced_service_timestamps() {
        let forced = ForcedService {
            at: Some(Timestamp::from_second(100).unwrap()),
            after: None,
            before: Some(Timestamp::from_second(200).unwrap()),
        };

        let seen: Vec<_> = forced.timestamps().collect();
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_step_constructors() {
        assert_eq!(InputStep::start().kind(), StepKind::Start);
        assert_eq!(InputStep::job(3usize).kind(), StepKind::Job(JobIdx::new(3)));
        assert!(InputStep::vehicle_break(0usize).is_break());
        assert_eq!(InputStep::end().kind(), StepKind::End);
    }
}
