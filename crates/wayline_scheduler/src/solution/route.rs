use jiff::{SignedDuration, Timestamp};
use serde::Serialize;

use crate::{problem::amount::Amount, problem::location::LocationIdx, solution::violations::Violations};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepType {
    Start,
    Job,
    Break,
    End,
}

/// One scheduled entry of a route. `arrival` is when the vehicle reaches the
/// step, `service_start = arrival + waiting_time` is when work begins, and
/// `duration` is the travel accumulated since route start.
#[derive(Serialize, Debug, Clone)]
pub struct Step {
    pub step_type: StepType,
    /// Job or break external id; start and end steps have none.
    pub external_id: Option<String>,
    /// Breaks happen wherever the vehicle is, so they carry no location.
    pub location_id: Option<LocationIdx>,
    pub load: Amount,
    pub service: SignedDuration,
    pub duration: SignedDuration,
    pub arrival: Timestamp,
    pub waiting_time: SignedDuration,
    pub violations: Violations,
}

impl Step {
    pub fn service_start(&self) -> Timestamp {
        self.arrival + self.waiting_time
    }
}

/// A fully scheduled single-vehicle route with per-step timing and complete
/// violation accounting.
#[derive(Serialize, Debug, Clone)]
pub struct Route {
    pub vehicle_id: String,
    pub steps: Vec<Step>,
    pub cost: SignedDuration,
    pub service: SignedDuration,
    pub duration: SignedDuration,
    pub waiting_time: SignedDuration,
    pub priority: u32,
    pub deliveries: Amount,
    pub pickups: Amount,
    pub description: Option<String>,
    pub violations: Violations,
}
