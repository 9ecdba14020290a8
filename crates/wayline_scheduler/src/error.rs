use thiserror::Error;

/// Failures surfaced by the scheduling core.
///
/// Violated-but-solvable routes are not errors: they come back as a
/// [`Route`](crate::solution::Route) whose violation records describe what is
/// wrong. An error means no schedule exists at all for the given sequence.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// The step sequence admits no service-time assignment: either the
    /// propagated bounds cross, or the program is infeasible, or the solver
    /// gave up without a defined status.
    #[error("Infeasible route for vehicle {vehicle_id}.")]
    InfeasibleRoute { vehicle_id: String },
}
