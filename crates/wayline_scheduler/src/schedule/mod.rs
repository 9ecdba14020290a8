//! Validation and earliest-start scheduling of a fixed step sequence.
//!
//! Given a vehicle and the ordered steps it is supposed to run (jobs plus
//! on-duty breaks between a start and an end marker), this module either
//! proves the sequence unschedulable or returns a [`Route`] with every
//! service start assigned and every constraint breach accounted for. The
//! assignment minimizes total violations first, then makespan, then settles
//! on the earliest reasonable schedule.

mod backend;
mod milp;
mod program;
mod reconstruct;
mod step;
mod timeline;

use fxhash::FxHashSet;
use rayon::prelude::*;
use tracing::{Level, instrument};

use crate::{
    error::ScheduleError,
    problem::{job::JobIdx, routing_problem::RoutingProblem, vehicle::VehicleIdx},
    schedule::{backend::GoodLpBackend, program::ScheduleProgram, timeline::Timeline},
    solution::Route,
};

pub use step::{ForcedService, InputStep, StepKind};

/// Schedules one vehicle's step sequence. Jobs that make it onto the
/// returned route are removed from `unassigned`.
///
/// The sequence must open with a start step, close with an end step, and
/// contain at least one job in between.
#[instrument(skip_all, level = Level::DEBUG, fields(vehicle = %vehicle_index, steps = steps.len()))]
pub fn schedule_route(
    problem: &RoutingProblem,
    vehicle_index: VehicleIdx,
    steps: &[InputStep],
    unassigned: &mut FxHashSet<JobIdx>,
) -> Result<Route, ScheduleError> {
    debug_assert!(steps.len() > 2);
    debug_assert!(steps.first().is_some_and(|s| s.kind() == StepKind::Start));
    debug_assert!(steps.last().is_some_and(|s| s.kind() == StepKind::End));

    let vehicle = problem.vehicle(vehicle_index);
    let infeasible = || ScheduleError::InfeasibleRoute {
        vehicle_id: vehicle.external_id().to_string(),
    };

    let timeline = Timeline::build(problem, vehicle, steps).map_err(|_| infeasible())?;
    let program = ScheduleProgram::build(problem, vehicle, steps, &timeline);
    let values = program.solve(&GoodLpBackend).map_err(|_| infeasible())?;

    Ok(reconstruct::build_route(problem, vehicle_index, steps, &values, unassigned))
}

/// Schedules many vehicles concurrently, one solver instance per worker.
/// Jobs on successfully scheduled routes are removed from `unassigned` once
/// all workers have finished.
pub fn schedule_routes(
    problem: &RoutingProblem,
    assignments: &[(VehicleIdx, Vec<InputStep>)],
    unassigned: &mut FxHashSet<JobIdx>,
) -> Vec<Result<Route, ScheduleError>> {
    let results: Vec<Result<Route, ScheduleError>> = assignments
        .par_iter()
        .map(|(vehicle_index, steps)| {
            let mut scheduled = FxHashSet::default();
            schedule_route(problem, *vehicle_index, steps, &mut scheduled)
        })
        .collect();

    for (result, (_, steps)) in results.iter().zip(assignments) {
        if result.is_ok() {
            for step in steps {
                if let StepKind::Job(index) = step.kind() {
                    unassigned.remove(&index);
                }
            }
        }
    }

    results
}
