use fxhash::{FxHashMap, FxHashSet};
use jiff::SignedDuration;
use tracing::warn;

use crate::{
    problem::{
        job::{JobIdx, JobKind},
        routing_problem::RoutingProblem,
        vehicle::VehicleIdx,
    },
    schedule::{
        program::ScheduleValues,
        step::{InputStep, StepKind},
    },
    solution::{Route, Step, StepType, ViolationKind, Violations},
};

/// Walks the input sequence once more with the solved times in hand and
/// emits the annotated route: arrivals, waits, cumulative travel, running
/// load, per-step violations, and the aggregate accounting. Ghost start and
/// end steps are suppressed; their violations fold into the aggregates.
pub(crate) fn build_route(
    problem: &RoutingProblem,
    vehicle_index: VehicleIdx,
    steps: &[InputStep],
    values: &ScheduleValues,
    unassigned: &mut FxHashSet<JobIdx>,
) -> Route {
    let vehicle = problem.vehicle(vehicle_index);

    let mut duration = SignedDuration::ZERO;
    let mut service = SignedDuration::ZERO;
    let mut forward_wt = SignedDuration::ZERO;
    let mut priority = 0;
    let mut sum_pickups = problem.zero_amount();
    let mut sum_deliveries = problem.zero_amount();
    let mut aggregate = Violations::default();

    // The vehicle leaves loaded with every delivery of the plain jobs it
    // will serve; shipment pickups come aboard along the way.
    let mut current_load = problem.zero_amount();
    for step in steps {
        if let StepKind::Job(index) = step.kind() {
            let job = problem.job(index);
            if job.kind() == JobKind::Single {
                current_load += job.delivery();
            }
        }
    }
    let mut previous_over_capacity = !current_load.fits_within(vehicle.capacity());

    let mut expected_delivery_ranks: FxHashSet<JobIdx> = FxHashSet::default();
    let mut delivery_first_ranks: FxHashSet<JobIdx> = FxHashSet::default();
    let mut pickup_step_of_delivery: FxHashMap<JobIdx, usize> = FxHashMap::default();

    let mut missing_break_ids: FxHashSet<&str> =
        vehicle.breaks().iter().map(|b| b.external_id()).collect();

    let mut sol_steps: Vec<Step> = Vec::new();

    debug_assert!(vehicle.has_start() || values.start_travel.is_zero());

    if vehicle.has_start() {
        let mut violations = Violations::default();
        if let Some(shift_start) = vehicle.shift().start()
            && values.route_start < shift_start
        {
            let lead_time = shift_start.duration_since(values.route_start);
            violations.record_lead_time(lead_time);
            aggregate.record_lead_time(lead_time);
        }
        if previous_over_capacity {
            violations.record(ViolationKind::Load);
            aggregate.record(ViolationKind::Load);
        }

        sol_steps.push(Step {
            step_type: StepType::Start,
            external_id: None,
            location_id: vehicle.start_location(),
            load: current_load.clone(),
            service: SignedDuration::ZERO,
            duration: SignedDuration::ZERO,
            arrival: values.route_start,
            waiting_time: SignedDuration::ZERO,
            violations,
        });
    } else {
        // No step to attach the startup violation to.
        aggregate.lead_time += values.start_lead_time;
    }

    let mut previous_start = values.route_start;
    let mut previous_service = SignedDuration::ZERO;
    let mut previous_travel = values.start_travel;
    let mut task_rank = 0;

    for step in steps {
        match step.kind() {
            StepKind::Start => {}
            StepKind::Job(job_rank) => {
                let job = problem.job(job_rank);

                service += job.service();
                priority += job.priority();

                current_load += job.pickup();
                current_load -= job.delivery();
                sum_pickups += job.pickup();
                sum_deliveries += job.delivery();

                duration += previous_travel;

                let arrival = previous_start + previous_service + previous_travel;
                let service_start = values.task_etas[task_rank];
                debug_assert!(arrival <= service_start);
                let waiting_time =
                    service_start.duration_since(arrival).max(SignedDuration::ZERO);
                forward_wt += waiting_time;

                let mut violations = Violations::default();
                let window = job.time_windows().get(values.task_window_ranks[task_rank]);
                if let Some(start) = window.start()
                    && service_start < start
                {
                    let lead_time = start.duration_since(service_start);
                    violations.record_lead_time(lead_time);
                    aggregate.record_lead_time(lead_time);
                }
                if let Some(end) = window.end()
                    && end < service_start
                {
                    let delay = service_start.duration_since(end);
                    violations.record_delay(delay);
                    aggregate.record_delay(delay);
                }

                let over_capacity = !current_load.fits_within(vehicle.capacity());
                if previous_over_capacity || over_capacity {
                    violations.record(ViolationKind::Load);
                    aggregate.record(ViolationKind::Load);
                }
                previous_over_capacity = over_capacity;

                if !problem.vehicle_ok_with_job(vehicle_index, job_rank) {
                    violations.record(ViolationKind::Skills);
                    aggregate.record(ViolationKind::Skills);
                }

                match job.kind() {
                    JobKind::Single => {}
                    JobKind::Pickup => {
                        if delivery_first_ranks.contains(&job_rank.delivery_sibling()) {
                            violations.record(ViolationKind::Precedence);
                            aggregate.record(ViolationKind::Precedence);
                        } else {
                            expected_delivery_ranks.insert(job_rank.delivery_sibling());
                            pickup_step_of_delivery
                                .insert(job_rank.delivery_sibling(), sol_steps.len());
                        }
                    }
                    JobKind::Delivery => {
                        if !expected_delivery_ranks.remove(&job_rank) {
                            violations.record(ViolationKind::Precedence);
                            aggregate.record(ViolationKind::Precedence);
                            delivery_first_ranks.insert(job_rank);
                        }
                    }
                }

                sol_steps.push(Step {
                    step_type: StepType::Job,
                    external_id: Some(job.external_id().to_string()),
                    location_id: Some(job.location_id()),
                    load: current_load.clone(),
                    service: job.service(),
                    duration,
                    arrival,
                    waiting_time,
                    violations,
                });

                unassigned.remove(&job_rank);
                previous_start = service_start;
                previous_service = job.service();
                previous_travel = values.task_travels[task_rank];
                task_rank += 1;
            }
            StepKind::Break(break_rank) => {
                let vehicle_break = &vehicle.breaks()[break_rank];

                missing_break_ids.remove(vehicle_break.external_id());
                service += vehicle_break.service();

                duration += previous_travel;

                let arrival = previous_start + previous_service + previous_travel;
                let service_start = values.task_etas[task_rank];
                debug_assert!(arrival <= service_start);
                let waiting_time =
                    service_start.duration_since(arrival).max(SignedDuration::ZERO);
                forward_wt += waiting_time;

                let mut violations = Violations::default();
                let window =
                    vehicle_break.time_windows().get(values.task_window_ranks[task_rank]);
                if let Some(start) = window.start()
                    && service_start < start
                {
                    let lead_time = start.duration_since(service_start);
                    violations.record_lead_time(lead_time);
                    aggregate.record_lead_time(lead_time);
                }
                if let Some(end) = window.end()
                    && end < service_start
                {
                    let delay = service_start.duration_since(end);
                    violations.record_delay(delay);
                    aggregate.record_delay(delay);
                }
                if previous_over_capacity {
                    violations.record(ViolationKind::Load);
                    aggregate.record(ViolationKind::Load);
                }

                sol_steps.push(Step {
                    step_type: StepType::Break,
                    external_id: Some(vehicle_break.external_id().to_string()),
                    location_id: None,
                    load: current_load.clone(),
                    service: vehicle_break.service(),
                    duration,
                    arrival,
                    waiting_time,
                    violations,
                });

                previous_start = service_start;
                previous_service = vehicle_break.service();
                previous_travel = values.task_travels[task_rank];
                task_rank += 1;
            }
            StepKind::End => {
                if !vehicle.has_end() {
                    // No step to attach the closing violation to.
                    aggregate.delay += values.end_delay;
                    continue;
                }

                duration += previous_travel;

                let arrival = previous_start + previous_service + previous_travel;
                debug_assert!(arrival <= values.route_end);
                let waiting_time =
                    values.route_end.duration_since(arrival).max(SignedDuration::ZERO);
                forward_wt += waiting_time;

                let mut violations = Violations::default();
                if let Some(shift_end) = vehicle.shift().end()
                    && shift_end < values.route_end
                {
                    let delay = values.route_end.duration_since(shift_end);
                    violations.record_delay(delay);
                    aggregate.record_delay(delay);
                }
                if previous_over_capacity {
                    violations.record(ViolationKind::Load);
                    aggregate.record(ViolationKind::Load);
                }

                sol_steps.push(Step {
                    step_type: StepType::End,
                    external_id: None,
                    location_id: vehicle.end_location(),
                    load: current_load.clone(),
                    service: SignedDuration::ZERO,
                    duration,
                    arrival,
                    waiting_time,
                    violations,
                });
            }
        }
    }

    debug_assert!(
        !vehicle.has_start()
            || sol_steps.first().is_some_and(|s| s.violations.lead_time == values.start_lead_time)
    );
    debug_assert!(
        !vehicle.has_end()
            || sol_steps.last().is_some_and(|s| s.violations.delay == values.end_delay)
    );

    // Pickups whose delivery never showed up.
    for delivery_rank in &expected_delivery_ranks {
        if let Some(&step_rank) = pickup_step_of_delivery.get(delivery_rank) {
            sol_steps[step_rank].violations.record(ViolationKind::Precedence);
            aggregate.record(ViolationKind::Precedence);
        }
    }

    if !missing_break_ids.is_empty() {
        aggregate.record(ViolationKind::MissingBreak);
    }

    aggregate.start_lead_time = values.start_lead_time;
    aggregate.end_delay = values.end_delay;

    if !aggregate.is_clean() {
        warn!(
            vehicle = vehicle.external_id(),
            types = ?aggregate.types,
            "route scheduled with violations"
        );
    }

    Route {
        vehicle_id: vehicle.external_id().to_string(),
        steps: sol_steps,
        cost: duration,
        service,
        duration,
        waiting_time: forward_wt,
        priority,
        deliveries: sum_deliveries,
        pickups: sum_pickups,
        description: vehicle.description().map(str::to_string),
        violations: aggregate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::Timestamp;

    use crate::{
        problem::{amount::Amount, job::JobBuilder, vehicle::VehicleBuilder},
        test_utils::{problem_with, simple_vehicle, single_job, ts},
    };

    fn canned_values(
        route_start: Timestamp,
        route_end: Timestamp,
        start_travel: i64,
        etas: Vec<i64>,
        travels: Vec<i64>,
    ) -> ScheduleValues {
        let ranks = vec![0; etas.len()];
        ScheduleValues {
            route_start,
            route_end,
            start_lead_time: SignedDuration::ZERO,
            end_delay: SignedDuration::ZERO,
            start_travel: SignedDuration::from_secs(start_travel),
            task_etas: etas.into_iter().map(ts).collect(),
            task_travels: travels.into_iter().map(SignedDuration::from_secs).collect(),
            task_window_ranks: ranks,
        }
    }

    #[test]
    fn test_reversed_shipment_marks_both_steps() {
        let mut pickup = JobBuilder::default();
        pickup.set_external_id("s1-pickup");
        pickup.set_location_id(1);
        pickup.set_kind(JobKind::Pickup);
        pickup.set_pickup(Amount::from_vec(vec![1]));
        let mut delivery = JobBuilder::default();
        delivery.set_external_id("s1-delivery");
        delivery.set_location_id(2);
        delivery.set_kind(JobKind::Delivery);
        delivery.set_delivery(Amount::from_vec(vec![1]));

        let problem = problem_with(
            vec![vec![0, 10, 20], vec![10, 0, 5], vec![20, 5, 0]],
            vec![simple_vehicle(Some(0), None)],
            vec![pickup.build(), delivery.build()],
        );
        // delivery first, pickup second
        let steps = vec![
            InputStep::start(),
            InputStep::job(1usize),
            InputStep::job(0usize),
            InputStep::end(),
        ];
        let values = canned_values(ts(0), ts(25), 20, vec![20, 25], vec![5, 0]);

        let mut unassigned = FxHashSet::from_iter([JobIdx::new(0), JobIdx::new(1)]);
        let route = build_route(&problem, VehicleIdx::new(0), &steps, &values, &mut unassigned);

        assert!(route.steps[1].violations.contains(ViolationKind::Precedence));
        assert!(route.steps[2].violations.contains(ViolationKind::Precedence));
        assert!(route.violations.contains(ViolationKind::Precedence));
        assert!(unassigned.is_empty());
    }

    #[test]
    fn test_lone_pickup_marked_at_route_end() {
        let mut pickup = JobBuilder::default();
        pickup.set_external_id("s1-pickup");
        pickup.set_location_id(1);
        pickup.set_kind(JobKind::Pickup);

        let problem = problem_with(
            vec![vec![0, 10], vec![10, 0]],
            vec![simple_vehicle(Some(0), None)],
            vec![pickup.build()],
        );
        let steps = vec![InputStep::start(), InputStep::job(0usize), InputStep::end()];
        let values = canned_values(ts(0), ts(10), 10, vec![10], vec![0]);

        let mut unassigned = FxHashSet::default();
        let route = build_route(&problem, VehicleIdx::new(0), &steps, &values, &mut unassigned);

        assert!(route.steps[1].violations.contains(ViolationKind::Precedence));
        assert!(route.violations.contains(ViolationKind::Precedence));
    }

    #[test]
    fn test_load_violation_captured_entering_and_leaving() {
        // single job delivering 5 against a capacity of 3: the vehicle is
        // over capacity from the start until the drop
        let mut vehicle = VehicleBuilder::default();
        vehicle.set_external_id("v0");
        vehicle.set_start_location(0);
        vehicle.set_end_location(0);
        vehicle.set_capacity(Amount::from_vec(vec![3]));

        let mut job = JobBuilder::default();
        job.set_external_id("j0");
        job.set_location_id(1);
        job.set_delivery(Amount::from_vec(vec![5]));

        let problem = problem_with(
            vec![vec![0, 10], vec![10, 0]],
            vec![vehicle.build()],
            vec![job.build()],
        );
        let steps = vec![InputStep::start(), InputStep::job(0usize), InputStep::end()];
        let values = canned_values(ts(0), ts(20), 10, vec![10], vec![10]);

        let mut unassigned = FxHashSet::default();
        let route = build_route(&problem, VehicleIdx::new(0), &steps, &values, &mut unassigned);

        // over capacity on start, still flagged on the job (capture on
        // entry), clean again by the end step
        assert!(route.steps[0].violations.contains(ViolationKind::Load));
        assert!(route.steps[1].violations.contains(ViolationKind::Load));
        assert!(!route.steps[2].violations.contains(ViolationKind::Load));
        assert!(route.violations.contains(ViolationKind::Load));
        assert_eq!(route.steps[1].load, Amount::from_vec(vec![0]));
    }

    #[test]
    fn test_missing_break_reported_on_aggregate_only() {
        let mut vehicle = VehicleBuilder::default();
        vehicle.set_external_id("v0");
        vehicle.set_start_location(0);
        vehicle.set_breaks(vec![crate::problem::vehicle::Break::new(
            "lunch",
            vec![],
            SignedDuration::from_secs(600),
        )]);

        let problem = problem_with(
            vec![vec![0, 10], vec![10, 0]],
            vec![vehicle.build()],
            vec![single_job(1, 5)],
        );
        let steps = vec![InputStep::start(), InputStep::job(0usize), InputStep::end()];
        let values = canned_values(ts(0), ts(15), 10, vec![10], vec![0]);

        let mut unassigned = FxHashSet::default();
        let route = build_route(&problem, VehicleIdx::new(0), &steps, &values, &mut unassigned);

        assert!(route.violations.contains(ViolationKind::MissingBreak));
        assert!(route.steps.iter().all(|s| !s.violations.contains(ViolationKind::MissingBreak)));
    }

    #[test]
    fn test_ghost_start_folds_lead_time_into_aggregate() {
        let problem = problem_with(
            vec![vec![0, 10], vec![10, 0]],
            vec![simple_vehicle(None, None)],
            vec![single_job(1, 5)],
        );
        let steps = vec![InputStep::start(), InputStep::job(0usize), InputStep::end()];
        let mut values = canned_values(ts(0), ts(5), 0, vec![0], vec![0]);
        values.start_lead_time = SignedDuration::from_secs(30);

        let mut unassigned = FxHashSet::default();
        let route = build_route(&problem, VehicleIdx::new(0), &steps, &values, &mut unassigned);

        // no start or end steps are emitted for a location-less vehicle
        assert_eq!(route.steps.len(), 1);
        assert_eq!(route.steps[0].step_type, StepType::Job);
        assert_eq!(route.violations.lead_time, SignedDuration::from_secs(30));
        assert_eq!(route.violations.start_lead_time, SignedDuration::from_secs(30));
        assert!(!route.violations.contains(ViolationKind::LeadTime));
    }

    #[test]
    fn test_skills_violation() {
        let mut job = JobBuilder::default();
        job.set_external_id("j0");
        job.set_location_id(1);
        job.set_skills(crate::problem::skill::skill_set(["crane"]));

        let problem = problem_with(
            vec![vec![0, 10], vec![10, 0]],
            vec![simple_vehicle(Some(0), None)],
            vec![job.build()],
        );
        let steps = vec![InputStep::start(), InputStep::job(0usize), InputStep::end()];
        let values = canned_values(ts(0), ts(10), 10, vec![10], vec![0]);

        let mut unassigned = FxHashSet::default();
        let route = build_route(&problem, VehicleIdx::new(0), &steps, &values, &mut unassigned);

        assert!(route.steps[1].violations.contains(ViolationKind::Skills));
        assert!(route.violations.contains(ViolationKind::Skills));
    }
}
