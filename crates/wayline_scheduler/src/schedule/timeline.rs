use jiff::{SignedDuration, Timestamp};
use tracing::debug;

use crate::{
    problem::{
        location::LocationIdx,
        routing_problem::RoutingProblem,
        time_window::TimeWindows,
        vehicle::Vehicle,
    },
    schedule::step::{InputStep, StepKind},
};

/// Interval enclosing every timestamp one validation can touch. All solver
/// constants are expressed relative to its start so their magnitude stays
/// small even for epoch-scale inputs.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Horizon {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl Horizon {
    /// Seconds from the horizon start to `at`.
    pub fn rel(&self, at: Timestamp) -> f64 {
        at.duration_since(self.start).as_secs() as f64
    }

    /// Translates rounded solver output back to an absolute timestamp.
    pub fn abs(&self, seconds: i64) -> Timestamp {
        self.start + SignedDuration::from_secs(seconds)
    }

    pub fn span_secs(&self) -> f64 {
        self.rel(self.end)
    }
}

/// One non-break step together with the breaks that follow it and the travel
/// to the next non-break step. Breaks share their segment's travel budget:
/// the solver decides how much of it happens before or after each break.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Segment {
    pub breaks_after: usize,
    pub travel: SignedDuration,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct StepBounds {
    pub lower: Timestamp,
    pub upper: Timestamp,
}

/// Marker failure for a step whose propagated bounds cross; surfaced by the
/// caller as the infeasible-route error.
#[derive(Debug)]
pub(crate) struct BoundsCrossed;

/// Everything the program builder needs, derived from one walk over the step
/// sequence: planning horizon, per-segment travel, per-step service-start
/// bounds, and the first window rank worth considering per task.
pub(crate) struct Timeline {
    pub horizon: Horizon,
    pub segments: Vec<Segment>,
    pub bounds: Vec<StepBounds>,
    pub first_window_ranks: Vec<usize>,
    pub makespan_estimate: SignedDuration,
    pub window_count: usize,
    pub task_count: usize,
}

impl Timeline {
    pub fn build(
        problem: &RoutingProblem,
        vehicle: &Vehicle,
        steps: &[InputStep],
    ) -> Result<Timeline, BoundsCrossed> {
        let mut horizon_start: Option<Timestamp> = None;
        let mut horizon_end = Timestamp::UNIX_EPOCH;

        let mut observe = |start: Option<Timestamp>, end: Option<Timestamp>| {
            if let Some(start) = start {
                horizon_start = Some(horizon_start.map_or(start, |s| s.min(start)));
                horizon_end = horizon_end.max(start);
            }
            if let Some(end) = end {
                horizon_start = Some(horizon_start.map_or(end, |s| s.min(end)));
                horizon_end = horizon_end.max(end);
            }
        };

        if !vehicle.shift().is_default() {
            observe(vehicle.shift().start(), vehicle.shift().end());
        }

        let mut segments: Vec<Segment> = Vec::new();
        let mut last_location: Option<LocationIdx> = None;
        let mut service_sum = SignedDuration::ZERO;
        let mut duration_sum = SignedDuration::ZERO;
        let mut window_count = 0;
        let mut task_count = 0;

        for step in steps {
            for forced in step.forced_service().timestamps() {
                observe(Some(forced), None);
            }

            match step.kind() {
                StepKind::Start => {
                    last_location = vehicle.start_location();
                    segments.push(Segment { breaks_after: 0, travel: SignedDuration::ZERO });
                }
                StepKind::Job(index) => {
                    let job = problem.job(index);
                    task_count += 1;
                    window_count += job.time_windows().len();
                    service_sum += job.service();
                    if !job.time_windows().is_default() {
                        observe(
                            job.time_windows().first().start(),
                            job.time_windows().last().end(),
                        );
                    }

                    let travel = last_location
                        .map(|from| problem.travel_time(from, job.location_id()))
                        .unwrap_or(SignedDuration::ZERO);
                    duration_sum += travel;
                    segments
                        .last_mut()
                        .expect("step sequence must open with a start step")
                        .travel = travel;
                    segments.push(Segment { breaks_after: 0, travel: SignedDuration::ZERO });
                    last_location = Some(job.location_id());
                }
                StepKind::Break(index) => {
                    let vehicle_break = &vehicle.breaks()[index];
                    task_count += 1;
                    window_count += vehicle_break.time_windows().len();
                    service_sum += vehicle_break.service();
                    if !vehicle_break.time_windows().is_default() {
                        observe(
                            vehicle_break.time_windows().first().start(),
                            vehicle_break.time_windows().last().end(),
                        );
                    }

                    segments
                        .last_mut()
                        .expect("step sequence must open with a start step")
                        .breaks_after += 1;
                }
                StepKind::End => {
                    let travel = match (last_location, vehicle.end_location()) {
                        (Some(from), Some(to)) => problem.travel_time(from, to),
                        _ => SignedDuration::ZERO,
                    };
                    duration_sum += travel;
                    segments
                        .last_mut()
                        .expect("step sequence must open with a start step")
                        .travel = travel;
                }
            }
        }

        let mut makespan_estimate = duration_sum + service_sum;
        let horizon = match horizon_start {
            // Nothing constrains absolute time: anchor the horizon at zero
            // and leave generous room for the whole route.
            None => Horizon {
                start: Timestamp::UNIX_EPOCH,
                end: Timestamp::UNIX_EPOCH + makespan_estimate * 10,
            },
            Some(start) => {
                if makespan_estimate.is_zero() {
                    makespan_estimate = horizon_end.duration_since(start);
                }
                // Pull the horizon start back to leave room for lead time at
                // startup, and push the end out symmetrically.
                let lead_room = start.duration_since(Timestamp::UNIX_EPOCH);
                let start = if makespan_estimate < lead_room {
                    start - makespan_estimate
                } else {
                    Timestamp::UNIX_EPOCH
                };
                Horizon { start, end: horizon_end + makespan_estimate }
            }
        };
        debug!(
            horizon_start = %horizon.start,
            horizon_end = %horizon.end,
            ?makespan_estimate,
            "planning horizon settled"
        );

        let mut bounds = Vec::with_capacity(steps.len());
        let mut first_window_ranks = Vec::with_capacity(task_count);
        let mut previous_lb = horizon.start;
        let mut previous_service = SignedDuration::ZERO;
        let mut previous_travel = segments[0].travel;
        let mut segment_rank = 0;

        for step in steps {
            let forced = step.forced_service();
            let mut lower = horizon.start;
            let mut upper = horizon.end;
            if let Some(at) = forced.at {
                lower = at;
                upper = at;
            }
            if let Some(after) = forced.after {
                lower = after;
            }
            if let Some(before) = forced.before {
                upper = before;
            }

            match step.kind() {
                StepKind::Start => {
                    previous_lb = lower;
                    segment_rank += 1;
                }
                StepKind::Job(index) => {
                    lower = lower.max(previous_lb + previous_service + previous_travel);
                    previous_lb = lower;
                    previous_service = problem.job(index).service();
                    previous_travel = segments[segment_rank].travel;
                    segment_rank += 1;
                }
                StepKind::Break(index) => {
                    lower = lower.max(previous_lb + previous_service);
                    previous_lb = lower;
                    previous_service = vehicle.breaks()[index].service();
                }
                StepKind::End => {
                    lower = lower.max(previous_lb + previous_service + previous_travel);
                }
            }

            if lower > upper {
                return Err(BoundsCrossed);
            }
            bounds.push(StepBounds { lower, upper });

            match step.kind() {
                StepKind::Job(index) => {
                    first_window_ranks
                        .push(first_relevant_window(problem.job(index).time_windows(), lower));
                }
                StepKind::Break(index) => {
                    first_window_ranks
                        .push(first_relevant_window(vehicle.breaks()[index].time_windows(), lower));
                }
                _ => {}
            }
        }

        Ok(Timeline {
            horizon,
            segments,
            bounds,
            first_window_ranks,
            makespan_estimate,
            window_count,
            task_count,
        })
    }
}

/// The earliest window rank that can still be worth choosing once the task's
/// service cannot start before `lower_bound`. Windows strictly better served
/// by waiting for the next one are skipped: their delay is never cheaper than
/// the lead time to the following window.
fn first_relevant_window(windows: &TimeWindows, lower_bound: Timestamp) -> usize {
    let Some(rank) =
        windows.iter().rposition(|tw| tw.start_or(Timestamp::MIN) <= lower_bound)
    else {
        return 0;
    };

    let window = windows.get(rank);
    if window.end_or(Timestamp::MAX) < lower_bound && rank + 1 < windows.len() {
        let next = windows.get(rank + 1);
        let lead = next.start_or(Timestamp::MIN).duration_since(lower_bound);
        let delay = lower_bound.duration_since(window.end_or(Timestamp::MAX));
        if lead <= delay {
            return rank + 1;
        }
    }

    rank
}
