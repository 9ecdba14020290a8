use jiff::{SignedDuration, Timestamp};
use tracing::debug;

use crate::{
    problem::{routing_problem::RoutingProblem, time_window::TimeWindows, vehicle::Vehicle},
    schedule::{
        milp::{Bounds, ColumnId, ColumnKind, MilpBackend, MilpModel, RowId, SolveFailure},
        step::{InputStep, StepKind},
        timeline::{Horizon, Segment, Timeline},
    },
};

/// The solved schedule, translated back to absolute time: route start/end,
/// startup and closing violations, per-task service starts, the travel
/// attributed to each arc, and the window each task was held against.
pub(crate) struct ScheduleValues {
    pub route_start: Timestamp,
    pub route_end: Timestamp,
    pub start_lead_time: SignedDuration,
    pub end_delay: SignedDuration,
    pub start_travel: SignedDuration,
    pub task_etas: Vec<Timestamp>,
    pub task_travels: Vec<SignedDuration>,
    pub task_window_ranks: Vec<usize>,
}

/// The mixed-integer program for one route, plus the column handles needed
/// to steer the second phase and read the answer back.
///
/// Columns: service times `t_0..t_{n+1}`, violation measures `Y_0..Y_{n+1}`,
/// one window-choice binary per (task, window) pair, and one travel
/// placeholder per consecutive-step arc. Rows: precedence, lead-time, delay,
/// window selection, per-segment travel equalities, and two pins kept slack
/// until phase two fixes makespan and total violation.
pub(crate) struct ScheduleProgram {
    model: MilpModel,
    t: Vec<ColumnId>,
    y: Vec<ColumnId>,
    x: Vec<Vec<ColumnId>>,
    delta: Vec<ColumnId>,
    makespan_row: RowId,
    sum_y_row: RowId,
    segments: Vec<Segment>,
    horizon: Horizon,
    task_count: usize,
}

struct TaskRef<'a> {
    service: SignedDuration,
    windows: &'a TimeWindows,
    is_job: bool,
}

impl ScheduleProgram {
    pub fn build(
        problem: &RoutingProblem,
        vehicle: &Vehicle,
        steps: &[InputStep],
        timeline: &Timeline,
    ) -> Self {
        let horizon = timeline.horizon;
        let n = timeline.task_count;
        let span = horizon.span_secs();

        let tasks: Vec<TaskRef<'_>> = steps
            .iter()
            .filter_map(|step| match step.kind() {
                StepKind::Job(index) => {
                    let job = problem.job(index);
                    Some(TaskRef { service: job.service(), windows: job.time_windows(), is_job: true })
                }
                StepKind::Break(index) => {
                    let vehicle_break = &vehicle.breaks()[index];
                    Some(TaskRef {
                        service: vehicle_break.service(),
                        windows: vehicle_break.time_windows(),
                        is_job: false,
                    })
                }
                _ => None,
            })
            .collect();
        debug_assert_eq!(tasks.len(), n);

        let mut model = MilpModel::new();

        // Service time columns, clamped to the propagated bounds.
        let t: Vec<ColumnId> = timeline
            .bounds
            .iter()
            .map(|bounds| {
                let lower = horizon.rel(bounds.lower);
                let upper = horizon.rel(bounds.upper);
                let bounds =
                    if lower == upper { Bounds::Fixed(lower) } else { Bounds::Range(lower, upper) };
                model.add_column(ColumnKind::Continuous, bounds)
            })
            .collect();

        // Violation measures.
        let y: Vec<ColumnId> =
            (0..n + 2).map(|_| model.add_column(ColumnKind::Continuous, Bounds::Lower(0.0))).collect();

        // Window choices; ranks below the first relevant one are pinned off.
        let x: Vec<Vec<ColumnId>> = tasks
            .iter()
            .zip(&timeline.first_window_ranks)
            .map(|(task, &first_rank)| {
                (0..task.windows.len())
                    .map(|k| {
                        let bounds = if k < first_rank {
                            Bounds::Fixed(0.0)
                        } else {
                            Bounds::Range(0.0, 1.0)
                        };
                        model.add_column(ColumnKind::Binary, bounds)
                    })
                    .collect()
            })
            .collect();

        // Travel placeholders, one per arc between consecutive steps.
        let delta: Vec<ColumnId> =
            (0..n + 1).map(|_| model.add_column(ColumnKind::Continuous, Bounds::Lower(0.0))).collect();

        // Precedence: each step begins after its predecessor's service plus
        // whatever travel the arc between them carries.
        for i in 0..=n {
            let service =
                if i == 0 { 0.0 } else { tasks[i - 1].service.as_secs() as f64 };
            let row = model.add_row(Bounds::Lower(service));
            model.set_coefficient(row, t[i], -1.0);
            model.set_coefficient(row, t[i + 1], 1.0);
            model.set_coefficient(row, delta[i], -1.0);
        }

        // Lead time at route start against the shift opening.
        let shift_start =
            vehicle.shift().start().map(|start| horizon.rel(start)).unwrap_or(0.0);
        let row = model.add_row(Bounds::Lower(shift_start));
        model.set_coefficient(row, t[0], 1.0);
        model.set_coefficient(row, y[0], 1.0);

        // Lead time per task against its chosen window.
        for (i, task) in tasks.iter().enumerate() {
            let row = model.add_row(Bounds::Lower(0.0));
            model.set_coefficient(row, t[i + 1], 1.0);
            model.set_coefficient(row, y[i + 1], 1.0);
            if !(task.is_job && task.windows.is_default()) {
                for (k, window) in task.windows.iter().enumerate() {
                    let opening = horizon.rel(window.start_or(horizon.start));
                    model.set_coefficient(row, x[i][k], -opening);
                }
            }
        }

        // Delay per task against its chosen window. A default job window gets
        // one far-out coefficient so the row can never bind.
        for (i, task) in tasks.iter().enumerate() {
            let row = model.add_row(Bounds::Upper(0.0));
            model.set_coefficient(row, t[i + 1], 1.0);
            model.set_coefficient(row, y[i + 1], -1.0);
            if task.is_job && task.windows.is_default() {
                model.set_coefficient(row, x[i][0], -span);
            } else {
                for (k, window) in task.windows.iter().enumerate() {
                    let closing = horizon.rel(window.end_or(horizon.end));
                    model.set_coefficient(row, x[i][k], -closing);
                }
            }
        }

        // Delay at route end against the shift closing.
        let shift_end = vehicle.shift().end().map(|end| horizon.rel(end)).unwrap_or(span);
        let row = model.add_row(Bounds::Upper(shift_end));
        model.set_coefficient(row, t[n + 1], 1.0);
        model.set_coefficient(row, y[n + 1], -1.0);

        // Exactly one window per task.
        for columns in &x {
            let row = model.add_row(Bounds::Fixed(1.0));
            for &column in columns {
                model.set_coefficient(row, column, 1.0);
            }
        }

        // Each segment's arcs share out exactly its travel duration.
        let mut cursor = 0;
        for segment in &timeline.segments {
            let row = model.add_row(Bounds::Fixed(segment.travel.as_secs() as f64));
            for k in 0..=segment.breaks_after {
                model.set_coefficient(row, delta[cursor + k], 1.0);
            }
            cursor += 1 + segment.breaks_after;
        }
        debug_assert_eq!(cursor, delta.len());

        // Pins held slack for now; phase two turns them into equalities.
        let makespan_row = model.add_row(Bounds::Lower(0.0));
        model.set_coefficient(makespan_row, t[0], -1.0);
        model.set_coefficient(makespan_row, t[n + 1], 1.0);

        let sum_y_row = model.add_row(Bounds::Lower(0.0));
        for &column in &y {
            model.set_coefficient(sum_y_row, column, 1.0);
        }

        // Phase-one objective: violations dominate, makespan breaks ties.
        let violation_weight = timeline.makespan_estimate.as_secs() as f64;
        for &column in &y {
            model.set_objective(column, violation_weight);
        }
        model.set_objective(t[n + 1], 1.0);
        model.set_objective(t[0], -1.0);

        ScheduleProgram {
            model,
            t,
            y,
            x,
            delta,
            makespan_row,
            sum_y_row,
            segments: timeline.segments.clone(),
            horizon,
            task_count: n,
        }
    }

    pub fn column_count(&self) -> usize {
        self.model.column_count()
    }

    /// Runs both optimization phases and reads the schedule back.
    pub fn solve(mut self, backend: &impl MilpBackend) -> Result<ScheduleValues, SolveFailure> {
        let n = self.task_count;

        let values = backend.solve(&self.model)?;
        let best_makespan =
            values.rounded_secs(self.t[n + 1]) - values.rounded_secs(self.t[0]);
        let violation_sum: i64 =
            self.y.iter().map(|&column| values.rounded_secs(column)).sum();
        debug!(best_makespan, violation_sum, "phase one settled");

        // Phase two: violations and makespan are pinned; refine toward the
        // earliest starts, preferring travel before breaks within a segment.
        self.model.set_row_bounds(self.makespan_row, Bounds::Fixed(best_makespan as f64));
        self.model.set_row_bounds(self.sum_y_row, Bounds::Fixed(violation_sum as f64));
        self.model.clear_objective();

        let mut cursor = 0;
        let mut majorant: i64 = 0;
        for segment in &self.segments {
            for k in 1..=segment.breaks_after {
                self.model.set_objective(self.delta[cursor + k], k as f64);
            }
            cursor += 1 + segment.breaks_after;
            majorant += segment.breaks_after as i64 * segment.travel.as_secs();
        }

        let start_weight = majorant.max(1) as f64;
        for i in 1..=n + 1 {
            self.model.set_objective(self.t[i], start_weight);
        }

        let values = backend.solve(&self.model)?;

        let task_window_ranks = self
            .x
            .iter()
            .map(|columns| {
                columns
                    .iter()
                    .position(|&column| values.rounded_secs(column) == 1)
                    .unwrap_or(0)
            })
            .collect();

        Ok(ScheduleValues {
            route_start: self.horizon.abs(values.rounded_secs(self.t[0])),
            route_end: self.horizon.abs(values.rounded_secs(self.t[n + 1])),
            start_lead_time: SignedDuration::from_secs(values.rounded_secs(self.y[0])),
            end_delay: SignedDuration::from_secs(values.rounded_secs(self.y[n + 1])),
            start_travel: SignedDuration::from_secs(values.rounded_secs(self.delta[0])),
            task_etas: (0..n)
                .map(|i| self.horizon.abs(values.rounded_secs(self.t[i + 1])))
                .collect(),
            task_travels: (0..n)
                .map(|i| SignedDuration::from_secs(values.rounded_secs(self.delta[i + 1])))
                .collect(),
            task_window_ranks,
        })
    }
}
