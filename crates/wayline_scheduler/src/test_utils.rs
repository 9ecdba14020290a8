use jiff::{SignedDuration, Timestamp};

use crate::problem::{
    job::{Job, JobBuilder},
    location::TravelMatrix,
    routing_problem::{RoutingProblem, RoutingProblemBuilder},
    vehicle::{Vehicle, VehicleBuilder},
};

pub fn ts(seconds: i64) -> Timestamp {
    Timestamp::from_second(seconds).unwrap()
}

pub fn single_job(location: usize, service_secs: i64) -> Job {
    let mut builder = JobBuilder::default();
    builder.set_external_id(format!("job-{location}"));
    builder.set_location_id(location);
    builder.set_service(SignedDuration::from_secs(service_secs));
    builder.build()
}

pub fn simple_vehicle(start: Option<usize>, end: Option<usize>) -> Vehicle {
    let mut builder = VehicleBuilder::default();
    builder.set_external_id("v0");
    if let Some(start) = start {
        builder.set_start_location(start);
    }
    if let Some(end) = end {
        builder.set_end_location(end);
    }
    builder.build()
}

pub fn problem_with(
    matrix_rows: Vec<Vec<i64>>,
    vehicles: Vec<Vehicle>,
    jobs: Vec<Job>,
) -> RoutingProblem {
    let mut builder = RoutingProblemBuilder::default();
    builder.set_travel_matrix(TravelMatrix::from_rows(matrix_rows));
    builder.set_vehicles(vehicles);
    builder.set_jobs(jobs);
    builder.build()
}
