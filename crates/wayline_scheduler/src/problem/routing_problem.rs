use jiff::SignedDuration;

use crate::problem::{
    amount::Amount,
    job::{Job, JobIdx},
    location::{LocationIdx, TravelMatrix},
    vehicle::{Vehicle, VehicleIdx},
};

/// The read-only context a route schedule is validated against: the travel
/// matrix plus the full job and vehicle definitions.
pub struct RoutingProblem {
    travel_matrix: TravelMatrix,
    vehicles: Vec<Vehicle>,
    jobs: Vec<Job>,
    capacity_dimensions: usize,
}

impl RoutingProblem {
    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicle(&self, index: VehicleIdx) -> &Vehicle {
        &self.vehicles[index]
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn job(&self, index: JobIdx) -> &Job {
        &self.jobs[index]
    }

    pub fn travel_time(&self, from: LocationIdx, to: LocationIdx) -> SignedDuration {
        self.travel_matrix.travel_time(from, to)
    }

    /// Skill check: the vehicle must carry every skill the job requires.
    pub fn vehicle_ok_with_job(&self, vehicle: VehicleIdx, job: JobIdx) -> bool {
        self.jobs[job].skills().is_subset(self.vehicles[vehicle].skills())
    }

    /// A zero load sized to the widest capacity dimension in the problem, so
    /// that running loads compare componentwise against any vehicle.
    pub fn zero_amount(&self) -> Amount {
        Amount::with_dimensions(self.capacity_dimensions)
    }
}

#[derive(Default)]
pub struct RoutingProblemBuilder {
    travel_matrix: Option<TravelMatrix>,
    vehicles: Option<Vec<Vehicle>>,
    jobs: Option<Vec<Job>>,
}

impl RoutingProblemBuilder {
    pub fn set_travel_matrix(&mut self, travel_matrix: TravelMatrix) -> &mut RoutingProblemBuilder {
        self.travel_matrix = Some(travel_matrix);
        self
    }

    pub fn set_vehicles(&mut self, vehicles: Vec<Vehicle>) -> &mut RoutingProblemBuilder {
        self.vehicles = Some(vehicles);
        self
    }

    pub fn set_jobs(&mut self, jobs: Vec<Job>) -> &mut RoutingProblemBuilder {
        self.jobs = Some(jobs);
        self
    }

    pub fn build(self) -> RoutingProblem {
        let travel_matrix = self.travel_matrix.expect("Travel matrix is required");
        let vehicles = self.vehicles.unwrap_or_default();
        let jobs = self.jobs.unwrap_or_default();

        for job in &jobs {
            assert!(
                job.location_id().get() < travel_matrix.num_locations(),
                "job location outside the travel matrix"
            );
        }
        for vehicle in &vehicles {
            for location in [vehicle.start_location(), vehicle.end_location()].into_iter().flatten()
            {
                assert!(
                    location.get() < travel_matrix.num_locations(),
                    "vehicle location outside the travel matrix"
                );
            }
        }

        let capacity_dimensions = jobs
            .iter()
            .flat_map(|job| [job.pickup().len(), job.delivery().len()])
            .chain(vehicles.iter().map(|vehicle| vehicle.capacity().len()))
            .max()
            .unwrap_or(0);

        RoutingProblem { travel_matrix, vehicles, jobs, capacity_dimensions }
    }
}
