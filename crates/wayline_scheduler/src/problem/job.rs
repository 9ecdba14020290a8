use jiff::SignedDuration;
use serde::Serialize;

use crate::{
    define_index_newtype,
    problem::{
        amount::Amount,
        location::LocationIdx,
        skill::SkillSet,
        time_window::{TimeWindow, TimeWindows},
    },
};

define_index_newtype!(JobIdx, Job);

impl JobIdx {
    /// For a pickup job, the rank of its delivery sibling. Shipments are laid
    /// out as adjacent (pickup, delivery) pairs in the job list.
    pub fn delivery_sibling(&self) -> JobIdx {
        JobIdx::new(self.get() + 1)
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// A standalone visit: its delivery is loaded at route start, its pickup
    /// is carried until route end.
    Single,
    /// The collection half of a shipment.
    Pickup,
    /// The drop-off half of a shipment, expected after its pickup sibling.
    Delivery,
}

#[derive(Serialize, Debug, Clone)]
pub struct Job {
    external_id: String,
    location_id: LocationIdx,
    service: SignedDuration,
    priority: u32,
    pickup: Amount,
    delivery: Amount,
    time_windows: TimeWindows,
    skills: SkillSet,
    kind: JobKind,
}

impl Job {
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn location_id(&self) -> LocationIdx {
        self.location_id
    }

    pub fn service(&self) -> SignedDuration {
        self.service
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn pickup(&self) -> &Amount {
        &self.pickup
    }

    pub fn delivery(&self) -> &Amount {
        &self.delivery
    }

    pub fn time_windows(&self) -> &TimeWindows {
        &self.time_windows
    }

    pub fn skills(&self) -> &SkillSet {
        &self.skills
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }
}

#[derive(Default)]
pub struct JobBuilder {
    external_id: Option<String>,
    location_id: Option<usize>,
    service: Option<SignedDuration>,
    priority: Option<u32>,
    pickup: Option<Amount>,
    delivery: Option<Amount>,
    time_windows: Option<Vec<TimeWindow>>,
    skills: Option<SkillSet>,
    kind: Option<JobKind>,
}

impl JobBuilder {
    pub fn set_external_id(&mut self, external_id: impl Into<String>) -> &mut JobBuilder {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn set_location_id(&mut self, location_id: usize) -> &mut JobBuilder {
        self.location_id = Some(location_id);
        self
    }

    pub fn set_service(&mut self, service: SignedDuration) -> &mut JobBuilder {
        self.service = Some(service);
        self
    }

    pub fn set_priority(&mut self, priority: u32) -> &mut JobBuilder {
        self.priority = Some(priority);
        self
    }

    pub fn set_pickup(&mut self, pickup: Amount) -> &mut JobBuilder {
        self.pickup = Some(pickup);
        self
    }

    pub fn set_delivery(&mut self, delivery: Amount) -> &mut JobBuilder {
        self.delivery = Some(delivery);
        self
    }

    pub fn set_time_windows(&mut self, time_windows: Vec<TimeWindow>) -> &mut JobBuilder {
        self.time_windows = Some(time_windows);
        self
    }

    pub fn set_skills(&mut self, skills: SkillSet) -> &mut JobBuilder {
        self.skills = Some(skills);
        self
    }

    pub fn set_kind(&mut self, kind: JobKind) -> &mut JobBuilder {
        self.kind = Some(kind);
        self
    }

    pub fn build(self) -> Job {
        Job {
            external_id: self.external_id.expect("Job external id is required"),
            location_id: self.location_id.expect("Job location is required").into(),
            service: self.service.unwrap_or(SignedDuration::ZERO),
            priority: self.priority.unwrap_or(0),
            pickup: self.pickup.unwrap_or_default(),
            delivery: self.delivery.unwrap_or_default(),
            time_windows: TimeWindows::from_vec(self.time_windows.unwrap_or_default()),
            skills: self.skills.unwrap_or_default(),
            kind: self.kind.unwrap_or(JobKind::Single),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let mut builder = JobBuilder::default();
        builder.set_external_id("j1");
        builder.set_location_id(3);
        let job = builder.build();

        assert_eq!(job.external_id(), "j1");
        assert_eq!(job.location_id(), LocationIdx::new(3));
        assert_eq!(job.service(), SignedDuration::ZERO);
        assert_eq!(job.kind(), JobKind::Single);
        assert!(job.time_windows().is_default());
        assert!(job.pickup().is_empty());
    }

    #[test]
    fn test_delivery_sibling_rank() {
        assert_eq!(JobIdx::new(5).delivery_sibling(), JobIdx::new(6));
    }
}
