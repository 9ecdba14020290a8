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

define_index_newtype!(VehicleIdx, Vehicle);
define_index_newtype!(BreakIdx, Break);

/// An on-duty pause the vehicle must take somewhere along its route.
#[derive(Serialize, Debug, Clone)]
pub struct Break {
    external_id: String,
    time_windows: TimeWindows,
    service: SignedDuration,
}

impl Break {
    pub fn new(
        external_id: impl Into<String>,
        time_windows: Vec<TimeWindow>,
        service: SignedDuration,
    ) -> Self {
        Break {
            external_id: external_id.into(),
            time_windows: TimeWindows::from_vec(time_windows),
            service,
        }
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn time_windows(&self) -> &TimeWindows {
        &self.time_windows
    }

    pub fn service(&self) -> SignedDuration {
        self.service
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct Vehicle {
    external_id: String,
    description: Option<String>,
    start_location: Option<LocationIdx>,
    end_location: Option<LocationIdx>,
    shift: TimeWindow,
    capacity: Amount,
    breaks: Vec<Break>,
    skills: SkillSet,
}

impl Vehicle {
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn start_location(&self) -> Option<LocationIdx> {
        self.start_location
    }

    pub fn end_location(&self) -> Option<LocationIdx> {
        self.end_location
    }

    pub fn has_start(&self) -> bool {
        self.start_location.is_some()
    }

    pub fn has_end(&self) -> bool {
        self.end_location.is_some()
    }

    pub fn shift(&self) -> &TimeWindow {
        &self.shift
    }

    pub fn capacity(&self) -> &Amount {
        &self.capacity
    }

    pub fn breaks(&self) -> &[Break] {
        &self.breaks
    }

    pub fn skills(&self) -> &SkillSet {
        &self.skills
    }
}

#[derive(Default)]
pub struct VehicleBuilder {
    external_id: Option<String>,
    description: Option<String>,
    start_location: Option<usize>,
    end_location: Option<usize>,
    shift: Option<TimeWindow>,
    capacity: Option<Amount>,
    breaks: Option<Vec<Break>>,
    skills: Option<SkillSet>,
}

impl VehicleBuilder {
    pub fn set_external_id(&mut self, external_id: impl Into<String>) -> &mut VehicleBuilder {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> &mut VehicleBuilder {
        self.description = Some(description.into());
        self
    }

    pub fn set_start_location(&mut self, start_location: usize) -> &mut VehicleBuilder {
        self.start_location = Some(start_location);
        self
    }

    pub fn set_end_location(&mut self, end_location: usize) -> &mut VehicleBuilder {
        self.end_location = Some(end_location);
        self
    }

    pub fn set_shift(&mut self, shift: TimeWindow) -> &mut VehicleBuilder {
        self.shift = Some(shift);
        self
    }

    pub fn set_capacity(&mut self, capacity: Amount) -> &mut VehicleBuilder {
        self.capacity = Some(capacity);
        self
    }

    pub fn set_breaks(&mut self, breaks: Vec<Break>) -> &mut VehicleBuilder {
        self.breaks = Some(breaks);
        self
    }

    pub fn set_skills(&mut self, skills: SkillSet) -> &mut VehicleBuilder {
        self.skills = Some(skills);
        self
    }

    pub fn build(self) -> Vehicle {
        Vehicle {
            external_id: self.external_id.expect("Vehicle external id is required"),
            description: self.description,
            start_location: self.start_location.map(Into::into),
            end_location: self.end_location.map(Into::into),
            shift: self.shift.unwrap_or_default(),
            capacity: self.capacity.unwrap_or_default(),
            breaks: self.breaks.unwrap_or_default(),
            skills: self.skills.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let mut builder = VehicleBuilder::default();
        builder.set_external_id("truck-1");
        let vehicle = builder.build();

        assert!(!vehicle.has_start());
        assert!(!vehicle.has_end());
        assert!(vehicle.shift().is_default());
        assert!(vehicle.breaks().is_empty());
    }

    #[test]
    fn test_locations() {
        let mut builder = VehicleBuilder::default();
        builder.set_external_id("truck-2");
        builder.set_start_location(0);
        builder.set_end_location(4);
        let vehicle = builder.build();

        assert_eq!(vehicle.start_location(), Some(LocationIdx::new(0)));
        assert_eq!(vehicle.end_location(), Some(LocationIdx::new(4)));
    }
}
