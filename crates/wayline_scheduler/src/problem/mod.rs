pub mod amount;
pub mod job;
pub mod location;
pub mod routing_problem;
pub mod skill;
pub mod time_window;
pub mod vehicle;
