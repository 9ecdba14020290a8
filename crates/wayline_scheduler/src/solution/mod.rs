mod route;
mod violations;

pub use route::{Route, Step, StepType};
pub use violations::{ViolationKind, Violations};
