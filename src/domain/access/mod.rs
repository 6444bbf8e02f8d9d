pub mod guard;
pub mod role;

pub use guard::{guard_route, RouteDecision};
pub use role::{Permission, Role};
