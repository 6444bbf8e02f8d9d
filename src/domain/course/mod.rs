pub mod model;
pub mod service;

pub use model::{AccessRequest, AccessRequestStatus, Course, CourseQuery, ReviewDecision};
pub use service::{CourseService, CourseServiceApi};
