pub mod model;
pub mod service;

pub use model::{Mark, MarkEntry};
pub use service::{validate_entries, MarkService, MarkServiceApi};
