pub mod model;
pub mod service;

pub use model::{Document, DocumentQuery};
pub use service::{DocumentService, DocumentServiceApi};
