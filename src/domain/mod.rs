pub mod access;
pub mod auth;
pub mod course;
pub mod document;
pub mod mark;
pub mod session;
pub mod shared;
