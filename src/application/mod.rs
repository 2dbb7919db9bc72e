//! Application services: public blog pages and the admin surface.

pub mod admin;
pub mod blog;
pub mod error;
pub mod repos;
