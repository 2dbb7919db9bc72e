//! Presentation layer: view records and askama templates.

pub mod views;
