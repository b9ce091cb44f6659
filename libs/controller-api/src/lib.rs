//! Controller API models
//!
//! Request and response bodies exchanged with the application controller.

pub mod models;

pub use models::*;
