//! Filesystem helpers

pub mod file;
pub mod scratch;
