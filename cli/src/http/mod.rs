//! Controller REST client

pub mod apps;
pub mod client;
