//! paasctl library
//!
//! Push pipeline for a PaaS controller: fingerprint reconciliation, deployment
//! packaging and rollout supervision.

pub mod commands;
pub mod controller;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod models;
pub mod output;
pub mod package;
pub mod prompt;
pub mod rollout;
pub mod storage;
pub mod sync;
pub mod utils;
