//! Fingerprint reconciliation against the controller

pub mod reconciler;
