//! Deployment packaging
//!
//! Stages an application into a scratch directory, filters editor and VCS
//! noise, and builds the zip archive that is uploaded to the controller.

pub mod archive;
pub mod exclusions;
pub mod stage;
