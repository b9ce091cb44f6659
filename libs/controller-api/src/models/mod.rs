//! API models

mod app;
mod resource;

pub use app::*;
pub use resource::*;

use serde::{Deserialize, Serialize};

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub code: Option<u32>,
    pub description: String,
}
