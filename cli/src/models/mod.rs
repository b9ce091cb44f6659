//! Client-side models

pub mod resource;
