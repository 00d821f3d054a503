//! Ember Core - Foundational types for the Ember particle engine
//!
//! This crate provides the core types that the other Ember crates depend on:
//! - `Transform`, `Color` - Spatial and color types
//! - Error types and Result alias

mod error;
mod types;

pub use error::{EmberError, Result};
pub use types::{Color, Transform};
