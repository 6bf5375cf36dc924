//! # Intensity Library
//!
//! This library exposes the CLI modules for testing and integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod cli;
pub mod error;
pub mod loader;

// Re-export intensity_core for convenience
pub use intensity_core;
