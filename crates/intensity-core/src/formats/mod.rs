//! # Formats Module
//!
//! Serialization of module settings.
//!
//! This module contains:
//! - Binary settings persistence (header + postcard payload)
//! - Revision detection and upgrade on load
//!
//! Note: File I/O remains in the app layer (apps/intensity).
//! This module only handles format conversion (pure transformations).

mod persistence;

pub use persistence::*;
