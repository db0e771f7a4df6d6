//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and transform decomposition
//! - Resource identities for GPU-resident objects
//! - Time sources (wall clock and manual test clock)
//! - Logging utilities

pub mod math;
pub mod collections;
pub mod time;
pub mod logging;
