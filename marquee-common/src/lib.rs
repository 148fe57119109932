//! # Marquee Common Library
//!
//! Shared code for the Marquee event planner:
//! - Error type shared by every crate
//! - TOML bootstrap configuration and API key resolution
//! - Geographic helpers (coordinates, great-circle distance)
//! - Wall-clock parsing and human-readable duration/distance formatting

pub mod config;
pub mod error;
pub mod geo;
pub mod human_time;
pub mod time;

pub use error::{Error, Result};
pub use geo::Coordinates;
