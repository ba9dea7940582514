//! leafsnap library crate.
//!
//! Camera session management for plant photos, plus the Plant.id
//! identification relay the captures are sent to.

pub mod camera;
pub mod config;
pub mod identify;
pub mod server;
