//! Session parameters and resume planning.

pub mod params;
pub mod plan;
