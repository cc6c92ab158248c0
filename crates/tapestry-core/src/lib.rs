//! Tapestry Core — shared narrative abstractions.
//!
//! This crate defines the flag model, the predicate language, and the traits
//! that the playback engine uses to reach its external collaborators. It
//! contains no presentation code.

pub mod cancel;
pub mod clock;
pub mod error;
pub mod flags;
pub mod predicate;
pub mod presentation;
