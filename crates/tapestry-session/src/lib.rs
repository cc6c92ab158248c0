//! Tapestry Session — resumable sessions.
//!
//! A session is shared as a query string carrying the current node, the
//! traversal path, the premise flags and the content version. This crate
//! encodes and decodes that string and turns it into a resume plan.

pub mod application;
pub mod domain;

pub use application::resume::{Resumed, resume, snapshot};
pub use domain::params::{SessionParams, parse_premise_flags, serialize_premise_flags};
pub use domain::plan::{ResumePlan, ResumeTarget};
