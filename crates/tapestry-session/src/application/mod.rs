//! Resuming and snapshotting a running orchestrator.

pub mod resume;
