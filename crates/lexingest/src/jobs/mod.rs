//! Job status tracking.

pub mod tracker;

pub use tracker::{JobStatus, JobTracker, Milestone, StatusReport};
