//! Deferred backend jobs: status normalization and the poll loop.

mod poller;
mod status;

pub use poller::JobPoller;
pub use status::{JobHandle, JobOutcome, JobStatus};
