//! API services.

pub mod admission;
pub mod jobs;
pub mod reaper;

pub use admission::AdmissionGate;
pub use jobs::{JobService, JobSnapshot, ResultDownload, SwapUpload};
pub use reaper::Reaper;
