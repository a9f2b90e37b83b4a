// Asynchronous job system: submission, status tracking, worker pool

pub mod jobs;
pub mod workers;

pub use jobs::{
    AdCopyJob, BulkSeoJob, Job, JobKind, JobPayload, JobStatus, JobStore, SeoContentJob,
};
pub use workers::{JobQueue, WorkerContext};
