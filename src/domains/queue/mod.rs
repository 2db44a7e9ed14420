pub mod backoff;
pub mod job;
pub mod job_queue;
pub mod rate_limiter;
pub mod worker;

pub use backoff::RetryPolicy;
pub use job::{Job, JobOutcome, JobPayload, JobRecord, JobResult, QueueStats};
pub use job_queue::{JobQueue, QueueConfig};
pub use rate_limiter::RateLimiter;
pub use worker::ExecutionWorker;
