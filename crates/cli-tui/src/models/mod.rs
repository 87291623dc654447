pub mod config;
pub mod job;

pub use config::TranscodeConfig;
pub use job::{load_all_jobs, Job, JobStage, JobStatus, SourceType};
