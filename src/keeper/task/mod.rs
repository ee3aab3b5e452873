pub mod keeper_job;
pub mod snapshot_job;
