//! External service interactions
//!
//! - REST client and the `ResourceApi` seam (`api`, `query`)
//! - List response cache
//! - Workflow and document payloads
//! - Background job execution

pub mod api;
pub mod cache;
pub mod documents;
pub mod job_runner;
pub mod query;
pub mod workflow;

#[cfg(test)]
pub mod stub;
