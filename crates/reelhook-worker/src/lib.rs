//! Job worker for the reelhook delivery layer.
//!
//! Runs an upstream handler once per job and delivers the outcome to the
//! job's webhook. Delivery problems are logged and never change the result
//! handed back to the execution framework.

pub mod adapter;
pub mod config;
pub mod error;
pub mod handler;
pub mod logging;
pub mod runner;

pub use adapter::{CommandAdapter, JobAdapter};
pub use config::WorkerConfig;
pub use error::{AdapterError, WorkerError, WorkerResult};
pub use handler::{error_result, CallbackHandler};
pub use logging::JobLogger;
pub use runner::run_jobs;
