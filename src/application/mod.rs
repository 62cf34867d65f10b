//! Application services layer.

pub mod repos;
pub mod tx;
pub mod workers;

pub use workers::{WorkerCookieService, WorkerError};
