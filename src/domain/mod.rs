//! Domain layer types and invariants.

pub mod workers;

pub use workers::{WorkerIdentity, WorkerRecord};
