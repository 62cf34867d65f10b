//! Infrastructure adapters: in-process store, telemetry bootstrap, errors.

pub mod error;
pub mod memory;
pub mod telemetry;

pub use memory::InMemoryWorkersRepo;
