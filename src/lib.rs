//! Durable worker-to-cookie bindings with a commit-aware read-through cache.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use worker_cookies::application::WorkerCookieService;
//! use worker_cookies::cache::{CacheConfig, L0WorkerCache};
//! use worker_cookies::domain::WorkerIdentity;
//! use worker_cookies::infra::InMemoryWorkersRepo;
//!
//! let config = CacheConfig::default();
//! let service = WorkerCookieService::new(
//!     Arc::new(InMemoryWorkersRepo::new()),
//!     Arc::new(L0WorkerCache::new(&config)),
//!     config,
//! );
//!
//! let worker = WorkerIdentity::new("5f1d7c", "build-07", "10.4.0.17");
//! service.associate_cookie(&worker, "s3cr3t")?;
//! assert_eq!(service.cookie_for(&worker)?.as_deref(), Some("s3cr3t"));
//! # Ok::<(), worker_cookies::application::WorkerError>(())
//! ```

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
