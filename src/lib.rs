// src/lib.rs
//! kiqueue: the producer side of a Sidekiq-compatible Redis job queue
//!
//! Worker types are registered once with a queue name and retry budget.
//! Enqueueing serializes a `{Type, Args, Retry, ID}` record and `RPUSH`es it
//! onto `queue:<name>`, while the `queues` set advertises every queue in use
//! so consumers can find them.

pub mod client;
pub mod config;
pub mod error;
pub mod id;
pub mod job;
pub mod registry;
pub mod store;
pub mod tracker;

pub use client::Client;
pub use config::ClientConfig;
pub use error::{KiqueueError, Result};
pub use id::JobId;
pub use job::{JobConfig, JobRecord, Worker};
pub use registry::JobRegistry;
pub use store::{Connection, Dialer, Pool, PooledConnection, RedisDialer};
pub use tracker::QueueTracker;

// Re-export commonly used types
pub use async_trait::async_trait;
pub use serde::Serialize;
