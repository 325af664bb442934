//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the durable storage contract used by the persistence gateway
//!   and the license gate.
//! - Isolate SQLite query details from service orchestration.

pub mod kv_repo;
