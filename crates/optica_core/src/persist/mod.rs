//! Write-through persistence of the entity store collections.
//!
//! # Responsibility
//! - Own the well-known storage keys.
//! - Serialize whole collections on every change and rehydrate them at boot.
//!
//! # Invariants
//! - Each write fully replaces the stored collection; there is no diffing,
//!   batching or queue.
//! - Rehydration never fails because of stored bytes: unreadable values are
//!   quarantined and the collection starts empty.

pub mod gateway;
pub mod keys;

pub use gateway::{CollectionLoad, PersistenceGateway, RehydrateReport, Rehydrated};
