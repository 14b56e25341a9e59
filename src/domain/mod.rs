//! Domain layer containing business entities and the storage contract.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - The [`repositories::KvStore`] contract and key layout
//!
//! # Design Principles
//!
//! - Domain layer has no dependencies on infrastructure or presentation layers
//! - All shared state is reached through [`repositories::KvStore`], never
//!   held in process memory
//! - Business logic lives in services (see [`crate::application::services`])

pub mod entities;
pub mod repositories;
