//! # Persistence Layer
//!
//! Repository implementations.

pub mod in_memory;

pub use in_memory::InMemoryPositionRepository;
