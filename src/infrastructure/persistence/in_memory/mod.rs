//! # In-Memory Repositories
//!
//! Repository implementations backed by process memory.

pub mod position_repository;

pub use position_repository::InMemoryPositionRepository;
