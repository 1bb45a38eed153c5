//! Integration test modules for soundscape
//!
//! - engine: construction, checkpoint loading, fallback and status
//! - training: end-to-end training runs through the engine
//! - generation: output contract of learned generation
//! - evaluation: quality heuristics over generated compositions

pub mod engine;
pub mod evaluation;
pub mod generation;
pub mod training;
