//! Story Engine: a branching-narrative runtime for multi-ending visual novels.
//!
//! Drives a story through an immutable graph of narrative nodes, gating and
//! applying player choices against a small mutable play state, revealing
//! node text at a typewriter cadence, and projecting presentation tags for
//! whatever renderer or audio mixer sits on top.

pub mod core;
pub mod schema;
pub mod story;
