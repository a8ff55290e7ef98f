//! Runtime: graph, state store, evaluation, reveal timing and traversal.

pub mod autoplay;
pub mod config;
pub mod engine;
pub mod evaluator;
pub mod graph;
pub mod hooks;
pub mod reveal;
pub mod store;
