//! Data model: nodes, choices, effects, gates and the play state.

pub mod effect;
pub mod node;
pub mod state;
