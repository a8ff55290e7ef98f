//! Bundled story content.

use crate::core::graph::{GraphError, StoryGraph};

/// RON source of "The Sculptor", the bundled horror story.
pub const SCULPTOR_STORY: &str = include_str!("../story_data/sculptor/story.ron");

/// Parse and validate the bundled story.
pub fn sculptor() -> Result<StoryGraph, GraphError> {
    StoryGraph::parse_ron(SCULPTOR_STORY)
}
