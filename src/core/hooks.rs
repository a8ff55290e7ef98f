/// Presentation hooks: read-only projections of the active node for
/// renderers and audio mixers.

use crate::core::evaluator;
use crate::core::reveal::RevealEvent;
use crate::schema::node::{AudioCue, BackgroundEffect, NodeId, Speaker, StoryNode};
use crate::schema::state::PlayState;

/// Below this sanity the status readout is flagged critical.
pub const CRITICAL_SANITY: i32 = 50;

/// A choice as the player sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceView {
    /// Index into the node's full choice list; pass this to `choose`.
    pub index: usize,
    pub text: String,
    pub countdown: Option<u32>,
}

/// Everything a frontend needs to present one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeView {
    pub id: NodeId,
    pub text: String,
    pub chapter: Option<String>,
    pub background: BackgroundEffect,
    pub speaker: Option<Speaker>,
    pub audio: AudioCue,
    /// Choices available in the current state, in authored order.
    pub choices: Vec<ChoiceView>,
    pub is_ending: bool,
}

impl NodeView {
    pub fn project(node: &StoryNode, state: &PlayState) -> NodeView {
        let choices = evaluator::available_choices(node, state)
            .into_iter()
            .map(|(index, choice)| ChoiceView {
                index,
                text: choice.text.clone(),
                countdown: choice.countdown,
            })
            .collect();
        NodeView {
            id: node.id.clone(),
            text: node.text.clone(),
            chapter: node.chapter.clone(),
            background: node.background.unwrap_or_default(),
            speaker: node.speaker,
            audio: node.audio_cue(),
            choices,
            is_ending: node.is_terminal(),
        }
    }

    /// Tag strings for the node's presentation metadata.
    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags = vec![self.background.tag(), self.audio.tag()];
        if let Some(speaker) = self.speaker {
            tags.push(speaker.tag());
        }
        tags
    }
}

/// The status bar: what the player knows about their own state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusView {
    pub sanity: i32,
    pub sanity_critical: bool,
    pub armed: bool,
    pub act: i32,
}

impl StatusView {
    pub fn project(state: &PlayState) -> StatusView {
        StatusView {
            sanity: state.sanity,
            sanity_critical: state.sanity < CRITICAL_SANITY,
            armed: state.has_weapon,
            act: state.act,
        }
    }
}

/// Observer interface for frontends. The engine calls these after it has
/// finished changing state; implementations only read.
pub trait PresentationHooks {
    fn on_node(&mut self, _view: &NodeView) {}
    fn on_reveal(&mut self, _event: &RevealEvent) {}
    fn on_status(&mut self, _status: &StatusView) {}
    fn on_ending(&mut self, _view: &NodeView) {}
}
