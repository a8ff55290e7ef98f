use serde::{Deserialize, Serialize};
use std::fmt;

use super::effect::{Effect, Gate};

/// Newtype wrapper for story node IDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Background effect a renderer may apply while a node is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BackgroundEffect {
    #[default]
    Normal,
    Heartbeat,
    Glitch,
    RedFlash,
    Shake,
    Blood,
}

impl BackgroundEffect {
    /// Returns the tag string for this effect (e.g., "bg:red-flash").
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Normal => "bg:normal",
            Self::Heartbeat => "bg:heartbeat",
            Self::Glitch => "bg:glitch",
            Self::RedFlash => "bg:red-flash",
            Self::Shake => "bg:shake",
            Self::Blood => "bg:blood",
        }
    }

    /// The audio cue played with this background when a node names none.
    pub fn default_cue(&self) -> AudioCue {
        match self {
            Self::Normal => AudioCue::Ambient,
            Self::Heartbeat => AudioCue::Heartbeat,
            Self::Glitch => AudioCue::Glitch,
            Self::RedFlash | Self::Blood => AudioCue::Scream,
            Self::Shake => AudioCue::Footsteps,
        }
    }
}

/// Who is speaking the node's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Speaker {
    Sculptor,
    Anna,
    Marcus,
    Detective,
    Narrator,
}

impl Speaker {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Sculptor => "speaker:sculptor",
            Self::Anna => "speaker:anna",
            Self::Marcus => "speaker:marcus",
            Self::Detective => "speaker:detective",
            Self::Narrator => "speaker:narrator",
        }
    }
}

/// Sound an audio mixer may play on entering a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioCue {
    Ambient,
    Heartbeat,
    Scream,
    Breath,
    Drip,
    Footsteps,
    DoorCreak,
    Glitch,
}

impl AudioCue {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Ambient => "sfx:ambient",
            Self::Heartbeat => "sfx:heartbeat",
            Self::Scream => "sfx:scream",
            Self::Breath => "sfx:breath",
            Self::Drip => "sfx:drip",
            Self::Footsteps => "sfx:footsteps",
            Self::DoorCreak => "sfx:door_creak",
            Self::Glitch => "sfx:glitch",
        }
    }
}

/// An edge out of a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub text: String,
    pub target: NodeId,
    pub effect: Option<Effect>,
    pub gate: Option<Gate>,
    /// Seconds of visual countdown. Never enforced by the engine.
    pub countdown: Option<u32>,
}

impl Choice {
    pub fn new(text: impl Into<String>, target: impl Into<NodeId>) -> Self {
        Self {
            text: text.into(),
            target: target.into(),
            effect: None,
            gate: None,
            countdown: None,
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effect = Some(effect);
        self
    }

    pub fn with_gate(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn with_countdown(mut self, seconds: u32) -> Self {
        self.countdown = Some(seconds);
        self
    }
}

/// A single narrative beat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryNode {
    pub id: NodeId,
    /// Narrative text. Newlines are paragraph breaks and are kept verbatim.
    pub text: String,
    pub choices: Vec<Choice>,
    pub background: Option<BackgroundEffect>,
    pub chapter: Option<String>,
    pub speaker: Option<Speaker>,
    pub audio: Option<AudioCue>,
}

impl StoryNode {
    pub fn new(id: impl Into<NodeId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            choices: Vec::new(),
            background: None,
            chapter: None,
            speaker: None,
            audio: None,
        }
    }

    pub fn with_choice(mut self, choice: Choice) -> Self {
        self.choices.push(choice);
        self
    }

    pub fn with_background(mut self, background: BackgroundEffect) -> Self {
        self.background = Some(background);
        self
    }

    pub fn with_chapter(mut self, chapter: impl Into<String>) -> Self {
        self.chapter = Some(chapter.into());
        self
    }

    pub fn with_speaker(mut self, speaker: Speaker) -> Self {
        self.speaker = Some(speaker);
        self
    }

    pub fn with_audio(mut self, audio: AudioCue) -> Self {
        self.audio = Some(audio);
        self
    }

    /// A node with no choices ends the playthrough.
    pub fn is_terminal(&self) -> bool {
        self.choices.is_empty()
    }

    /// The explicit audio cue, or the one implied by the background.
    pub fn audio_cue(&self) -> AudioCue {
        self.audio
            .unwrap_or_else(|| self.background.unwrap_or_default().default_cue())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_iff_no_choices() {
        let ending = StoryNode::new("ending_a", "The end.");
        assert!(ending.is_terminal());

        let beat = StoryNode::new("beat", "Go on.").with_choice(Choice::new("Next", "ending_a"));
        assert!(!beat.is_terminal());
    }

    #[test]
    fn background_tags() {
        assert_eq!(BackgroundEffect::RedFlash.tag(), "bg:red-flash");
        assert_eq!(BackgroundEffect::Normal.tag(), "bg:normal");
        assert_eq!(BackgroundEffect::Blood.tag(), "bg:blood");
    }

    #[test]
    fn audio_cue_falls_back_to_background() {
        let node = StoryNode::new("n", "...").with_background(BackgroundEffect::Heartbeat);
        assert_eq!(node.audio_cue(), AudioCue::Heartbeat);

        let plain = StoryNode::new("p", "...");
        assert_eq!(plain.audio_cue(), AudioCue::Ambient);

        let explicit = StoryNode::new("e", "...")
            .with_background(BackgroundEffect::Blood)
            .with_audio(AudioCue::Drip);
        assert_eq!(explicit.audio_cue(), AudioCue::Drip);
    }

    #[test]
    fn choice_builder() {
        let c = Choice::new("Kick him!", "fight").with_countdown(5);
        assert_eq!(c.target, NodeId::from("fight"));
        assert_eq!(c.countdown, Some(5));
        assert!(c.effect.is_none());
        assert!(c.gate.is_none());
    }

    #[test]
    fn node_id_display() {
        assert_eq!(NodeId::new("start").to_string(), "start");
        assert_eq!(NodeId::from("start").as_str(), "start");
    }

    #[test]
    fn speaker_tags() {
        assert_eq!(Speaker::Sculptor.tag(), "speaker:sculptor");
        assert_eq!(Speaker::Narrator.tag(), "speaker:narrator");
    }
}
