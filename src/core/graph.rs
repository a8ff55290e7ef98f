/// Story graph: immutable node table, RON loading, and integrity checks.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::collections::VecDeque;
use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::schema::effect::{Effect, EffectOp, Gate};
use crate::schema::node::{AudioCue, BackgroundEffect, Choice, NodeId, Speaker, StoryNode};

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("story node not found: {0}")]
    NodeNotFound(NodeId),
    #[error("story graph failed validation with {} error(s): {}", .0.errors.len(), .0.first_error())]
    Invalid(ValidationReport),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// A single finding from [`StoryGraph::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    MissingStart(NodeId),
    /// Two nodes share an ID. Only the last one would survive in the table.
    DuplicateNode(NodeId),
    DanglingTarget {
        node: NodeId,
        choice: usize,
        target: NodeId,
    },
    Unreachable(NodeId),
    /// Every choice on a non-terminal node is gated, so some states may
    /// leave the player with nothing to pick.
    AllChoicesGated(NodeId),
    DuplicateChoiceText {
        node: NodeId,
        text: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStart(id) => write!(f, "start node '{}' does not exist", id),
            Self::DuplicateNode(id) => write!(f, "node '{}' is defined more than once", id),
            Self::DanglingTarget {
                node,
                choice,
                target,
            } => write!(
                f,
                "node '{}' choice {} targets non-existent node '{}'",
                node, choice, target
            ),
            Self::Unreachable(id) => write!(f, "node '{}' is unreachable from the start", id),
            Self::AllChoicesGated(id) => {
                write!(f, "node '{}' has no ungated choice (possible soft lock)", id)
            }
            Self::DuplicateChoiceText { node, text } => {
                write!(f, "node '{}' offers the choice '{}' more than once", node, text)
            }
        }
    }
}

/// Errors make a graph unusable; warnings flag dead or risky content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn first_error(&self) -> String {
        self.errors
            .first()
            .map(|e| e.to_string())
            .unwrap_or_default()
    }
}

/// The static directed graph of narrative nodes.
///
/// Built once and never mutated. Construction validates the graph, so a
/// `StoryGraph` value never holds a dangling edge.
#[derive(Debug, Clone)]
pub struct StoryGraph {
    start: NodeId,
    nodes: FxHashMap<NodeId, StoryNode>,
}

impl StoryGraph {
    /// Build a graph from its nodes. Fails if the start node is missing,
    /// two nodes share an ID, or any choice targets a node that does not
    /// exist.
    pub fn new(start: impl Into<NodeId>, nodes: Vec<StoryNode>) -> Result<StoryGraph, GraphError> {
        let mut table = FxHashMap::default();
        let mut duplicates = Vec::new();
        for node in nodes {
            let id = node.id.clone();
            if table.insert(id.clone(), node).is_some() && !duplicates.contains(&id) {
                duplicates.push(id);
            }
        }
        let graph = StoryGraph {
            start: start.into(),
            nodes: table,
        };

        let mut report = graph.validate();
        report
            .errors
            .extend(duplicates.into_iter().map(ValidationIssue::DuplicateNode));
        for warning in &report.warnings {
            tracing::warn!(%warning, "story graph warning");
        }
        if !report.is_ok() {
            return Err(GraphError::Invalid(report));
        }
        Ok(graph)
    }

    /// Look up a node. A miss is an authoring defect, never a runtime case.
    pub fn get(&self, id: &NodeId) -> Result<&StoryNode, GraphError> {
        self.nodes.get(id).ok_or_else(|| {
            tracing::error!(node = %id, "story node not found");
            GraphError::NodeNotFound(id.clone())
        })
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn start(&self) -> &NodeId {
        &self.start
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &StoryNode> {
        self.nodes.values()
    }

    /// All node IDs, sorted.
    pub fn node_ids(&self) -> Vec<&NodeId> {
        let mut ids: Vec<&NodeId> = self.nodes.keys().collect();
        ids.sort();
        ids
    }

    /// IDs of every terminal node, sorted.
    pub fn endings(&self) -> Vec<&NodeId> {
        let mut ids: Vec<&NodeId> = self
            .nodes
            .values()
            .filter(|n| n.is_terminal())
            .map(|n| &n.id)
            .collect();
        ids.sort();
        ids
    }

    /// Every node reachable from the start by following choices,
    /// ignoring gates.
    pub fn reachable(&self) -> FxHashSet<NodeId> {
        let mut seen = FxHashSet::default();
        let mut queue = VecDeque::new();
        if self.nodes.contains_key(&self.start) {
            seen.insert(self.start.clone());
            queue.push_back(&self.start);
        }
        while let Some(id) = queue.pop_front() {
            if let Some(node) = self.nodes.get(id) {
                for choice in &node.choices {
                    if self.nodes.contains_key(&choice.target) && seen.insert(choice.target.clone())
                    {
                        queue.push_back(&choice.target);
                    }
                }
            }
        }
        seen
    }

    /// Check graph integrity and report dead or risky content.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();

        if !self.nodes.contains_key(&self.start) {
            report
                .errors
                .push(ValidationIssue::MissingStart(self.start.clone()));
        }

        for id in self.node_ids() {
            let node = &self.nodes[id];
            let mut texts = FxHashSet::default();
            for (i, choice) in node.choices.iter().enumerate() {
                if !self.nodes.contains_key(&choice.target) {
                    report.errors.push(ValidationIssue::DanglingTarget {
                        node: id.clone(),
                        choice: i,
                        target: choice.target.clone(),
                    });
                }
                if !texts.insert(choice.text.as_str()) {
                    report.warnings.push(ValidationIssue::DuplicateChoiceText {
                        node: id.clone(),
                        text: choice.text.clone(),
                    });
                }
            }
            if !node.is_terminal() && node.choices.iter().all(|c| c.gate.is_some()) {
                report
                    .warnings
                    .push(ValidationIssue::AllChoicesGated(id.clone()));
            }
        }

        let reachable = self.reachable();
        for id in self.node_ids() {
            if !reachable.contains(id) {
                report.warnings.push(ValidationIssue::Unreachable(id.clone()));
            }
        }

        report
    }
}

// RON deserialization helpers. Story files key nodes by ID and use plain
// strings for targets, so we read into intermediate structs.

#[derive(Debug, Deserialize)]
#[serde(rename = "Story")]
struct RonStory {
    start: String,
    #[serde(deserialize_with = "node_entries")]
    nodes: Vec<(String, RonNode)>,
}

/// Read the `nodes` map as a list of entries so a repeated key reaches
/// `StoryGraph::new` instead of overwriting the earlier node.
fn node_entries<'de, D>(deserializer: D) -> Result<Vec<(String, RonNode)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Entries;

    impl<'de> Visitor<'de> for Entries {
        type Value = Vec<(String, RonNode)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of node IDs to nodes")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(Entries)
}

#[derive(Debug, Deserialize)]
#[serde(rename = "Node")]
struct RonNode {
    text: String,
    #[serde(default)]
    choices: Vec<RonChoice>,
    #[serde(default)]
    background: Option<BackgroundEffect>,
    #[serde(default)]
    chapter: Option<String>,
    #[serde(default)]
    speaker: Option<Speaker>,
    #[serde(default)]
    audio: Option<AudioCue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename = "Choice")]
struct RonChoice {
    text: String,
    target: String,
    #[serde(default)]
    effect: Vec<EffectOp>,
    #[serde(default)]
    gate: Option<Gate>,
    #[serde(default)]
    countdown: Option<u32>,
}

impl StoryGraph {
    /// Load a story graph from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<StoryGraph, GraphError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a story graph from a RON string.
    pub fn parse_ron(input: &str) -> Result<StoryGraph, GraphError> {
        let raw: RonStory = ron::from_str(input)?;
        let mut nodes = Vec::with_capacity(raw.nodes.len());

        for (id, ron_node) in raw.nodes {
            let choices = ron_node
                .choices
                .into_iter()
                .map(|c| Choice {
                    text: c.text,
                    target: NodeId(c.target),
                    effect: if c.effect.is_empty() {
                        None
                    } else {
                        Some(Effect::Ops(c.effect))
                    },
                    gate: c.gate,
                    countdown: c.countdown,
                })
                .collect();
            nodes.push(StoryNode {
                id: NodeId(id),
                text: ron_node.text,
                choices,
                background: ron_node.background,
                chapter: ron_node.chapter,
                speaker: ron_node.speaker,
                audio: ron_node.audio,
            });
        }

        StoryGraph::new(NodeId(raw.start), nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::state::{Flag, Stat};

    fn small_graph() -> Vec<StoryNode> {
        vec![
            StoryNode::new("start", "Cold. Damp.")
                .with_choice(Choice::new("Call out", "voice"))
                .with_choice(Choice::new("Stay silent", "ending_quiet")),
            StoryNode::new("voice", "Someone answers.")
                .with_choice(Choice::new("Back", "start"))
                .with_choice(Choice::new("Run", "ending_quiet")),
            StoryNode::new("ending_quiet", "ENDING: QUIET"),
        ]
    }

    #[test]
    fn builds_valid_graph() {
        let graph = StoryGraph::new("start", small_graph()).unwrap();
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.start(), &NodeId::from("start"));
        assert!(graph.contains(&NodeId::from("voice")));
    }

    #[test]
    fn get_missing_node_fails() {
        let graph = StoryGraph::new("start", small_graph()).unwrap();
        let err = graph.get(&NodeId::from("nowhere")).unwrap_err();
        assert!(matches!(err, GraphError::NodeNotFound(ref id) if id.as_str() == "nowhere"));
    }

    #[test]
    fn dangling_target_is_rejected() {
        let mut nodes = small_graph();
        nodes[1].choices.push(Choice::new("Into the dark", "basement"));
        let err = StoryGraph::new("start", nodes).unwrap_err();
        match err {
            GraphError::Invalid(report) => {
                assert_eq!(
                    report.errors,
                    vec![ValidationIssue::DanglingTarget {
                        node: NodeId::from("voice"),
                        choice: 2,
                        target: NodeId::from("basement"),
                    }]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_node_id_is_rejected() {
        let nodes = vec![
            StoryNode::new("start", "first").with_choice(Choice::new("On", "end")),
            StoryNode::new("start", "second").with_choice(Choice::new("On", "end")),
            StoryNode::new("end", "Done."),
        ];
        let err = StoryGraph::new("start", nodes).unwrap_err();
        match err {
            GraphError::Invalid(ref report) => {
                assert_eq!(
                    report.errors,
                    vec![ValidationIssue::DuplicateNode(NodeId::from("start"))]
                );
            }
            ref other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("defined more than once"));
    }

    #[test]
    fn missing_start_is_rejected() {
        let err = StoryGraph::new("prologue", small_graph()).unwrap_err();
        assert!(matches!(
            err,
            GraphError::Invalid(ref r) if r.errors.contains(&ValidationIssue::MissingStart(NodeId::from("prologue")))
        ));
        assert!(err.to_string().contains("prologue"));
    }

    #[test]
    fn unreachable_node_is_a_warning() {
        let mut nodes = small_graph();
        nodes.push(StoryNode::new("orphan", "Nobody comes here."));
        let graph = StoryGraph::new("start", nodes).unwrap();
        let report = graph.validate();
        assert!(report.is_ok());
        assert_eq!(
            report.warnings,
            vec![ValidationIssue::Unreachable(NodeId::from("orphan"))]
        );
        assert!(!graph.reachable().contains(&NodeId::from("orphan")));
    }

    #[test]
    fn fully_gated_node_is_a_warning() {
        let nodes = vec![
            StoryNode::new("start", "A locked door.").with_choice(
                Choice::new("Use the knife", "ending").with_gate(Gate::Flag(Flag::HasWeapon)),
            ),
            StoryNode::new("ending", "Out."),
        ];
        let graph = StoryGraph::new("start", nodes).unwrap();
        assert!(graph
            .validate()
            .warnings
            .contains(&ValidationIssue::AllChoicesGated(NodeId::from("start"))));
    }

    #[test]
    fn duplicate_choice_text_is_a_warning() {
        let nodes = vec![
            StoryNode::new("start", "Fork.")
                .with_choice(Choice::new("Continue", "end"))
                .with_choice(Choice::new("Continue", "end")),
            StoryNode::new("end", "Done."),
        ];
        let graph = StoryGraph::new("start", nodes).unwrap();
        assert_eq!(graph.validate().warnings.len(), 1);
    }

    #[test]
    fn endings_are_terminal_nodes() {
        let graph = StoryGraph::new("start", small_graph()).unwrap();
        assert_eq!(graph.endings(), vec![&NodeId::from("ending_quiet")]);
    }

    #[test]
    fn parse_story_from_ron() {
        let input = r#"Story(
            start: "start",
            nodes: {
                "start": Node(
                    chapter: Some("ACT I"),
                    text: "Cold.\n\nDamp.",
                    choices: [
                        Choice(text: "Scream", target: "end", effect: [Adjust(stat: Sanity, by: -10)]),
                        Choice(text: "Wait", target: "end", gate: Some(AtLeast(stat: Sanity, value: 50)), countdown: Some(5)),
                    ],
                ),
                "end": Node(text: "ENDING", background: Some(Blood)),
            },
        )"#;
        let graph = StoryGraph::parse_ron(input).unwrap();
        let start = graph.get(&NodeId::from("start")).unwrap();
        assert_eq!(start.text, "Cold.\n\nDamp.");
        assert_eq!(start.chapter.as_deref(), Some("ACT I"));
        assert_eq!(start.choices.len(), 2);
        assert!(start.choices[0].effect.is_some());
        assert!(start.choices[1].effect.is_none());
        assert!(start.choices[1].gate.is_some());
        assert_eq!(start.choices[1].countdown, Some(5));

        let end = graph.get(&NodeId::from("end")).unwrap();
        assert!(end.is_terminal());
        assert_eq!(end.background, Some(BackgroundEffect::Blood));

        let patch = start.choices[0]
            .effect
            .as_ref()
            .unwrap()
            .patch(&crate::schema::state::PlayState::initial());
        assert_eq!(patch.stat(Stat::Sanity), Some(90));
    }

    #[test]
    fn parse_rejects_dangling_ron() {
        let input = r#"Story(
            start: "start",
            nodes: {
                "start": Node(text: "x", choices: [Choice(text: "go", target: "missing")]),
            },
        )"#;
        assert!(matches!(
            StoryGraph::parse_ron(input),
            Err(GraphError::Invalid(_))
        ));
    }

    #[test]
    fn parse_rejects_repeated_node_key() {
        let input = r#"Story(
            start: "start",
            nodes: {
                "start": Node(text: "first", choices: [Choice(text: "go", target: "end")]),
                "end": Node(text: "ENDING"),
                "start": Node(text: "second", choices: [Choice(text: "go", target: "end")]),
            },
        )"#;
        match StoryGraph::parse_ron(input) {
            Err(GraphError::Invalid(report)) => assert_eq!(
                report.errors,
                vec![ValidationIssue::DuplicateNode(NodeId::from("start"))]
            ),
            other => panic!("expected a duplicate node error, got {other:?}"),
        }
    }

    #[test]
    fn parse_rejects_malformed_ron() {
        assert!(matches!(
            StoryGraph::parse_ron("Story(start: "),
            Err(GraphError::Ron(_))
        ));
    }
}
