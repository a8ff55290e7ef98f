/// The traversal controller: Choice → Effect → Node orchestration.
///
/// Wires together the story graph, the play state store, the effect
/// evaluator, the reveal scheduler and any presentation hooks.

use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::core::config::{ConfigError, EngineConfig};
use crate::core::evaluator;
use crate::core::graph::{GraphError, StoryGraph};
use crate::core::hooks::{ChoiceView, NodeView, PresentationHooks, StatusView};
use crate::core::reveal::{RevealEvent, RevealScheduler};
use crate::core::store::PlayStateStore;
use crate::schema::node::{NodeId, StoryNode};
use crate::schema::state::PlayState;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("no story graph was provided to the builder")]
    MissingGraph,
}

/// Where the playthrough stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Viewing a node that still has choices.
    AtNode(NodeId),
    /// A terminal node was reached; only a restart continues play.
    Ending(NodeId),
}

impl Phase {
    pub fn node(&self) -> &NodeId {
        match self {
            Self::AtNode(id) | Self::Ending(id) => id,
        }
    }

    pub fn is_ending(&self) -> bool {
        matches!(self, Self::Ending(_))
    }
}

/// Why a selection was refused. Refusals never change state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    OutOfRange { index: usize, len: usize },
    /// The choice's gate is closed in the current state.
    Unavailable { index: usize },
    /// No available choice has this text.
    UnknownText(String),
    /// The playthrough is over; call `restart`.
    Ended,
    /// Strict mode only: the node text is still being revealed.
    RevealInProgress,
}

/// Result of a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceOutcome {
    Moved {
        from: NodeId,
        to: NodeId,
        ending: bool,
    },
    Rejected(RejectReason),
}

impl ChoiceOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// The top-level story engine. Built via `StoryEngine::builder()`.
pub struct StoryEngine {
    graph: StoryGraph,
    config: EngineConfig,
    store: PlayStateStore,
    reveal: RevealScheduler,
    phase: Phase,
    history: Vec<NodeId>,
    chapter: Option<String>,
    hooks: Vec<Box<dyn PresentationHooks>>,
}

/// Builder for constructing a `StoryEngine`.
pub struct StoryEngineBuilder {
    graph: Option<StoryGraph>,
    story_path: Option<String>,
    config: Option<EngineConfig>,
    config_path: Option<String>,
    hooks: Vec<Box<dyn PresentationHooks>>,
}

impl StoryEngine {
    pub fn builder() -> StoryEngineBuilder {
        StoryEngineBuilder {
            graph: None,
            story_path: None,
            config: None,
            config_path: None,
            hooks: Vec::new(),
        }
    }

    pub fn graph(&self) -> &StoryGraph {
        &self.graph
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &PlayState {
        self.store.current()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_ending(&self) -> bool {
        self.phase.is_ending()
    }

    pub fn current_node(&self) -> Result<&StoryNode, EngineError> {
        Ok(self.graph.get(self.phase.node())?)
    }

    /// Node IDs entered during this playthrough, oldest first.
    pub fn history(&self) -> &[NodeId] {
        &self.history
    }

    /// The most recent chapter label seen in this playthrough.
    pub fn current_chapter(&self) -> Option<&str> {
        self.chapter.as_deref()
    }

    pub fn view(&self) -> Result<NodeView, EngineError> {
        Ok(NodeView::project(self.current_node()?, self.store.current()))
    }

    pub fn status(&self) -> StatusView {
        StatusView::project(self.store.current())
    }

    /// Choices available in the current state. Empty at an ending.
    pub fn available_choices(&self) -> Result<Vec<ChoiceView>, EngineError> {
        Ok(self.view()?.choices)
    }

    /// Choices a frontend should offer right now: none while the text is
    /// still being revealed.
    pub fn selectable_choices(&self) -> Result<Vec<ChoiceView>, EngineError> {
        if self.reveal.is_typing() {
            return Ok(Vec::new());
        }
        self.available_choices()
    }

    pub fn add_hooks(&mut self, hooks: Box<dyn PresentationHooks>) {
        self.hooks.push(hooks);
    }

    /// Take the choice at `index` in the current node's full choice list.
    pub fn choose(&mut self, index: usize) -> Result<ChoiceOutcome, EngineError> {
        if self.phase.is_ending() {
            return Ok(self.reject(RejectReason::Ended));
        }
        if self.config.strict_reveal_gate && self.reveal.is_typing() {
            return Ok(self.reject(RejectReason::RevealInProgress));
        }

        let from = self.phase.node().clone();
        let node = self.graph.get(&from)?;
        let Some(choice) = node.choices.get(index) else {
            let len = node.choices.len();
            return Ok(self.reject(RejectReason::OutOfRange { index, len }));
        };
        if !evaluator::is_available(choice, self.store.current()) {
            return Ok(self.reject(RejectReason::Unavailable { index }));
        }

        let patch = evaluator::compute_effect(choice, self.store.current());
        let target = choice.target.clone();
        // Resolve the target before touching state so a bad edge leaves
        // the playthrough exactly as it was.
        self.graph.get(&target)?;

        self.store.apply(&patch);
        tracing::debug!(from = %from, to = %target, choice = index, "transition");
        self.enter(target.clone())?;

        Ok(ChoiceOutcome::Moved {
            from,
            to: target,
            ending: self.phase.is_ending(),
        })
    }

    /// Take the available choice whose text is `text`.
    pub fn choose_by_text(&mut self, text: &str) -> Result<ChoiceOutcome, EngineError> {
        let found = self
            .available_choices()?
            .into_iter()
            .find(|c| c.text == text)
            .map(|c| c.index);
        match found {
            Some(index) => self.choose(index),
            None if self.phase.is_ending() => Ok(self.reject(RejectReason::Ended)),
            None => Ok(self.reject(RejectReason::UnknownText(text.to_string()))),
        }
    }

    /// Drop all progress and start over from the story's start node.
    pub fn restart(&mut self) -> Result<(), EngineError> {
        self.reveal.cancel();
        self.store.reset();
        self.history.clear();
        self.chapter = None;
        let start = self.graph.start().clone();
        tracing::info!(start = %start, "story restarted");
        self.enter(start)
    }

    /// Advance the reveal clock and forward the resulting events to hooks.
    pub fn advance_reveal(&mut self, elapsed: Duration) -> Vec<RevealEvent> {
        let events = self.reveal.advance(elapsed);
        self.publish_reveal(&events);
        events
    }

    /// Reveal the rest of the current node's text at once.
    pub fn fast_forward(&mut self) -> Vec<RevealEvent> {
        let events = self.reveal.skip();
        self.publish_reveal(&events);
        events
    }

    pub fn is_typing(&self) -> bool {
        self.reveal.is_typing()
    }

    pub fn revealed_text(&self) -> &str {
        self.reveal.revealed()
    }

    /// Time until the current node's text is fully revealed.
    pub fn reveal_remaining(&self) -> Duration {
        self.reveal.remaining()
    }

    fn enter(&mut self, id: NodeId) -> Result<(), EngineError> {
        let node = self.graph.get(&id)?;

        if let Some(ref chapter) = node.chapter {
            self.chapter = Some(chapter.clone());
        }
        self.reveal.start(&node.text);
        self.phase = if node.is_terminal() {
            Phase::Ending(id.clone())
        } else {
            Phase::AtNode(id.clone())
        };
        self.history.push(id);

        let view = NodeView::project(node, self.store.current());
        let status = StatusView::project(self.store.current());
        if view.is_ending {
            tracing::info!(ending = %view.id, steps = self.history.len(), "ending reached");
        }
        for hooks in &mut self.hooks {
            hooks.on_node(&view);
            hooks.on_status(&status);
            if view.is_ending {
                hooks.on_ending(&view);
            }
        }
        Ok(())
    }

    fn reject(&self, reason: RejectReason) -> ChoiceOutcome {
        tracing::warn!(node = %self.phase.node(), ?reason, "choice rejected");
        ChoiceOutcome::Rejected(reason)
    }

    fn publish_reveal(&mut self, events: &[RevealEvent]) {
        for hooks in &mut self.hooks {
            for event in events {
                hooks.on_reveal(event);
            }
        }
    }
}

impl StoryEngineBuilder {
    /// Provide the story graph directly.
    pub fn graph(mut self, graph: StoryGraph) -> Self {
        self.graph = Some(graph);
        self
    }

    /// Load the story graph from a RON file at build time.
    pub fn story_file(mut self, path: &str) -> Self {
        self.story_path = Some(path.to_string());
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Load the configuration from a RON file at build time. A config given
    /// with `config` takes precedence.
    pub fn config_file(mut self, path: &str) -> Self {
        self.config_path = Some(path.to_string());
        self
    }

    pub fn hooks(mut self, hooks: Box<dyn PresentationHooks>) -> Self {
        self.hooks.push(hooks);
        self
    }

    pub fn build(self) -> Result<StoryEngine, EngineError> {
        let config = match (self.config, self.config_path) {
            (Some(config), _) => config,
            (None, Some(path)) => EngineConfig::load_from_ron(Path::new(&path))?,
            (None, None) => EngineConfig::default(),
        };

        let graph = match (self.graph, self.story_path) {
            (Some(graph), _) => graph,
            (None, Some(path)) => StoryGraph::load_from_ron(Path::new(&path))?,
            (None, None) => return Err(EngineError::MissingGraph),
        };

        let start = graph.start().clone();
        let mut engine = StoryEngine {
            store: PlayStateStore::new(config.clamp),
            reveal: RevealScheduler::new(config.reveal_cadence()),
            phase: Phase::AtNode(start.clone()),
            history: Vec::new(),
            chapter: None,
            hooks: self.hooks,
            graph,
            config,
        };
        engine.enter(start)?;
        Ok(engine)
    }
}
