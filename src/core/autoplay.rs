/// Seeded random playthroughs, for coverage checks and soak tests.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::core::engine::{ChoiceOutcome, EngineError, StoryEngine};
use crate::schema::node::NodeId;

/// One finished (or abandoned) run through a story.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playthrough {
    /// Every node entered, starting with the start node.
    pub path: Vec<NodeId>,
    /// The ending reached, or `None` if the step limit ran out first.
    pub ending: Option<NodeId>,
    pub steps: usize,
}

/// Picks uniformly among the available choices at every node.
pub struct Autoplayer {
    rng: StdRng,
}

impl Autoplayer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Restart `engine` and play until an ending or `max_steps` choices.
    pub fn play(
        &mut self,
        engine: &mut StoryEngine,
        max_steps: usize,
    ) -> Result<Playthrough, EngineError> {
        engine.restart()?;
        let mut steps = 0;

        while !engine.is_ending() && steps < max_steps {
            engine.fast_forward();
            let choices = engine.available_choices()?;
            let Some(pick) = choices.choose(&mut self.rng) else {
                tracing::warn!(node = %engine.phase().node(), "no available choice, stopping");
                break;
            };
            if let ChoiceOutcome::Rejected(reason) = engine.choose(pick.index)? {
                tracing::warn!(?reason, "autoplay choice rejected, stopping");
                break;
            }
            steps += 1;
        }

        let ending = engine
            .is_ending()
            .then(|| engine.phase().node().clone());
        tracing::debug!(steps, ending = ?ending, "playthrough finished");
        Ok(Playthrough {
            path: engine.history().to_vec(),
            ending,
            steps,
        })
    }
}
