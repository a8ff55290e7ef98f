/// Effect evaluator: choice availability and the patches choices produce.
///
/// Both operations are pure: the only input is the state passed in.

use crate::schema::node::{Choice, StoryNode};
use crate::schema::state::{PlayState, StatePatch};

/// Whether `choice` can be taken in `state`. Ungated choices always can.
pub fn is_available(choice: &Choice, state: &PlayState) -> bool {
    choice.gate.as_ref().map_or(true, |gate| gate.allows(state))
}

/// The patch taking `choice` in `state` would apply. Choices without an
/// effect yield an empty patch.
pub fn compute_effect(choice: &Choice, state: &PlayState) -> StatePatch {
    choice
        .effect
        .as_ref()
        .map(|effect| effect.patch(state))
        .unwrap_or_default()
}

/// The node's choices that are available in `state`, in authored order,
/// paired with their index in the node's full choice list.
pub fn available_choices<'a>(node: &'a StoryNode, state: &PlayState) -> Vec<(usize, &'a Choice)> {
    node.choices
        .iter()
        .enumerate()
        .filter(|(_, choice)| is_available(choice, state))
        .collect()
}
