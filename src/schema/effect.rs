use serde::{Deserialize, Serialize};
use std::fmt;

use super::state::{Flag, PlayState, Stat, StatePatch};

/// Signature for hand-written effects. A plain `fn` cannot capture its
/// environment, so the only input an effect sees is the state it is given.
pub type EffectFn = fn(&PlayState) -> StatePatch;

/// Signature for hand-written gates.
pub type GateFn = fn(&PlayState) -> bool;

/// One step of a declarative effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectOp {
    /// Add `by` (possibly negative) to a numeric field.
    Adjust { stat: Stat, by: i32 },
    /// Overwrite a numeric field.
    Set { stat: Stat, value: i32 },
    SetFlag { flag: Flag, value: bool },
    /// Add a clue to the discovered set, keeping what was already there.
    Discover(String),
    /// Replace the discovered set with exactly these clues.
    ReplaceDiscoveries(Vec<String>),
}

/// What happens to the play state when a choice is taken.
#[derive(Clone, Serialize, Deserialize)]
pub enum Effect {
    Ops(Vec<EffectOp>),
    #[serde(skip)]
    Custom(EffectFn),
}

impl Effect {
    /// Compute the patch this effect produces for `state`.
    ///
    /// Ops compose left to right: each op reads the value an earlier op
    /// already wrote into the patch, falling back to `state`.
    pub fn patch(&self, state: &PlayState) -> StatePatch {
        match self {
            Self::Custom(f) => f(state),
            Self::Ops(ops) => {
                let mut patch = StatePatch::default();
                for op in ops {
                    match op {
                        EffectOp::Adjust { stat, by } => {
                            let base = patch.stat(*stat).unwrap_or_else(|| state.stat(*stat));
                            patch.set_stat(*stat, base.saturating_add(*by));
                        }
                        EffectOp::Set { stat, value } => patch.set_stat(*stat, *value),
                        EffectOp::SetFlag { flag, value } => patch.set_flag(*flag, *value),
                        EffectOp::Discover(clue) => {
                            let set = patch
                                .discoveries
                                .get_or_insert_with(|| state.discoveries.clone());
                            set.insert(clue.clone());
                        }
                        EffectOp::ReplaceDiscoveries(clues) => {
                            patch.discoveries = Some(clues.iter().cloned().collect());
                        }
                    }
                }
                patch
            }
        }
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ops(ops) => f.debug_tuple("Ops").field(ops).finish(),
            Self::Custom(_) => f.write_str("Custom(<fn>)"),
        }
    }
}

/// A predicate deciding whether a choice can currently be taken.
#[derive(Clone, Serialize, Deserialize)]
pub enum Gate {
    AtLeast { stat: Stat, value: i32 },
    AtMost { stat: Stat, value: i32 },
    Flag(Flag),
    NotFlag(Flag),
    Discovered(String),
    NotDiscovered(String),
    All(Vec<Gate>),
    Any(Vec<Gate>),
    Not(Box<Gate>),
    #[serde(skip)]
    Custom(GateFn),
}

impl Gate {
    pub fn allows(&self, state: &PlayState) -> bool {
        match self {
            Self::AtLeast { stat, value } => state.stat(*stat) >= *value,
            Self::AtMost { stat, value } => state.stat(*stat) <= *value,
            Self::Flag(flag) => state.flag(*flag),
            Self::NotFlag(flag) => !state.flag(*flag),
            Self::Discovered(clue) => state.has_discovered(clue),
            Self::NotDiscovered(clue) => !state.has_discovered(clue),
            Self::All(gates) => gates.iter().all(|g| g.allows(state)),
            Self::Any(gates) => gates.iter().any(|g| g.allows(state)),
            Self::Not(gate) => !gate.allows(state),
            Self::Custom(f) => f(state),
        }
    }
}

impl fmt::Debug for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AtLeast { stat, value } => write!(f, "{} >= {}", stat.name(), value),
            Self::AtMost { stat, value } => write!(f, "{} <= {}", stat.name(), value),
            Self::Flag(flag) => write!(f, "{}", flag.name()),
            Self::NotFlag(flag) => write!(f, "!{}", flag.name()),
            Self::Discovered(clue) => write!(f, "discovered({})", clue),
            Self::NotDiscovered(clue) => write!(f, "!discovered({})", clue),
            Self::All(gates) => f.debug_tuple("All").field(gates).finish(),
            Self::Any(gates) => f.debug_tuple("Any").field(gates).finish(),
            Self::Not(gate) => write!(f, "!({:?})", gate),
            Self::Custom(_) => f.write_str("Custom(<fn>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjust_reads_state() {
        let effect = Effect::Ops(vec![EffectOp::Adjust {
            stat: Stat::Sanity,
            by: -10,
        }]);
        let patch = effect.patch(&PlayState::initial());
        assert_eq!(patch.sanity, Some(90));
        assert_eq!(patch.trust, None);
    }

    #[test]
    fn ops_compose_left_to_right() {
        let effect = Effect::Ops(vec![
            EffectOp::Adjust {
                stat: Stat::Trust,
                by: 30,
            },
            EffectOp::Adjust {
                stat: Stat::Trust,
                by: -5,
            },
            EffectOp::Set {
                stat: Stat::Act,
                value: 2,
            },
        ]);
        let patch = effect.patch(&PlayState::initial());
        assert_eq!(patch.trust, Some(25));
        assert_eq!(patch.act, Some(2));
    }

    #[test]
    fn discover_appends_to_existing_clues() {
        let mut state = PlayState::initial();
        state.discoveries.insert("marcus_seen".to_string());
        let effect = Effect::Ops(vec![EffectOp::Discover("anna_ally".to_string())]);
        let patch = effect.patch(&state);
        let clues = patch.discoveries.unwrap();
        assert!(clues.contains("marcus_seen"));
        assert!(clues.contains("anna_ally"));
    }

    #[test]
    fn replace_discoveries_drops_existing_clues() {
        let mut state = PlayState::initial();
        state.discoveries.insert("marcus_seen".to_string());
        let effect = Effect::Ops(vec![EffectOp::ReplaceDiscoveries(vec![
            "police_arrive".to_string(),
        ])]);
        let clues = effect.patch(&state).discoveries.unwrap();
        assert_eq!(clues.len(), 1);
        assert!(clues.contains("police_arrive"));
    }

    #[test]
    fn custom_effect_is_called_with_state() {
        fn halve_sanity(s: &PlayState) -> StatePatch {
            StatePatch {
                sanity: Some(s.sanity / 2),
                ..Default::default()
            }
        }
        let patch = Effect::Custom(halve_sanity).patch(&PlayState::initial());
        assert_eq!(patch.sanity, Some(50));
    }

    #[test]
    fn gate_variants() {
        let mut state = PlayState::initial();
        state.trust = 40;
        state.has_weapon = true;
        state.discoveries.insert("anna_ally".to_string());

        assert!(Gate::AtLeast {
            stat: Stat::Trust,
            value: 40
        }
        .allows(&state));
        assert!(!Gate::AtMost {
            stat: Stat::Sanity,
            value: 50
        }
        .allows(&state));
        assert!(Gate::Flag(Flag::HasWeapon).allows(&state));
        assert!(Gate::NotFlag(Flag::IsInjured).allows(&state));
        assert!(Gate::Discovered("anna_ally".to_string()).allows(&state));
        assert!(!Gate::NotDiscovered("anna_ally".to_string()).allows(&state));
        assert!(Gate::Not(Box::new(Gate::Flag(Flag::KnowsName))).allows(&state));
    }

    #[test]
    fn gate_combinators() {
        let state = PlayState::initial();
        let armed = Gate::Flag(Flag::HasWeapon);
        let sane = Gate::AtLeast {
            stat: Stat::Sanity,
            value: 50,
        };
        assert!(!Gate::All(vec![armed.clone(), sane.clone()]).allows(&state));
        assert!(Gate::Any(vec![armed, sane]).allows(&state));
        assert!(Gate::All(vec![]).allows(&state));
        assert!(!Gate::Any(vec![]).allows(&state));
    }

    #[test]
    fn ops_deserialize_from_ron() {
        let ops: Vec<EffectOp> = ron::from_str(
            r#"[Adjust(stat: Sanity, by: -10), Discover("anna_ally"), SetFlag(flag: HasWeapon, value: true)]"#,
        )
        .unwrap();
        assert_eq!(ops.len(), 3);
        assert_eq!(
            ops[0],
            EffectOp::Adjust {
                stat: Stat::Sanity,
                by: -10
            }
        );
        assert_eq!(ops[1], EffectOp::Discover("anna_ally".to_string()));
    }

    #[test]
    fn gate_deserializes_from_ron() {
        let gate: Gate =
            ron::from_str(r#"All([AtLeast(stat: Trust, value: 40), Not(Flag(IsInjured))])"#).unwrap();
        let mut state = PlayState::initial();
        assert!(!gate.allows(&state));
        state.trust = 45;
        assert!(gate.allows(&state));
        state.is_injured = true;
        assert!(!gate.allows(&state));
    }

    #[test]
    fn debug_output_is_readable() {
        let gate = Gate::AtLeast {
            stat: Stat::Trust,
            value: 40,
        };
        assert_eq!(format!("{:?}", gate), "trust >= 40");
        fn noop(_: &PlayState) -> bool {
            true
        }
        assert_eq!(format!("{:?}", Gate::Custom(noop)), "Custom(<fn>)");
    }
}
