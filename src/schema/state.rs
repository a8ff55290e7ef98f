use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Numeric fields of [`PlayState`] that effects and gates can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stat {
    Sanity,
    Trust,
    AnnaRelation,
    MarcusRelation,
    TimeElapsed,
    Act,
}

impl Stat {
    /// Nominal range of the field. Only enforced under [`ClampPolicy::Clamp`].
    pub fn nominal_range(&self) -> (i32, i32) {
        match self {
            Self::Sanity | Self::Trust => (0, 100),
            Self::AnnaRelation | Self::MarcusRelation => (-100, 100),
            Self::TimeElapsed => (0, i32::MAX),
            Self::Act => (1, 3),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sanity => "sanity",
            Self::Trust => "trust",
            Self::AnnaRelation => "anna_relation",
            Self::MarcusRelation => "marcus_relation",
            Self::TimeElapsed => "time_elapsed",
            Self::Act => "act",
        }
    }
}

/// Boolean fields of [`PlayState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flag {
    HasWeapon,
    KnowsName,
    IsInjured,
}

impl Flag {
    pub fn name(&self) -> &'static str {
        match self {
            Self::HasWeapon => "has_weapon",
            Self::KnowsName => "knows_name",
            Self::IsInjured => "is_injured",
        }
    }
}

/// Whether bounded fields are forced back into their nominal range
/// when a patch is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClampPolicy {
    /// Values may leave their nominal range.
    #[default]
    Unclamped,
    /// Values are clamped to [`Stat::nominal_range`] after every merge.
    Clamp,
}

/// The player's progress through one playthrough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayState {
    pub sanity: i32,
    /// Trust with the killer.
    pub trust: i32,
    pub anna_relation: i32,
    pub marcus_relation: i32,
    pub has_weapon: bool,
    pub knows_name: bool,
    pub is_injured: bool,
    /// Clue identifiers found so far, e.g. `anna_ally` or `police_radio`.
    pub discoveries: FxHashSet<String>,
    /// Minutes elapsed in the story.
    pub time_elapsed: i32,
    pub act: i32,
}

impl Default for PlayState {
    fn default() -> Self {
        Self::initial()
    }
}

impl PlayState {
    /// The fixed state every playthrough starts from.
    pub fn initial() -> Self {
        Self {
            sanity: 100,
            trust: 0,
            anna_relation: 0,
            marcus_relation: 0,
            has_weapon: false,
            knows_name: false,
            is_injured: false,
            discoveries: FxHashSet::default(),
            time_elapsed: 0,
            act: 1,
        }
    }

    pub fn stat(&self, stat: Stat) -> i32 {
        match stat {
            Stat::Sanity => self.sanity,
            Stat::Trust => self.trust,
            Stat::AnnaRelation => self.anna_relation,
            Stat::MarcusRelation => self.marcus_relation,
            Stat::TimeElapsed => self.time_elapsed,
            Stat::Act => self.act,
        }
    }

    pub fn flag(&self, flag: Flag) -> bool {
        match flag {
            Flag::HasWeapon => self.has_weapon,
            Flag::KnowsName => self.knows_name,
            Flag::IsInjured => self.is_injured,
        }
    }

    pub fn has_discovered(&self, clue: &str) -> bool {
        self.discoveries.contains(clue)
    }

    /// Produce a new state with `patch` merged over `self`.
    ///
    /// Merge is shallow: every field present in the patch overwrites the
    /// field here, and `discoveries` is replaced wholesale rather than
    /// unioned.
    pub fn merged(&self, patch: &StatePatch, policy: ClampPolicy) -> PlayState {
        let mut next = self.clone();
        if let Some(v) = patch.sanity {
            next.sanity = v;
        }
        if let Some(v) = patch.trust {
            next.trust = v;
        }
        if let Some(v) = patch.anna_relation {
            next.anna_relation = v;
        }
        if let Some(v) = patch.marcus_relation {
            next.marcus_relation = v;
        }
        if let Some(v) = patch.has_weapon {
            next.has_weapon = v;
        }
        if let Some(v) = patch.knows_name {
            next.knows_name = v;
        }
        if let Some(v) = patch.is_injured {
            next.is_injured = v;
        }
        if let Some(ref v) = patch.discoveries {
            next.discoveries = v.clone();
        }
        if let Some(v) = patch.time_elapsed {
            next.time_elapsed = v;
        }
        if let Some(v) = patch.act {
            next.act = v;
        }

        if policy == ClampPolicy::Clamp {
            next.clamp_in_place();
        }
        next
    }

    fn clamp_in_place(&mut self) {
        let clamp = |stat: Stat, v: i32| {
            let (lo, hi) = stat.nominal_range();
            v.clamp(lo, hi)
        };
        self.sanity = clamp(Stat::Sanity, self.sanity);
        self.trust = clamp(Stat::Trust, self.trust);
        self.anna_relation = clamp(Stat::AnnaRelation, self.anna_relation);
        self.marcus_relation = clamp(Stat::MarcusRelation, self.marcus_relation);
        self.time_elapsed = clamp(Stat::TimeElapsed, self.time_elapsed);
        self.act = clamp(Stat::Act, self.act);
    }

    /// Fields currently outside their nominal range.
    pub fn out_of_range(&self) -> Vec<Stat> {
        [
            Stat::Sanity,
            Stat::Trust,
            Stat::AnnaRelation,
            Stat::MarcusRelation,
            Stat::TimeElapsed,
            Stat::Act,
        ]
        .into_iter()
        .filter(|stat| {
            let (lo, hi) = stat.nominal_range();
            let v = self.stat(*stat);
            v < lo || v > hi
        })
        .collect()
    }
}

/// A partial [`PlayState`]: the output of an effect.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatePatch {
    #[serde(default)]
    pub sanity: Option<i32>,
    #[serde(default)]
    pub trust: Option<i32>,
    #[serde(default)]
    pub anna_relation: Option<i32>,
    #[serde(default)]
    pub marcus_relation: Option<i32>,
    #[serde(default)]
    pub has_weapon: Option<bool>,
    #[serde(default)]
    pub knows_name: Option<bool>,
    #[serde(default)]
    pub is_injured: Option<bool>,
    #[serde(default)]
    pub discoveries: Option<FxHashSet<String>>,
    #[serde(default)]
    pub time_elapsed: Option<i32>,
    #[serde(default)]
    pub act: Option<i32>,
}

impl StatePatch {
    pub fn is_empty(&self) -> bool {
        *self == StatePatch::default()
    }

    pub fn stat(&self, stat: Stat) -> Option<i32> {
        match stat {
            Stat::Sanity => self.sanity,
            Stat::Trust => self.trust,
            Stat::AnnaRelation => self.anna_relation,
            Stat::MarcusRelation => self.marcus_relation,
            Stat::TimeElapsed => self.time_elapsed,
            Stat::Act => self.act,
        }
    }

    pub fn set_stat(&mut self, stat: Stat, value: i32) {
        let slot = match stat {
            Stat::Sanity => &mut self.sanity,
            Stat::Trust => &mut self.trust,
            Stat::AnnaRelation => &mut self.anna_relation,
            Stat::MarcusRelation => &mut self.marcus_relation,
            Stat::TimeElapsed => &mut self.time_elapsed,
            Stat::Act => &mut self.act,
        };
        *slot = Some(value);
    }

    pub fn set_flag(&mut self, flag: Flag, value: bool) {
        let slot = match flag {
            Flag::HasWeapon => &mut self.has_weapon,
            Flag::KnowsName => &mut self.knows_name,
            Flag::IsInjured => &mut self.is_injured,
        };
        *slot = Some(value);
    }
}
