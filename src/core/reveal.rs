/// Text reveal: typewriter presentation of node text on a virtual clock.
///
/// The scheduler never sleeps or spawns anything. Callers advance it with
/// the time that passed since the last call, which keeps it deterministic
/// under test and lets a real frontend drive it from its own timer.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

/// Delay between two revealed characters.
pub const DEFAULT_CADENCE: Duration = Duration::from_millis(30);

/// Output of the scheduler. `visit` identifies the reveal sequence that
/// produced the event; every call to [`RevealScheduler::start`] opens a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealEvent {
    /// The text revealed so far. Always a prefix of the node text.
    Progress { visit: u64, revealed: String },
    Complete { visit: u64 },
}

impl RevealEvent {
    pub fn visit(&self) -> u64 {
        match self {
            Self::Progress { visit, .. } | Self::Complete { visit } => *visit,
        }
    }
}

/// Caller-side handle on one reveal sequence.
#[derive(Debug, Clone)]
pub struct RevealHandle {
    visit: u64,
    cancelled: Rc<Cell<bool>>,
}

impl RevealHandle {
    pub fn visit(&self) -> u64 {
        self.visit
    }

    /// Stop this sequence. It will not emit again. Has no effect on any
    /// later sequence.
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

#[derive(Debug)]
struct ActiveReveal {
    visit: u64,
    chars: Vec<char>,
    shown: usize,
    pending: Duration,
    cancelled: Rc<Cell<bool>>,
}

/// Reveals one node's text at a time, one character per cadence tick.
#[derive(Debug)]
pub struct RevealScheduler {
    cadence: Duration,
    next_visit: u64,
    active: Option<ActiveReveal>,
    revealed: String,
}

impl Default for RevealScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_CADENCE)
    }
}

impl RevealScheduler {
    pub fn new(cadence: Duration) -> Self {
        Self {
            cadence,
            next_visit: 0,
            active: None,
            revealed: String::new(),
        }
    }

    pub fn cadence(&self) -> Duration {
        self.cadence
    }

    /// Begin revealing `text` from empty, cancelling any sequence in flight.
    pub fn start(&mut self, text: &str) -> RevealHandle {
        self.cancel();
        self.next_visit += 1;
        let cancelled = Rc::new(Cell::new(false));
        self.active = Some(ActiveReveal {
            visit: self.next_visit,
            chars: text.chars().collect(),
            shown: 0,
            pending: Duration::ZERO,
            cancelled: Rc::clone(&cancelled),
        });
        self.revealed.clear();
        tracing::debug!(visit = self.next_visit, chars = text.chars().count(), "reveal started");
        RevealHandle {
            visit: self.next_visit,
            cancelled,
        }
    }

    /// Cancel the sequence in flight, if any.
    pub fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancelled.set(true);
            tracing::debug!(visit = active.visit, shown = active.shown, "reveal cancelled");
        }
    }

    /// Move the clock forward by `elapsed` and emit whatever became visible.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<RevealEvent> {
        if self.cadence.is_zero() {
            return self.skip();
        }

        self.drop_cancelled();
        let mut events = Vec::new();
        let Some(active) = self.active.as_mut() else {
            return events;
        };

        active.pending = active.pending.saturating_add(elapsed);
        while active.shown < active.chars.len() && active.pending >= self.cadence {
            active.pending -= self.cadence;
            self.revealed.push(active.chars[active.shown]);
            active.shown += 1;
            events.push(RevealEvent::Progress {
                visit: active.visit,
                revealed: self.revealed.clone(),
            });
        }

        if active.shown == active.chars.len() {
            events.push(RevealEvent::Complete {
                visit: active.visit,
            });
            self.active = None;
        }
        events
    }

    /// Fast-forward: show the rest of the text at once.
    pub fn skip(&mut self) -> Vec<RevealEvent> {
        self.drop_cancelled();
        let mut events = Vec::new();
        let Some(active) = self.active.as_mut() else {
            return events;
        };

        if active.shown < active.chars.len() {
            self.revealed.extend(&active.chars[active.shown..]);
            active.shown = active.chars.len();
            events.push(RevealEvent::Progress {
                visit: active.visit,
                revealed: self.revealed.clone(),
            });
        }
        events.push(RevealEvent::Complete {
            visit: active.visit,
        });
        self.active = None;
        events
    }

    /// True while a sequence is in flight and has not completed.
    pub fn is_typing(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.cancelled.get())
    }

    /// The text revealed so far in the current (or last finished) visit.
    pub fn revealed(&self) -> &str {
        &self.revealed
    }

    /// Visit number of the sequence in flight.
    pub fn current_visit(&self) -> Option<u64> {
        self.active.as_ref().map(|a| a.visit)
    }

    /// Time left until the sequence in flight completes.
    pub fn remaining(&self) -> Duration {
        match self.active {
            Some(ref active) if !active.cancelled.get() => {
                let left = u32::try_from(active.chars.len() - active.shown).unwrap_or(u32::MAX);
                self.cadence.saturating_mul(left).saturating_sub(active.pending)
            }
            _ => Duration::ZERO,
        }
    }

    /// Forget the sequence in flight if its handle was cancelled.
    fn drop_cancelled(&mut self) {
        if self
            .active
            .as_ref()
            .is_some_and(|active| active.cancelled.get())
        {
            self.active = None;
        }
    }
}
