//! Virtual clock for driving scheduled timers without real delays.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::game::{Effect, ScheduledTimer};

/// Pending timers ordered by due time, FIFO among timers due at the same instant.
///
/// ```
/// use std::time::Duration;
/// use memora_engine::game::{Controller, Event};
/// use memora_engine::rules::{Difficulty, RoundSetup};
/// use memora_engine::timeline::Timeline;
///
/// let mut controller = Controller::new(42);
/// let mut timeline = Timeline::new();
/// controller.dispatch(Event::Start(RoundSetup::new(2, Difficulty::Easy)));
/// controller.dispatch(Event::SubmitNames(vec!["Ann".into(), "Ben".into()]));
///
/// let effects = controller.dispatch(Event::Click(0));
/// let effects = timeline.absorb(effects);
/// assert_eq!(effects.len(), 1);
/// assert_eq!(timeline.pending(), 0);
///
/// let follow_up = timeline.drain(|t| controller.dispatch(Event::Timer(t)));
/// assert!(follow_up.is_empty());
/// assert_eq!(timeline.now(), Duration::ZERO);
/// ```
#[derive(Debug, Default, Clone)]
pub struct Timeline {
    now: Duration,
    seq: u64,
    queue: BTreeMap<(Duration, u64), ScheduledTimer>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn schedule(&mut self, after: Duration, timer: ScheduledTimer) {
        self.queue.insert((self.now + after, self.seq), timer);
        self.seq += 1;
    }

    /// Queues every [`Effect::Schedule`] and hands back the remaining effects.
    pub fn absorb(&mut self, effects: Vec<Effect>) -> Vec<Effect> {
        let mut rest = Vec::with_capacity(effects.len());
        for effect in effects {
            match effect {
                Effect::Schedule { after, timer } => self.schedule(after, timer),
                other => rest.push(other),
            }
        }
        rest
    }

    /// Moves the clock forward by `by`, firing each timer that falls due on the
    /// way at its own due time. Timers scheduled by `fire` are measured from the
    /// moment their parent fired and run too if they fall inside the window.
    pub fn advance<F>(&mut self, by: Duration, mut fire: F) -> Vec<Effect>
    where
        F: FnMut(ScheduledTimer) -> Vec<Effect>,
    {
        let deadline = self.now + by;
        let mut out = Vec::new();
        while let Some(timer) = self.pop_due(deadline) {
            let effects = fire(timer);
            out.extend(self.absorb(effects));
        }
        self.now = deadline;
        out
    }

    /// Fires timers until none are left, advancing the clock as needed.
    pub fn drain<F>(&mut self, mut fire: F) -> Vec<Effect>
    where
        F: FnMut(ScheduledTimer) -> Vec<Effect>,
    {
        let mut out = Vec::new();
        while let Some(timer) = self.pop_due(Duration::MAX) {
            let effects = fire(timer);
            out.extend(self.absorb(effects));
        }
        out
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    fn pop_due(&mut self, deadline: Duration) -> Option<ScheduledTimer> {
        let (&key, _) = self.queue.iter().next()?;
        if key.0 > deadline {
            return None;
        }
        self.now = self.now.max(key.0);
        self.queue.remove(&key)
    }
}
