//! Preemptive dispatch model
//!
//! Mirrors what the nested vectored interrupt controller does with pending
//! requests: the most urgent pending source runs, and it may interrupt a
//! running handler only when its priority number is strictly lower. Equal
//! priorities never interleave; ties between simultaneously pending sources
//! are broken by the fixed scan order of [`InterruptSource::ALL`].
//!
//! The simulator drives handlers through this model; the firmware gets the
//! same behaviour from the hardware.

use dormant_hal::Priority;
use heapless::Vec;

use super::source::{InterruptSource, SourceSet};

/// Priority assigned to each source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PriorityTable([Priority; InterruptSource::COUNT]);

impl PriorityTable {
    /// Build a table indexed in [`InterruptSource::ALL`] order
    pub const fn new(priorities: [Priority; InterruptSource::COUNT]) -> Self {
        Self(priorities)
    }

    pub const fn get(&self, source: InterruptSource) -> Priority {
        self.0[source.index()]
    }

    pub fn set(&mut self, source: InterruptSource, priority: Priority) {
        self.0[source.index()] = priority;
    }
}

/// Pending/active bookkeeping of a single-core preemptive interrupt system
#[derive(Debug, Clone)]
pub struct DispatchModel {
    priorities: PriorityTable,
    /// Handlers currently on the stack, innermost last
    active: Vec<InterruptSource, { InterruptSource::COUNT }>,
}

impl DispatchModel {
    pub fn new(priorities: PriorityTable) -> Self {
        Self {
            priorities,
            active: Vec::new(),
        }
    }

    pub fn priorities(&self) -> &PriorityTable {
        &self.priorities
    }

    /// Change one source's priority, as a write to its priority field would
    pub fn set_priority(&mut self, source: InterruptSource, priority: Priority) {
        self.priorities.set(source, priority);
    }

    /// Innermost running handler, if any
    pub fn running(&self) -> Option<InterruptSource> {
        self.active.last().copied()
    }

    pub fn running_priority(&self) -> Option<Priority> {
        self.running().map(|source| self.priorities.get(source))
    }

    /// Nesting depth (0 = foreground)
    pub fn depth(&self) -> usize {
        self.active.len()
    }

    pub fn is_active(&self, source: InterruptSource) -> bool {
        self.active.contains(&source)
    }

    /// Check if `source` would start now if it became pending
    pub fn can_start(&self, source: InterruptSource) -> bool {
        if self.is_active(source) {
            return false;
        }
        match self.running_priority() {
            None => true,
            Some(running) => self.priorities.get(source).preempts(running),
        }
    }

    /// Pick the source that runs next out of `pending`, if any may run
    pub fn next_ready(&self, pending: SourceSet) -> Option<InterruptSource> {
        pending
            .iter()
            .filter(|source| self.can_start(*source))
            .min_by_key(|source| (self.priorities.get(*source), source.index()))
    }

    /// Record handler entry
    ///
    /// Returns `false` (and records nothing) if the source may not start.
    pub fn enter(&mut self, source: InterruptSource) -> bool {
        if !self.can_start(source) {
            return false;
        }
        // Nesting depth is bounded by the number of sources
        self.active.push(source).is_ok()
    }

    /// Record return from the innermost handler
    pub fn exit(&mut self) -> Option<InterruptSource> {
        self.active.pop()
    }
}
