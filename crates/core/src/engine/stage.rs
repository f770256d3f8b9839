//! Pipeline macro-stage transitions.
//!
//! The backend moves through its stages monotonically, but the transport
//! does not promise ordered delivery. The stage machine accepts any event
//! that does not move the pipeline backwards and reports everything else so
//! the reducer can log it.

use pp_protocol::session_models::Flavor;
use pp_protocol::state_models::Stage;

use crate::engine::flavor::{descriptor, FlavorDescriptor};

/// Outcome of asking the machine to enter a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The stage changed.
    Advanced { from: Stage, to: Stage },

    /// The pipeline is already in the requested stage.
    Unchanged,

    /// The requested stage is behind the current one.
    Regression { current: Stage, requested: Stage },

    /// The pipeline already reached a terminal stage.
    AfterTerminal { current: Stage, requested: Stage },

    /// The flavor has no such stage.
    Foreign { requested: Stage },
}

impl Transition {
    /// Whether the event's stage payload should be recorded.
    pub fn is_accepted(self) -> bool {
        matches!(self, Transition::Advanced { .. } | Transition::Unchanged)
    }
}

/// Stage machine for one flavor.
#[derive(Debug, Clone, Copy)]
pub struct StageMachine {
    descriptor: &'static FlavorDescriptor,
}

impl StageMachine {
    pub fn new(flavor: Flavor) -> Self {
        Self {
            descriptor: descriptor(flavor),
        }
    }

    pub fn descriptor(&self) -> &'static FlavorDescriptor {
        self.descriptor
    }

    /// Decide what entering `requested` from `current` means.
    ///
    /// Skipping stages is allowed: a later stage may arrive before an
    /// earlier one was ever announced. Terminal stages are reachable from
    /// every non-terminal stage and are absorbing.
    pub fn transition(&self, current: Stage, requested: Stage) -> Transition {
        if current.is_terminal() {
            if current == requested {
                return Transition::Unchanged;
            }
            return Transition::AfterTerminal { current, requested };
        }
        if current == requested {
            return Transition::Unchanged;
        }
        if requested.is_terminal() {
            return Transition::Advanced {
                from: current,
                to: requested,
            };
        }

        if !self.descriptor.has_stage(requested) {
            return Transition::Foreign { requested };
        }
        // Both stages are non-terminal and known to the table here; the
        // fallback only covers idle.
        let target = self.descriptor.rank(requested).unwrap_or(0);
        let here = self.descriptor.rank(current).unwrap_or(0);

        if target < here {
            Transition::Regression { current, requested }
        } else {
            Transition::Advanced {
                from: current,
                to: requested,
            }
        }
    }
}
