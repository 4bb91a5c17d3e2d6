use arkhe_core::panel::{AlgebraOutcome, Operation, PanelEvent};
use serde::{Deserialize, Serialize};

/// Readout state for the panel's side display, folded from panel events.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AlgebraReadout {
    pub vectors: usize,
    pub left: Option<String>,
    pub right: Option<String>,
    pub last_operation: Option<Operation>,
    pub last_outcome: Option<AlgebraOutcome>,
    pub last_deny_reason: Option<String>,
    pub evaluations: u64,
    pub denials: u64,
}

impl AlgebraReadout {
    pub fn apply(&mut self, e: &PanelEvent) {
        match e {
            PanelEvent::SnapshotReplaced { vectors } => {
                self.vectors = *vectors;
                // results computed against the old snapshot no longer apply
                self.last_outcome = None;
                self.last_deny_reason = None;
            }
            PanelEvent::SelectionChanged { left, right } => {
                self.left = left.clone();
                self.right = right.clone();
            }
            PanelEvent::OperationEvaluated { operation, outcome } => {
                self.last_operation = Some(*operation);
                self.last_outcome = Some(outcome.clone());
                self.last_deny_reason = None;
                self.evaluations += 1;
            }
            PanelEvent::OperationDenied { operation, reason } => {
                self.last_operation = Some(*operation);
                self.last_deny_reason = Some(reason.clone());
                self.denials += 1;
            }
        }
    }

    pub fn apply_all<'a, I>(&mut self, events: I)
    where
        I: IntoIterator<Item = &'a PanelEvent>,
    {
        for e in events {
            self.apply(e);
        }
    }

    pub fn has_selection(&self) -> bool {
        self.left.is_some() || self.right.is_some()
    }
}
