use crate::recognition::domain::identity::AccessDecision;

/// Remembers the last decision reported so repeats are suppressed.
///
/// Starts unset, so the very first observation always counts as a transition.
#[derive(Clone, Copy, Debug, Default)]
pub struct DecisionEdge {
    previous: Option<AccessDecision>,
}

impl DecisionEdge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `decision`; returns `true` if it differs from the previous one.
    pub fn observe(&mut self, decision: AccessDecision) -> bool {
        if self.previous == Some(decision) {
            return false;
        }
        self.previous = Some(decision);
        true
    }

    pub fn previous(&self) -> Option<AccessDecision> {
        self.previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AccessDecision::{Denied, Granted};

    #[test]
    fn test_first_observation_is_transition() {
        assert!(DecisionEdge::new().observe(Denied));
        assert!(DecisionEdge::new().observe(Granted));
    }

    #[test]
    fn test_only_changes_are_transitions() {
        let mut edge = DecisionEdge::new();
        let sequence = [Granted, Granted, Granted, Denied, Denied, Granted];
        let fired: Vec<bool> = sequence.iter().map(|d| edge.observe(*d)).collect();
        assert_eq!(fired, vec![true, false, false, true, false, true]);
        assert_eq!(edge.previous(), Some(Granted));
    }
}
