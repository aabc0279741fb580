use serde::Serialize;

/// Capture session state machine.
///
/// State transitions are monotonic:
/// ```text
/// opening → streaming → closing → closed
///    │                     ↑
///    └─────(fatal)─────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Opening,
    Streaming,
    Closing,
    Closed,
}

impl SessionState {
    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::Streaming)
    }

    /// Closing or closed.
    pub fn is_shutting_down(&self) -> bool {
        matches!(self, Self::Closing | Self::Closed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Whether moving to `next` keeps the state machine monotonic.
    pub fn can_advance_to(&self, next: SessionState) -> bool {
        next > *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_only_move_forward() {
        use SessionState::*;
        assert!(Opening.can_advance_to(Streaming));
        assert!(Opening.can_advance_to(Closing));
        assert!(Streaming.can_advance_to(Closed));
        assert!(!Closing.can_advance_to(Streaming));
        assert!(!Closed.can_advance_to(Closing));
        assert!(!Streaming.can_advance_to(Streaming));
    }

    #[test]
    fn predicates() {
        assert!(SessionState::Streaming.is_streaming());
        assert!(SessionState::Closing.is_shutting_down());
        assert!(!SessionState::Opening.is_shutting_down());
        assert!(SessionState::Closed.is_terminal());
    }
}
