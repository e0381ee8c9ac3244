use std::fmt;

/// Lifecycle of a [`crate::RetentionSweeper`].
///
/// `Idle -> WaitingForReady` on start, `-> Sweeping` once the session is
/// ready and on every tick, `-> Idle` after each sweep. A one-off sweep run
/// while the loop still waits for ready returns to `WaitingForReady`.
/// `Cancelled` is terminal and reachable from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweeperState {
    Idle,
    WaitingForReady,
    Sweeping,
    Cancelled,
}

impl SweeperState {
    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: Self) -> bool {
        use SweeperState::*;
        matches!(
            (self, next),
            (Idle, WaitingForReady) |
                (WaitingForReady, Sweeping) |
                (Idle, Sweeping) |
                (Sweeping, Idle | WaitingForReady) |
                (Idle | WaitingForReady | Sweeping, Cancelled)
        )
    }
}

impl fmt::Display for SweeperState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::WaitingForReady => "waiting_for_ready",
            Self::Sweeping => "sweeping",
            Self::Cancelled => "cancelled",
        })
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case(SweeperState::Idle, SweeperState::WaitingForReady, true)]
    #[case(SweeperState::WaitingForReady, SweeperState::Sweeping, true)]
    #[case(SweeperState::Sweeping, SweeperState::Idle, true)]
    #[case(SweeperState::Idle, SweeperState::Sweeping, true)]
    #[case(SweeperState::Sweeping, SweeperState::Cancelled, true)]
    #[case(SweeperState::WaitingForReady, SweeperState::Idle, false)]
    #[case(SweeperState::Sweeping, SweeperState::WaitingForReady, true)]
    #[case(SweeperState::WaitingForReady, SweeperState::WaitingForReady, false)]
    #[case(SweeperState::Cancelled, SweeperState::Idle, false)]
    #[case(SweeperState::Cancelled, SweeperState::Cancelled, false)]
    fn transitions(#[case] from: SweeperState, #[case] to: SweeperState, #[case] ok: bool) {
        assert_eq!(from.can_transition_to(to), ok);
    }

    #[rstest]
    #[case(SweeperState::Idle)]
    #[case(SweeperState::WaitingForReady)]
    #[case(SweeperState::Sweeping)]
    #[case(SweeperState::Cancelled)]
    fn nothing_leaves_cancelled(#[case] next: SweeperState) {
        assert!(!SweeperState::Cancelled.can_transition_to(next));
    }

    #[test]
    fn display_is_snake_case() {
        assert_eq!(SweeperState::WaitingForReady.to_string(), "waiting_for_ready");
    }
}
