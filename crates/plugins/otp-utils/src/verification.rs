//! Verification outcomes.

/// Result of an atomic consume on the code store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// The code matched and is now marked consumed.
    Consumed,
    /// No live code: absent, expired, or already consumed.
    Invalid,
    /// A live code exists but the submitted value differs. The record's
    /// failure count went up; the code stays live.
    Mismatch,
    /// The submitted value differs and the attempt limit is reached. The
    /// code was removed.
    Exhausted,
}

impl ConsumeOutcome {
    /// Returns true if the code was consumed by this call.
    pub fn is_consumed(&self) -> bool {
        matches!(self, ConsumeOutcome::Consumed)
    }

    /// Returns true if the submitted code was wrong.
    pub fn is_mismatch(&self) -> bool {
        matches!(self, ConsumeOutcome::Mismatch | ConsumeOutcome::Exhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_predicates() {
        assert!(ConsumeOutcome::Consumed.is_consumed());
        assert!(!ConsumeOutcome::Invalid.is_consumed());
        assert!(ConsumeOutcome::Mismatch.is_mismatch());
        assert!(ConsumeOutcome::Exhausted.is_mismatch());
        assert!(!ConsumeOutcome::Invalid.is_mismatch());
    }
}
