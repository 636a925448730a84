/// How a failed submission is handled. Only `SequenceConflict` triggers corrective action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The ledger rejected our sequence number ("nonce too low", "replacement underpriced").
    SequenceConflict,
    /// The endpoint is throttling us. Logged distinctly, otherwise transient.
    RateLimited,
    Transient,
}

impl FailureClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SequenceConflict => "sequence-conflict",
            Self::RateLimited => "rate-limited",
            Self::Transient => "transient",
        }
    }
}

const CONFLICT_NEEDLES: [&str; 3] = ["nonce", "replacement", "already known"];

const RATE_LIMIT_NEEDLES: [&str; 5] = [
    "429",
    "rate limit",
    "too many requests",
    "compute units per second",
    "throughput",
];

pub fn classify_failure(message: &str) -> FailureClass {
    let msg = message.to_ascii_lowercase();
    if CONFLICT_NEEDLES.iter().any(|needle| msg.contains(needle)) {
        return FailureClass::SequenceConflict;
    }
    if RATE_LIMIT_NEEDLES.iter().any(|needle| msg.contains(needle)) {
        return FailureClass::RateLimited;
    }
    FailureClass::Transient
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_patterns() {
        for msg in [
            "server returned an error response: error code -32000: nonce too low",
            "Nonce too high",
            "replacement transaction underpriced",
            "invalid transaction: NonceTooLow { tx: 3, state: 5 }",
            "already known",
        ] {
            assert_eq!(classify_failure(msg), FailureClass::SequenceConflict, "{msg}");
        }
    }

    #[test]
    fn test_rate_limit_patterns() {
        assert_eq!(
            classify_failure("HTTP error 429 with body: exceeded compute units per second"),
            FailureClass::RateLimited
        );
        assert_eq!(classify_failure("Too Many Requests"), FailureClass::RateLimited);
    }

    #[test]
    fn test_everything_else_is_transient() {
        for msg in [
            "insufficient funds for gas * price + value",
            "connection reset by peer",
            "execution reverted",
            "max fee per gas less than block base fee",
        ] {
            assert_eq!(classify_failure(msg), FailureClass::Transient, "{msg}");
        }
    }
}
