use thiserror::Error;

/// Failure taxonomy shared by the persistence service and the sync client.
/// Validation, conflict and not-found outcomes are definitive and never
/// retried; transient failures earn exactly one reconnect-and-retry cycle.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("'{0}' already exists")]
    Conflict(String),
    #[error("'{0}' not found")]
    NotFound(String),
    #[error("transient backend failure: {0}")]
    Transient(String),
    #[error("{0}")]
    Fatal(String),
}

/// Recognizes errors worth a single reconnect-and-retry cycle by message
/// shape: timeouts, refused/reset connections, unreachable hosts and the
/// storage layer's selection timeout.
pub fn is_transient_message(message: &str) -> bool {
    let lowered = message.to_ascii_lowercase();
    [
        "timed out",
        "timeout",
        "connection refused",
        "connection reset",
        "unreachable",
        "selection timeout",
        "temporarily unavailable",
    ]
    .iter()
    .any(|needle| lowered.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizer_matches_transient_shapes() {
        assert!(is_transient_message("operation timed out"));
        assert!(is_transient_message("Connection refused (os error 111)"));
        assert!(is_transient_message("server selection timeout"));
        assert!(!is_transient_message("'x1' already exists"));
        assert!(!is_transient_message("invalid request: missing field"));
    }
}
