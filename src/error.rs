use thiserror::Error;

pub type Result<T> = std::result::Result<T, DispatchError>;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("signal fetch failed: {0}")]
    Signal(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    Missing(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("rpc failure: {0}")]
    Rpc(String),
    #[error("signing failure: {0}")]
    Signing(String),
}

/// Folds whitespace, drops echoed payloads and backtraces, and caps the length so a
/// single RPC failure stays on one log line.
pub fn compact_error_message(message: &str, max_len: usize) -> String {
    let mut raw = message;
    if let Some((prefix, _)) = raw.split_once("Stack backtrace:") {
        raw = prefix;
    }
    let elided;
    if let Some((prefix, _)) = raw.split_once(" text: ") {
        elided = format!("{prefix} text=<omitted>");
        raw = &elided;
    }

    let mut compact = String::with_capacity(raw.len().min(max_len.saturating_add(16)));
    let mut prev_ws = false;
    for ch in raw.chars() {
        if ch.is_whitespace() {
            if !prev_ws && !compact.is_empty() {
                compact.push(' ');
            }
            prev_ws = true;
            continue;
        }
        prev_ws = false;
        if compact.len() + ch.len_utf8() > max_len {
            compact.push_str("...(truncated)");
            return compact;
        }
        compact.push(ch);
    }
    compact.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_error_message_elides_payload_and_backtrace() {
        let raw = "server returned an error response: error code -32000: nonce too low, text: \"{...huge...}\"\nStack backtrace:\n 0: frame";
        let compact = compact_error_message(raw, 260);
        assert!(compact.contains("nonce too low"));
        assert!(compact.contains("text=<omitted>"));
        assert!(!compact.contains("Stack backtrace"));
        assert!(!compact.contains('\n'));
    }

    #[test]
    fn test_compact_error_message_truncates_long_input() {
        let raw = "x".repeat(500);
        let compact = compact_error_message(&raw, 32);
        assert!(compact.starts_with(&"x".repeat(32)));
        assert!(compact.ends_with("...(truncated)"));
    }

    #[test]
    fn test_error_display_nests_source() {
        let err: DispatchError = ConfigError::Missing("PRIVATE_KEY must be set".into()).into();
        assert_eq!(
            err.to_string(),
            "config error: missing required configuration: PRIVATE_KEY must be set"
        );
    }
}
