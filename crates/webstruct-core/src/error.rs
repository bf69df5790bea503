use thiserror::Error;

/// Errors that can occur in the webstruct pipeline.
#[derive(Debug, Error)]
pub enum WebstructError {
    /// An end marker does not close the span that is currently open.
    #[error("invalid tag sequence: close tag {close:?} doesn't match open tag {open:?}")]
    MalformedMarkerSequence {
        /// Entity type of the open span, `None` when nothing is open.
        open: Option<String>,
        /// Entity type named by the end marker.
        close: String,
    },

    /// A start marker appeared while another span was still open.
    #[error("nested entity markers are not supported: {start:?} opened inside {open:?}")]
    NestedMarker {
        /// Entity type of the span that is already open.
        open: String,
        /// Entity type of the offending start marker.
        start: String,
    },

    /// An `I-`/`L-` tag does not continue a span of the same type (strict mode).
    #[error("invalid sequence: {tag} tag can't start sequence (position {position})")]
    InvalidTagTransition {
        /// The offending tag.
        tag: String,
        /// Index of the offending tag in the sequence.
        position: usize,
    },

    /// Two sequences that must be aligned have different lengths.
    #[error("length mismatch: {tokens} tokens but {tags} tags")]
    LengthMismatch {
        /// Number of tokens.
        tokens: usize,
        /// Number of tags.
        tags: usize,
    },

    /// A tag string that is not part of the IOB2/BILOU vocabulary.
    #[error("invalid tag: {0:?}")]
    InvalidTag(String),

    /// A regex pattern failed to compile (should not happen with static patterns).
    #[error("regex compilation error: {0}")]
    RegexError(#[from] regex::Error),

    /// Configuration could not be deserialized.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Reading external data (e.g. a lexicon) failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The external sequence model failed.
    #[error("sequence model error: {0}")]
    Model(String),
}

/// Result type alias for webstruct operations.
pub type Result<T> = std::result::Result<T, WebstructError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = WebstructError::MalformedMarkerSequence {
            open: Some("PER".into()),
            close: "ORG".into(),
        };
        assert!(err.to_string().contains("ORG"));
        assert!(err.to_string().contains("PER"));

        let err = WebstructError::LengthMismatch { tokens: 3, tags: 2 };
        assert_eq!(err.to_string(), "length mismatch: 3 tokens but 2 tags");

        let err = WebstructError::InvalidTagTransition {
            tag: "I-PER".into(),
            position: 1,
        };
        assert!(err.to_string().contains("I-PER tag can't start sequence"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<WebstructError>();
    }
}
