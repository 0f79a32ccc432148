use thiserror::Error;

/// Errors reported by the codec to its immediate caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Header or payload deviates from the artifact layout.
    #[error("format error: {0}")]
    Format(String),

    /// Input byte has no entry in the derived code table.
    #[error("encoding error: byte {symbol:#04x} missing from code table")]
    Encoding { symbol: u8 },

    /// Payload ended while the decoder was between root and leaf.
    #[error("truncated input: payload ended mid-code after {consumed} characters")]
    TruncatedInput { consumed: usize },
}

impl CodecError {
    pub(crate) fn format(message: impl Into<String>) -> Self {
        CodecError::Format(message.into())
    }
}

pub type CodecResult<T> = Result<T, CodecError>;
