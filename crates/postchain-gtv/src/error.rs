//! GTV error types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GtvError {
    /// The buffer is not a well-formed GTV encoding (wrong tag, bad length,
    /// truncated record, trailing bytes, invalid payload).
    #[error("malformed GTV encoding: {0}")]
    Format(String),

    /// A well-formed record of a kind this codec does not decode.
    #[error("unsupported GTV value: {0}")]
    Unsupported(String),

    /// The low nibble of a choice tag names no known GTV kind.
    #[error("unknown GTV tag kind 0x{0:X}")]
    UnknownTag(u8),

    /// A host value has no GTV representation.
    #[error("cannot convert {type_name} to GTV: {reason}")]
    Conversion { type_name: String, reason: String },
}

impl GtvError {
    pub(crate) fn conversion(type_name: &str, reason: impl Into<String>) -> Self {
        GtvError::Conversion {
            type_name: type_name.to_string(),
            reason: reason.into(),
        }
    }
}
