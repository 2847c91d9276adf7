use std::io;

pub type Result<T> = std::result::Result<T, FontError>;

#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("unexpected end of data at offset {position}: need {need} bytes, have {have}")]
    BoundsExceeded {
        position: usize,
        need: usize,
        have: usize,
    },

    #[error("bad magic number: expected {expected:#010x}, found {found:#010x}")]
    BadMagic { found: u32, expected: u32 },

    #[error("unsupported version {version:#x} in '{tag}'")]
    UnsupportedVersion { tag: &'static str, version: u32 },

    #[error("corrupt '{tag}' table: {reason}")]
    Corrupt { tag: &'static str, reason: String },

    #[error("table not in directory: {0}")]
    UnknownTable(String),

    #[error("decompression failed: {0}")]
    DecompressFailed(String),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl FontError {
    /// Shorthand for a `Corrupt` error with an owned reason string.
    pub fn corrupt(tag: &'static str, reason: impl Into<String>) -> Self {
        FontError::Corrupt {
            tag,
            reason: reason.into(),
        }
    }
}
