//! Error types for univsat.
//!
//! Only recoverable, construction-time problems are errors. Protocol misuse
//! (querying a model without a satisfiable check, popping past the base
//! scope) panics instead.

use thiserror::Error;

/// Result type for univsat operations
pub type Result<T> = std::result::Result<T, UnivsatError>;

/// Errors reported by univsat
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnivsatError {
    /// A solver was requested with bit width zero
    #[error("bit width must be positive")]
    ZeroBitWidth,
    /// A solver was requested wider than the configured limit
    #[error("bit width {width} exceeds the configured maximum of {max}")]
    BitWidthTooLarge {
        /// Requested width
        width: u32,
        /// Configured maximum
        max: u32,
    },
    /// Configuration rejected by validation
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl UnivsatError {
    /// Check a requested bit width against a maximum
    pub fn check_width(width: u32, max: u32) -> Result<()> {
        if width == 0 {
            Err(Self::ZeroBitWidth)
        } else if width > max {
            Err(Self::BitWidthTooLarge { width, max })
        } else {
            Ok(())
        }
    }
}
