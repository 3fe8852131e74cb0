//! Solver configuration.

use crate::error::{Result, UnivsatError};
use serde::{Deserialize, Serialize};

/// Default upper bound on the bit width of a solver instance
pub const DEFAULT_MAX_BIT_WIDTH: u32 = 4096;

/// Configuration for a univariate solver instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Encode power-of-two coefficients as left shifts instead of multiplications
    pub pow2_as_shift: bool,
    /// Keep the extremal witness pinned after a successful `find_min`/`find_max`
    ///
    /// When disabled (the default) the search leaves the constraint set as it
    /// found it.
    pub pin_extremal_witness: bool,
    /// Largest bit width the factory accepts
    pub max_bit_width: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            pow2_as_shift: true,
            pin_extremal_witness: false,
            max_bit_width: DEFAULT_MAX_BIT_WIDTH,
        }
    }
}

impl SolverConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable shift encoding of power-of-two coefficients
    #[must_use]
    pub fn with_pow2_as_shift(mut self, enabled: bool) -> Self {
        self.pow2_as_shift = enabled;
        self
    }

    /// Enable or disable pinning of extremal witnesses
    #[must_use]
    pub fn with_pin_extremal_witness(mut self, enabled: bool) -> Self {
        self.pin_extremal_witness = enabled;
        self
    }

    /// Set the largest accepted bit width
    #[must_use]
    pub fn with_max_bit_width(mut self, max: u32) -> Self {
        self.max_bit_width = max;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_bit_width == 0 {
            return Err(UnivsatError::InvalidConfig(
                "max_bit_width must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
