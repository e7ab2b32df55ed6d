use serde::{Deserialize, Serialize};

use crate::errors::{MiningError, Result};

/// Mining configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MiningConfig {
    /// Minimum support threshold (0.0 - 1.0]
    /// Example: 0.1 = pattern must appear in at least 10% of transactions
    pub min_support: f64,

    /// Maximum support error (0.0 - 1.0], at most `min_support`.
    /// Patterns are kept as long as their support may still reach
    /// `min_support` within this error bound; the relative support error of
    /// any answer is bounded by `max_support_error / min_support`.
    pub max_support_error: f64,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            min_support: 0.1,       // 10%
            max_support_error: 0.05, // 5%
        }
    }
}

impl MiningConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.min_support > 0.0 && self.min_support <= 1.0) {
            return Err(MiningError::InvalidParameter(format!(
                "min_support must be in (0, 1], got {}",
                self.min_support
            )));
        }
        if !(self.max_support_error > 0.0 && self.max_support_error <= self.min_support) {
            return Err(MiningError::InvalidParameter(format!(
                "max_support_error must be in (0, min_support], got {}",
                self.max_support_error
            )));
        }
        Ok(())
    }
}
