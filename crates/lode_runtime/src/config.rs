//! Factory configuration.

use crate::errors::FactoryError;

/// Upper bound on string length, in code units.
pub const MAX_STRING_LENGTH: usize = (1 << 28) - 16;
/// Concatenations shorter than this are copied into a flat string.
pub const COMPOSITE_MIN_LENGTH: usize = 13;
/// Slices shorter than this are copied into a flat string.
pub const VIEW_MIN_LENGTH: usize = 13;
/// Size of the degraded error message buffer, terminator included.
pub const ERROR_BUFFER_SIZE: usize = 1000;

/// Factory configuration options.
#[derive(Clone, Copy, Debug)]
pub struct FactoryConfig {
    /// Byte budget of the short-lived space before a scavenge is needed.
    pub new_space_bytes: usize,
    /// Byte budget of the long-lived space before a full collection is needed.
    pub old_space_bytes: usize,
    pub max_string_length: usize,
    pub composite_min_length: usize,
    pub view_min_length: usize,
    /// When false every proper sub-string is a flat copy.
    pub string_slices: bool,
    /// Seed for the interning hash. `None` picks random keys per factory.
    pub hash_seed: Option<u64>,
    pub error_buffer_size: usize,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            new_space_bytes: 8 * 1024 * 1024,
            old_space_bytes: 256 * 1024 * 1024,
            max_string_length: MAX_STRING_LENGTH,
            composite_min_length: COMPOSITE_MIN_LENGTH,
            view_min_length: VIEW_MIN_LENGTH,
            string_slices: true,
            hash_seed: None,
            error_buffer_size: ERROR_BUFFER_SIZE,
        }
    }
}

impl FactoryConfig {
    pub fn validate(&self) -> Result<(), FactoryError> {
        // Two-unit results take the interning path, so nodes start at three units.
        if self.composite_min_length < 3 {
            return Err(FactoryError::InvalidConfig(
                "composite_min_length must be at least 3",
            ));
        }
        // Sub-threshold concatenation copies its operands directly, so neither
        // operand may be a view.
        if self.composite_min_length > self.view_min_length {
            return Err(FactoryError::InvalidConfig(
                "composite_min_length must not exceed view_min_length",
            ));
        }
        if self.max_string_length > MAX_STRING_LENGTH {
            return Err(FactoryError::InvalidConfig(
                "max_string_length exceeds the representable maximum",
            ));
        }
        if self.error_buffer_size < 2 {
            return Err(FactoryError::InvalidConfig(
                "error_buffer_size must hold at least one unit and a terminator",
            ));
        }
        Ok(())
    }
}
