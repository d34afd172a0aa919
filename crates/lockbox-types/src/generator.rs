//! Credential generator options.

use serde::{Deserialize, Serialize};

/// Default length for generated passwords.
pub const DEFAULT_PASSWORD_LENGTH: usize = 16;

/// Shortest strong password: one character from each of the four classes.
pub const MIN_STRONG_LENGTH: usize = 4;

/// Longest credential the generator will produce.
pub const MAX_PASSWORD_LENGTH: usize = 1024;

/// Character-class policy for generated credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorOptions {
    /// Total output character count.
    pub length: usize,
    pub use_upper: bool,
    pub use_lower: bool,
    pub use_digits: bool,
    pub use_symbols: bool,
    /// Drop visually confusable characters (0/O, 1/l/I) from enabled classes.
    pub exclude_ambiguous: bool,
}

impl GeneratorOptions {
    pub fn any_class_enabled(&self) -> bool {
        self.use_upper || self.use_lower || self.use_digits || self.use_symbols
    }
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            length: DEFAULT_PASSWORD_LENGTH,
            use_upper: true,
            use_lower: true,
            use_digits: true,
            use_symbols: true,
            exclude_ambiguous: true,
        }
    }
}
