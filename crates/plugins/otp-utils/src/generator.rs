//! OTP generation utilities.

use rand::Rng;
use rand::rngs::OsRng;

/// Configuration for OTP generation.
#[derive(Debug, Clone)]
pub struct OtpConfig {
    /// Number of digits in the code.
    pub length: u32,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self { length: 6 }
    }
}

impl OtpConfig {
    /// Creates a numeric OTP config.
    pub fn numeric(length: u32) -> Self {
        Self {
            length: length.clamp(1, 18),
        }
    }

    /// Smallest code with `length` digits and no leading zero.
    fn lower_bound(&self) -> u64 {
        10u64.pow(self.length - 1)
    }

    /// Largest code with `length` digits.
    fn upper_bound(&self) -> u64 {
        10u64.pow(self.length) - 1
    }
}

/// OTP generator.
///
/// Codes are drawn uniformly from `10^(n-1)..=10^n - 1` (100000–999999 for
/// six digits) using the operating system's CSPRNG.
#[derive(Debug, Clone, Default)]
pub struct OtpGenerator {
    config: OtpConfig,
}

impl OtpGenerator {
    /// Creates a new OTP generator with the given config.
    pub fn new(config: OtpConfig) -> Self {
        Self { config }
    }

    /// Creates a six-digit numeric generator.
    pub fn default_numeric() -> Self {
        Self::new(OtpConfig::numeric(6))
    }

    /// Returns the code length.
    pub fn length(&self) -> u32 {
        self.config.length
    }

    /// Generates a new OTP code.
    pub fn generate(&self) -> String {
        let value = OsRng.gen_range(self.config.lower_bound()..=self.config.upper_bound());
        format!("{:0width$}", value, width = self.config.length as usize)
    }
}
