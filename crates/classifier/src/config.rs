//! Runtime configuration for classification runs.
//!
//! ```rust
//! use classifier::ClassifierConfig;
//!
//! let config = ClassifierConfig {
//!     workers: 4,
//!     ..Default::default()
//! };
//! config.validate().expect("valid config");
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ClassifyError;
use crate::retry::RetryPolicy;

/// Knobs for the scanning pool and batch retries.
///
/// Serializes as a flat section of the YAML config:
///
/// ```yaml
/// classifier:
///   workers: 8
///   max_retries: 3
///   base_delay_ms: 200
///   max_delay_ms: 10000
///   jitter: true
///   prefix_cache: 0
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Scanning threads. 0 lets rayon pick one per core.
    pub workers: usize,
    /// Whole-run retries while the store is unavailable.
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter: bool,
    /// Capacity of the prime-product prefix cache; 0 disables it.
    pub prefix_cache: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            max_retries: 3,
            base_delay_ms: 200,
            max_delay_ms: 10_000,
            jitter: true,
            prefix_cache: 0,
        }
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<(), ClassifyError> {
        if self.base_delay_ms > self.max_delay_ms {
            return Err(ClassifyError::Config(format!(
                "base_delay_ms ({}) exceeds max_delay_ms ({})",
                self.base_delay_ms, self.max_delay_ms
            )));
        }
        if self.workers > 1024 {
            return Err(ClassifyError::Config(format!(
                "workers must be <= 1024, got {}",
                self.workers
            )));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            jitter: self.jitter,
        }
    }
}
