//! Construction-time configuration: bucket count and its validation.

use core::fmt;

/// Bucket count used when none is given (64Ki).
pub const DEFAULT_BUCKET_COUNT: usize = 64 << 10;

/// Fixed parameters of a `SlabHashMap`, decided once at construction.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MapConfig {
    bucket_count: usize,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    /// More than one bucket-count override was supplied.
    TooManyBucketCounts(usize),
    ZeroBucketCount,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::TooManyBucketCounts(n) => {
                write!(f, "expected at most one bucket count, got {n}")
            }
            ConfigError::ZeroBucketCount => f.write_str("bucket count must be non-zero"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl MapConfig {
    pub fn with_bucket_count(bucket_count: usize) -> Result<Self, ConfigError> {
        if bucket_count == 0 {
            return Err(ConfigError::ZeroBucketCount);
        }
        Ok(Self { bucket_count })
    }

    /// Accepts zero or one override; zero falls back to [`DEFAULT_BUCKET_COUNT`].
    ///
    /// This is the optional trailing-argument form of construction: any caller
    /// forwarding a list of overrides gets a `TooManyBucketCounts` error rather
    /// than a silently ignored value.
    pub fn from_overrides(overrides: &[usize]) -> Result<Self, ConfigError> {
        match overrides {
            [] => Ok(Self::default()),
            [n] => Self::with_bucket_count(*n),
            more => Err(ConfigError::TooManyBucketCounts(more.len())),
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            bucket_count: DEFAULT_BUCKET_COUNT,
        }
    }
}
