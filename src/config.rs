//! Run configuration for a mirror walk.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{DriveError, Result};
use crate::retry::RetryPolicy;

/// Directory created under the working directory when no output root is given.
pub const DEFAULT_OUTPUT_DIR: &str = "SharedBackup";

/// Write buffer size for streamed content (8 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// Per-request connect/read timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Everything a walk needs to know, passed in at construction.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// The remote root folder is mirrored to `output_root/<root name>`.
    pub output_root: PathBuf,
    /// Enumerate only; transfer nothing and create no directories.
    pub list_only: bool,
    /// Stop after this many terminal items.
    pub max_items: Option<NonZeroUsize>,
    pub chunk_size: usize,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub acknowledge_abuse: bool,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from(DEFAULT_OUTPUT_DIR),
            list_only: false,
            max_items: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            acknowledge_abuse: true,
        }
    }
}

impl MirrorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(DriveError::InvalidConfig(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(DriveError::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(DriveError::InvalidConfig(
                "at least one attempt is required".to_string(),
            ));
        }
        Ok(())
    }
}
