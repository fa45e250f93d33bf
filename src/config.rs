use std::time::Duration;

/// K = the default maximum size of a k-bucket, and the number of closer peers
/// sent back to a requester.
pub const MAX_BUCKET_SIZE_K: usize = 20;

/// Records received longer ago than this are dropped on read.
pub const DEFAULT_MAX_RECORD_AGE: Duration = Duration::from_secs(36 * 60 * 60);

#[derive(Debug, Clone)]
/// Server configurations
pub struct Config {
    /// Replication parameter, the maximum number of closer peers in a response.
    ///
    /// Defaults to [MAX_BUCKET_SIZE_K]
    pub k: usize,
    /// Maximum age of a stored record, measured from the moment this node received it.
    ///
    /// Stale records are purged the first time any read encounters them.
    ///
    /// Defaults to [DEFAULT_MAX_RECORD_AGE]
    pub max_record_age: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            k: MAX_BUCKET_SIZE_K,
            max_record_age: DEFAULT_MAX_RECORD_AGE,
        }
    }
}
