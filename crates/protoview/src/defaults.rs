//! Default tuning values

use std::time::Duration;

/// Minimum time between two dirty-entry sweeps of the method lookup cache
pub const DEFAULT_LOOKUP_CLEANUP_INTERVAL: Duration = Duration::from_secs(30);

/// A sweep of the method lookup cache is attempted every this many misses
pub const DEFAULT_LOOKUP_CLEANUP_MISS_STRIDE: usize = 10;

/// Smallest number of operations between two stale-entry sweeps of a weak
/// identity map
pub const MIN_WEAK_MAP_SWEEP_INTERVAL: usize = 16;
