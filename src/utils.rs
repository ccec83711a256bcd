use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};

use crate::errors::{Error, Result};

/// Microseconds between the engine epoch (2000-01-01 00:00:00 UTC) and the
/// Unix epoch. Trajectory M-coordinates are expressed relative to the engine
/// epoch; this constant is fixed for the lifetime of the process.
pub const ENGINE_EPOCH_UNIX_MICROS: i64 = 946_684_800_000_000;

/// Converts a chrono timestamp to engine microseconds.
pub fn to_engine_timestamp(t: &DateTime<Utc>) -> i64 {
    t.timestamp_micros() - ENGINE_EPOCH_UNIX_MICROS
}

/// Converts engine microseconds back to a chrono timestamp.
///
/// ## Errors
/// `InvalidArgument` when the value falls outside the representable
/// timestamp range, as happens when deserializing a corrupted buffer.
pub fn from_engine_timestamp(micros: i64) -> Result<DateTime<Utc>> {
    micros
        .checked_add(ENGINE_EPOCH_UNIX_MICROS)
        .and_then(DateTime::from_timestamp_micros)
        .ok_or_else(|| Error::invalid(format!("engine timestamp {micros} is out of range")))
}

/// Fraction of `[start, end]` covered at `t`, as a float in `[0, 1]`.
///
/// `start < end` is a caller invariant.
pub(crate) fn segment_fraction(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    t: DateTime<Utc>,
) -> f64 {
    let total = (end - start).num_microseconds().unwrap_or(i64::MAX) as f64;
    let part = (t - start).num_microseconds().unwrap_or(i64::MAX) as f64;
    part / total
}

/// Timestamp at `fraction` of the way from `start` to `end`, truncated to
/// microsecond resolution.
pub(crate) fn timestamp_at_fraction(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    fraction: f64,
) -> DateTime<Utc> {
    let total = (end - start).num_microseconds().unwrap_or(i64::MAX) as f64;
    start + TimeDelta::microseconds((total * fraction) as i64)
}

/// Tolerance under which two segment fractions are considered the same
/// instant.
pub(crate) const FRACTION_EPSILON: f64 = 1e-12;

/// Cooperative cancellation token observed by long-running operators.
///
/// Cloning shares the underlying flag. Once cancelled a token stays
/// cancelled; the operator that observes it fails with [`Error::Cancelled`]
/// after releasing its partial state.
///
/// [`Error::Cancelled`]: crate::errors::Error::Cancelled
///
/// ## Example
/// ```
/// # use tempora::utils::CancelToken;
/// let token = CancelToken::new();
/// assert!(!token.is_cancelled());
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
