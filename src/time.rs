//! Simulated time for the event kernel.
//!
//! `SimTime` is an absolute point on the virtual timeline, counted in
//! nanoseconds from the start of the simulation. `SimDuration` is a signed
//! span between two points; it is signed so that a negative delay can be
//! expressed by callers and rejected by the scheduler instead of wrapping.
//!
//! Neither type ever looks at the wall clock.

use serde::{Deserialize, Serialize};

const NANOS_PER_SEC: u64 = 1_000_000_000;

// ── SimTime ───────────────────────────────────────────────────────────

/// An absolute point in simulated time, in nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimTime(u64);

impl SimTime {
    /// The start of every simulation.
    pub const ZERO: SimTime = SimTime(0);

    /// The last representable instant.
    pub const MAX: SimTime = SimTime(u64::MAX);

    #[inline]
    pub const fn from_nanos(nanos: u64) -> Self {
        SimTime(nanos)
    }

    /// Saturates at [`SimTime::MAX`].
    #[inline]
    pub const fn from_millis(millis: u64) -> Self {
        SimTime(millis.saturating_mul(1_000_000))
    }

    /// Saturates at [`SimTime::MAX`].
    #[inline]
    pub const fn from_secs(secs: u64) -> Self {
        SimTime(secs.saturating_mul(NANOS_PER_SEC))
    }

    /// Raw nanosecond count.
    #[inline]
    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Time in (lossy) floating point seconds.
    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / NANOS_PER_SEC as f64
    }

    /// The instant `delay` after `self`.
    ///
    /// Returns `None` if the result would be negative or overflow.
    pub fn checked_add(self, delay: SimDuration) -> Option<SimTime> {
        if delay.0 >= 0 {
            self.0.checked_add(delay.0 as u64).map(SimTime)
        } else {
            self.0.checked_sub(delay.0.unsigned_abs()).map(SimTime)
        }
    }

    /// The span from `earlier` to `self`.
    ///
    /// Returns `None` if `earlier` is after `self` or the span does not fit
    /// a signed 64-bit nanosecond count.
    pub fn duration_since(self, earlier: SimTime) -> Option<SimDuration> {
        let nanos = self.0.checked_sub(earlier.0)?;
        i64::try_from(nanos).ok().map(SimDuration)
    }

    /// Returns `true` if `self` is strictly before `other`.
    #[inline]
    pub fn is_before(self, other: SimTime) -> bool {
        self.0 < other.0
    }
}

impl std::fmt::Display for SimTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "+")?;
        write_secs(f, self.0)
    }
}

// ── SimDuration ───────────────────────────────────────────────────────

/// A signed span of simulated time, in nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimDuration(i64);

impl SimDuration {
    pub const ZERO: SimDuration = SimDuration(0);

    #[inline]
    pub const fn from_nanos(nanos: i64) -> Self {
        SimDuration(nanos)
    }

    // Unit constructors saturate at the `i64` range rather than wrap.

    #[inline]
    pub const fn from_micros(micros: i64) -> Self {
        SimDuration(micros.saturating_mul(1_000))
    }

    #[inline]
    pub const fn from_millis(millis: i64) -> Self {
        SimDuration(millis.saturating_mul(1_000_000))
    }

    #[inline]
    pub const fn from_secs(secs: i64) -> Self {
        SimDuration(secs.saturating_mul(NANOS_PER_SEC as i64))
    }

    /// Build a span from floating point seconds, rounded to the nearest
    /// nanosecond and saturated at the `i64` range.
    pub fn from_secs_f64(secs: f64) -> Self {
        SimDuration((secs * NANOS_PER_SEC as f64).round() as i64)
    }

    /// As [`from_secs_f64`](Self::from_secs_f64), but `None` for NaN,
    /// infinities and values the `i64` range cannot hold.
    pub fn try_from_secs_f64(secs: f64) -> Option<Self> {
        let nanos = (secs * NANOS_PER_SEC as f64).round();
        // `i64::MAX as f64` rounds up to 2^63, which is already out of range.
        if nanos.is_finite() && nanos >= i64::MIN as f64 && nanos < i64::MAX as f64 {
            Some(SimDuration(nanos as i64))
        } else {
            None
        }
    }

    #[inline]
    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / NANOS_PER_SEC as f64
    }

    #[inline]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// `self * factor`, or `None` on overflow.
    pub fn checked_mul(self, factor: i64) -> Option<SimDuration> {
        self.0.checked_mul(factor).map(SimDuration)
    }
}

impl From<std::time::Duration> for SimDuration {
    /// Saturates at `i64::MAX` nanoseconds (about 292 years).
    fn from(d: std::time::Duration) -> Self {
        SimDuration(i64::try_from(d.as_nanos()).unwrap_or(i64::MAX))
    }
}

impl std::fmt::Display for SimDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 < 0 {
            write!(f, "-")?;
        }
        write_secs(f, self.0.unsigned_abs())
    }
}

/// Writes `nanos` as seconds with trailing fractional zeros trimmed,
/// e.g. `1.5s`, `0.000001s`, `3s`.
fn write_secs(f: &mut std::fmt::Formatter<'_>, nanos: u64) -> std::fmt::Result {
    let secs = nanos / NANOS_PER_SEC;
    let frac = nanos % NANOS_PER_SEC;
    if frac == 0 {
        return write!(f, "{}s", secs);
    }
    let digits = format!("{:09}", frac);
    write!(f, "{}.{}s", secs, digits.trim_end_matches('0'))
}
