use serde::{Deserialize, Serialize};

/// Milliseconds since UNIX epoch (UTC).
pub type TimestampMs = i64;

/// A closed-open time range: [start, end).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Window {
    pub start: TimestampMs,
    pub end: TimestampMs,
}

impl Window {
    #[inline]
    pub fn new(start: TimestampMs, end: TimestampMs) -> Self {
        debug_assert!(end >= start);
        Self { start, end }
    }

    #[inline]
    pub fn contains(&self, ts: TimestampMs) -> bool {
        ts >= self.start && ts < self.end
    }

    #[inline]
    pub fn len(&self) -> i64 {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Maps timestamps onto fixed-width buckets `origin + k * interval`.
///
/// Fixed mode uses origin 0, so buckets sit on interval boundaries
/// (a 1h interval puts 22:32 into 22:00-23:00). Aligned mode uses the
/// series start as origin (starting at 06:30, 22:32 falls into 22:30-23:30).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BucketMapper {
    interval: i64,
    origin: TimestampMs,
}

impl BucketMapper {
    /// Buckets aligned to multiples of `interval`.
    #[inline]
    pub fn fixed(interval: i64) -> Self {
        Self::aligned(interval, 0)
    }

    /// Buckets aligned to `origin`.
    #[inline]
    pub fn aligned(interval: i64, origin: TimestampMs) -> Self {
        debug_assert!(interval > 0);
        Self { interval, origin }
    }

    #[inline]
    pub fn interval(&self) -> i64 {
        self.interval
    }

    #[inline]
    pub fn origin(&self) -> TimestampMs {
        self.origin
    }

    /// Greatest `origin + k * interval` that is `<= ts`.
    ///
    /// Overflows for timestamps within one interval of the `i64` limits; use
    /// [`checked_bucket_start`](Self::checked_bucket_start) there.
    #[inline]
    pub fn calculate_bucket_start(&self, ts: TimestampMs) -> TimestampMs {
        // floor division that handles timestamps before the origin
        let k = div_floor(ts - self.origin, self.interval);
        k * self.interval + self.origin
    }

    /// [`calculate_bucket_start`](Self::calculate_bucket_start), or `None`
    /// when the result is not representable.
    pub fn checked_bucket_start(&self, ts: TimestampMs) -> Option<TimestampMs> {
        let k = div_floor(ts.checked_sub(self.origin)?, self.interval);
        k.checked_mul(self.interval)?.checked_add(self.origin)
    }

    /// [`calculate_bucket_end`](Self::calculate_bucket_end), or `None` on overflow.
    pub fn checked_bucket_end(&self, ts: TimestampMs) -> Option<TimestampMs> {
        self.checked_bucket_start(ts)?.checked_add(self.interval)
    }

    /// Exclusive end of the bucket holding `ts`; always aligned.
    #[inline]
    pub fn calculate_bucket_end(&self, ts: TimestampMs) -> TimestampMs {
        self.calculate_bucket_start(ts) + self.interval
    }

    /// Timestamp the bucket holding `ts` is reported at.
    #[inline]
    pub fn map_to_bucket(&self, ts: TimestampMs) -> TimestampMs {
        self.calculate_bucket_start(ts)
    }

    #[inline]
    pub fn bucket(&self, ts: TimestampMs) -> Window {
        let start = self.calculate_bucket_start(ts);
        Window::new(start, start + self.interval)
    }
}

/// Floor division for i64 (unlike `/` which truncates toward zero).
#[inline]
fn div_floor(a: i64, b: i64) -> i64 {
    let q = a / b;
    let r = a % b;
    if (r != 0) && ((r > 0) != (b > 0)) { q - 1 } else { q }
}
