//! Small helpers shared by curve states, evolution descriptions and
//! discounters.

use ql_core::{ensure, errors::Result, Size, Time};
use std::ops::Range;

/// Require `times` to be non-empty, non-negative and strictly increasing.
pub fn check_increasing_times(times: &[Time]) -> Result<()> {
    ensure!(!times.is_empty(), "at least one time is required");
    ensure!(times[0] >= 0.0, "first time ({}) is negative", times[0]);
    for (i, w) in times.windows(2).enumerate() {
        ensure!(
            w[1] > w[0],
            "non increasing times: time[{i}] = {}, time[{}] = {}",
            w[0],
            i + 1,
            w[1]
        );
    }
    Ok(())
}

/// Index of the first element of a sorted slice that is not less than `x`.
#[inline]
pub(crate) fn lower_bound(sorted: &[Time], x: Time) -> Size {
    sorted.partition_point(|&t| t < x)
}

/// The half-open range `[first, end)` of rates still alive at a step.
///
/// Rates below `first` have fixed and are never touched again; the range
/// slices state vectors with bounds checks instead of raw loop limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AliveRange {
    first: Size,
    end: Size,
}

impl AliveRange {
    /// Build `[first, end)`; requires `first < end`.
    pub fn new(first: Size, end: Size) -> Result<Self> {
        ensure!(
            first < end,
            "alive range [{first}, {end}) contains no rate"
        );
        Ok(Self { first, end })
    }

    /// First alive rate.
    #[inline]
    pub fn first(&self) -> Size {
        self.first
    }

    /// One past the last rate.
    #[inline]
    pub fn end(&self) -> Size {
        self.end
    }

    /// Number of alive rates.
    #[inline]
    pub fn len(&self) -> Size {
        self.end - self.first
    }

    /// Whether the range holds no rate; never true once constructed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.first == self.end
    }

    /// Whether rate `i` is alive.
    #[inline]
    pub fn contains(&self, i: Size) -> bool {
        (self.first..self.end).contains(&i)
    }

    /// Iterator over alive indices, ascending.
    #[inline]
    pub fn indices(&self) -> Range<Size> {
        self.first..self.end
    }

    /// The alive part of `v`, or an error if `v` is too short.
    pub fn slice<'a, T>(&self, v: &'a [T]) -> Result<&'a [T]> {
        ensure!(
            v.len() >= self.end,
            "vector of length {} cannot hold alive range [{}, {})",
            v.len(),
            self.first,
            self.end
        );
        Ok(&v[self.first..self.end])
    }

    /// Mutable alive part of `v`.
    pub fn slice_mut<'a, T>(&self, v: &'a mut [T]) -> Result<&'a mut [T]> {
        ensure!(
            v.len() >= self.end,
            "vector of length {} cannot hold alive range [{}, {})",
            v.len(),
            self.first,
            self.end
        );
        Ok(&mut v[self.first..self.end])
    }
}
