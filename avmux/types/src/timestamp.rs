/*!
    Timestamp types for media timing.
*/

use crate::Rational;

/**
    Presentation or decode timestamp in time_base units.

    Only meaningful together with the time base of the packet carrying it.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pts(pub i64);

impl Pts {
    /**
        Convert this timestamp from one time base to another.
    */
    #[inline]
    pub fn rescale(self, from: Rational, to: Rational) -> Self {
        Self(Rational::rescale(self.0, from, to))
    }
}

/**
    Duration in time_base units.

    Similar to Pts but semantically represents a duration rather than a point in time.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MediaDuration(pub i64);

impl MediaDuration {
    pub const ZERO: Self = Self(0);

    /**
        Convert this duration from one time base to another.
    */
    #[inline]
    pub fn rescale(self, from: Rational, to: Rational) -> Self {
        Self(Rational::rescale(self.0, from, to))
    }

    /**
        Duration of exactly one tick of `tick`, expressed in `time_base` units.

        Used to derive a per-frame duration from a nominal frame duration.
    */
    #[inline]
    pub fn one_tick(tick: Rational, time_base: Rational) -> Self {
        Self(Rational::rescale(1, tick, time_base))
    }
}
