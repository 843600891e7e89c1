/*!
    Rational number type for time bases and frame rates.
*/

use std::fmt;

/**
    A rational number represented as a numerator and denominator.

    Used for time bases (e.g., 1/90000 for MPEG-TS) and nominal frame
    durations (e.g., 1/24 for a 24 fps stream).
*/
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    /**
        Microsecond time base, the common time base used to compare
        progress across streams.
    */
    pub const MICROSECONDS: Self = Self {
        num: 1,
        den: 1_000_000,
    };

    /**
        Create a new rational number.

        Any pair is accepted; use [`Rational::is_valid`] or
        [`Rational::is_positive`] before treating it as a time base or a
        frame duration.
    */
    #[inline]
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /**
        Invert the rational (swap numerator and denominator).

        # Panics

        Panics if numerator is zero.
    */
    #[inline]
    pub const fn invert(self) -> Self {
        assert!(self.num != 0, "cannot invert zero");
        Self {
            num: self.den,
            den: self.num,
        }
    }

    /**
        Returns true if this rational can be used as a time base,
        meaning its denominator is strictly positive.
    */
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.den > 0
    }

    /**
        Returns true if both numerator and denominator are strictly positive.
    */
    #[inline]
    pub const fn is_positive(self) -> bool {
        self.num > 0 && self.den > 0
    }

    /**
        Rescale `value` expressed in units of `from` into units of `to`.

        Computes `value * from / to` exactly in 128-bit arithmetic and rounds
        to the nearest integer, halfway cases away from zero. Results outside
        the `i64` range saturate.

        # Panics

        Panics if `to` has a zero numerator.
    */
    pub fn rescale(value: i64, from: Rational, to: Rational) -> i64 {
        if from == to {
            return value;
        }

        let mut num = value as i128 * from.num as i128 * to.den as i128;
        let mut den = from.den as i128 * to.num as i128;
        assert!(den != 0, "cannot rescale into a zero time base");
        if den < 0 {
            num = -num;
            den = -den;
        }

        let half = den / 2;
        let rounded = if num >= 0 {
            (num + half) / den
        } else {
            (num - half) / den
        };
        rounded.clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }
}

impl fmt::Debug for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}
