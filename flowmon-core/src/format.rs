//! Rendering of the numbers written to the series files.

use std::fmt;

/// A decimal number as it appears in a series file.
///
/// Integral values keep one decimal place so a column never switches
/// between integer and decimal notation (`2.0`, `2.5`). The value is never
/// rendered in scientific notation.
///
/// ```
/// # use flowmon_core::format::Decimal;
/// assert_eq!(Decimal(2.0).to_string(), "2.0");
/// assert_eq!(Decimal(0.125).to_string(), "0.125");
/// assert_eq!(Decimal(0.000001).to_string(), "0.000001");
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decimal(pub f64);

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self(value) = *self;
        if value.is_finite() && value.fract() == 0.0 {
            write!(f, "{value:.1}")
        } else {
            write!(f, "{value}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral() {
        assert_eq!(Decimal(0.0).to_string(), "0.0");
        assert_eq!(Decimal(1600.0).to_string(), "1600.0");
    }

    #[test]
    fn fractional() {
        assert_eq!(Decimal(1.5).to_string(), "1.5");
        assert_eq!(Decimal(0.1 + 0.2).to_string(), "0.30000000000000004");
    }

    #[test]
    fn negative_zero() {
        assert_eq!(Decimal(-0.0).to_string(), "-0.0");
    }
}
