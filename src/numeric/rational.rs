//! Exact rational arithmetic.
//!
//! Every [`Rational`] is kept in lowest terms with a strictly positive
//! denominator; integers are rationals with denominator 1. Intermediate
//! products are widened to `i128` before being reduced back down, which
//! keeps the common small-number programs in the test suite (GCDs, tail
//! sums, `1/2 + 1/3`) well clear of overflow without reaching for a bignum
//! dependency the language doesn't otherwise need.

use crate::diagnostics::{Error, Result, SourceLocation};
use std::fmt;

/// An exact rational number, always stored in lowest terms with
/// `denominator > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    /// Signed numerator.
    pub numerator: i64,
    /// Strictly positive denominator.
    pub denominator: i64,
}

fn gcd_u128(a: u128, b: u128) -> u128 {
    if b == 0 {
        a
    } else {
        gcd_u128(b, a % b)
    }
}

fn normalize(n: i128, d: i128) -> Rational {
    assert!(d != 0, "rational number cannot have zero denominator");
    let (mut n, mut d) = (n, d);
    if d < 0 {
        n = -n;
        d = -d;
    }
    if n == 0 {
        return Rational {
            numerator: 0,
            denominator: 1,
        };
    }
    let g = gcd_u128(n.unsigned_abs(), d.unsigned_abs()) as i128;
    Rational {
        numerator: (n / g) as i64,
        denominator: (d / g) as i64,
    }
}

impl Rational {
    /// The rational `0/1`.
    pub const ZERO: Rational = Rational {
        numerator: 0,
        denominator: 1,
    };

    /// The rational `1/1`.
    pub const ONE: Rational = Rational {
        numerator: 1,
        denominator: 1,
    };

    /// Constructs a new rational, normalizing to lowest terms with a
    /// positive denominator. Panics if `denominator == 0`: callers that
    /// accept a possibly-zero denominator from user input (division) must
    /// check for it themselves and raise a recoverable `Error` first.
    pub fn new(numerator: i64, denominator: i64) -> Self {
        normalize(numerator as i128, denominator as i128)
    }

    /// Constructs an integer rational (`n/1`).
    pub fn from_integer(n: i64) -> Self {
        Rational {
            numerator: n,
            denominator: 1,
        }
    }

    /// Constructs the boolean encoding used throughout the intrinsic layer:
    /// `1/1` for true, `0/1` for false.
    pub fn from_bool(b: bool) -> Self {
        Rational::from_integer(if b { 1 } else { 0 })
    }

    /// Scheme-style truthiness: any nonzero value is true.
    pub fn is_truthy(&self) -> bool {
        self.numerator != 0
    }

    /// Whether this value is an integer (denominator 1).
    pub fn is_integer(&self) -> bool {
        self.denominator == 1
    }

    /// Converts an integer-valued rational to `i64`. Callers must already
    /// know `is_integer()` holds; this is used only where the AST/parser
    /// grammar guarantees it (e.g. `.ssub` bounds after a `Domain` check).
    pub fn to_i64(&self) -> i64 {
        debug_assert!(self.is_integer());
        self.numerator
    }

    /// `self + other`.
    pub fn add(self, other: Rational) -> Rational {
        let n = self.numerator as i128 * other.denominator as i128
            + other.numerator as i128 * self.denominator as i128;
        let d = self.denominator as i128 * other.denominator as i128;
        normalize(n, d)
    }

    /// `self - other`.
    pub fn sub(self, other: Rational) -> Rational {
        let n = self.numerator as i128 * other.denominator as i128
            - other.numerator as i128 * self.denominator as i128;
        let d = self.denominator as i128 * other.denominator as i128;
        normalize(n, d)
    }

    /// `self * other`.
    pub fn mul(self, other: Rational) -> Rational {
        let n = self.numerator as i128 * other.numerator as i128;
        let d = self.denominator as i128 * other.denominator as i128;
        normalize(n, d)
    }

    /// `self / other`, failing with `DivisionByZero` if `other` is zero.
    pub fn div(self, other: Rational, at: SourceLocation) -> Result<Rational> {
        if other.numerator == 0 {
            return Err(Error::division_by_zero(at, "division by zero"));
        }
        let n = self.numerator as i128 * other.denominator as i128;
        let d = self.denominator as i128 * other.numerator as i128;
        Ok(normalize(n, d))
    }

    /// `self % other`: both operands must be integers, `self` non-negative
    /// and `other` strictly positive.
    pub fn modulo(self, other: Rational, at: SourceLocation) -> Result<Rational> {
        if !self.is_integer() || !other.is_integer() {
            return Err(Error::domain(at, ".% applied to a non-integer operand"));
        }
        if self.numerator < 0 || other.numerator <= 0 {
            return Err(Error::domain(
                at,
                ".% requires a non-negative left operand and a strictly positive right operand",
            ));
        }
        Ok(Rational::from_integer(self.numerator % other.numerator))
    }

    /// The greatest integer rational `<= self`.
    pub fn floor(self) -> Rational {
        Rational::from_integer(self.numerator.div_euclid(self.denominator))
    }

    /// The least integer rational `>= self`.
    pub fn ceil(self) -> Rational {
        let q = self.numerator.div_euclid(self.denominator);
        let r = self.numerator.rem_euclid(self.denominator);
        Rational::from_integer(if r == 0 { q } else { q + 1 })
    }

    /// `self < other`, by cross-multiplication (both denominators are
    /// positive, so no extra sign folding is required).
    pub fn lt(self, other: Rational) -> bool {
        let lhs = self.numerator as i128 * other.denominator as i128;
        let rhs = self.denominator as i128 * other.numerator as i128;
        lhs < rhs
    }

    /// `self <= other`.
    pub fn le(self, other: Rational) -> bool {
        !other.lt(self)
    }

    /// `self > other`.
    pub fn gt(self, other: Rational) -> bool {
        other.lt(self)
    }

    /// `self >= other`.
    pub fn ge(self, other: Rational) -> bool {
        !self.lt(other)
    }

    /// `self == other` (structural, after normalisation).
    pub fn num_eq(self, other: Rational) -> bool {
        !self.lt(other) && !other.lt(self)
    }

    /// `self != other`.
    pub fn num_ne(self, other: Rational) -> bool {
        self.lt(other) || other.lt(self)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_to_lowest_terms() {
        assert_eq!(Rational::new(4, 8), Rational::new(1, 2));
        assert_eq!(Rational::new(-4, 8), Rational::new(-1, 2));
    }

    #[test]
    fn denominator_sign_is_folded_into_numerator() {
        let r = Rational::new(3, -6);
        assert_eq!(r.numerator, -1);
        assert_eq!(r.denominator, 2);
    }

    #[test]
    fn half_plus_third_over_five() {
        let half = Rational::new(1, 2);
        let third = Rational::new(1, 3);
        let sum = half.add(third);
        assert_eq!(sum, Rational::new(5, 6));
        let result = sum.div(Rational::from_integer(5), SourceLocation::unknown()).unwrap();
        assert_eq!(result, Rational::new(1, 6));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let err = Rational::ONE
            .div(Rational::ZERO, SourceLocation::new(3, 4))
            .unwrap_err();
        assert_eq!(err.kind, crate::diagnostics::ErrorKind::DivisionByZero);
    }

    #[test]
    fn floor_and_ceil_round_toward_negative_and_positive_infinity() {
        let r = Rational::new(-7, 2);
        assert_eq!(r.floor(), Rational::from_integer(-4));
        assert_eq!(r.ceil(), Rational::from_integer(-3));
    }

    #[test]
    fn modulo_requires_non_negative_left_and_positive_right_integers() {
        let loc = SourceLocation::unknown();
        assert!(Rational::new(7, 2)
            .modulo(Rational::from_integer(2), loc)
            .is_err());
        assert!(Rational::from_integer(-1)
            .modulo(Rational::from_integer(2), loc)
            .is_err());
        assert!(Rational::from_integer(5)
            .modulo(Rational::from_integer(0), loc)
            .is_err());
        assert_eq!(
            Rational::from_integer(60)
                .modulo(Rational::from_integer(45), loc)
                .unwrap(),
            Rational::from_integer(15)
        );
    }

    #[test]
    fn additive_and_multiplicative_identities() {
        let x = Rational::new(7, 3);
        assert_eq!(Rational::ZERO.add(x), x);
        assert_eq!(Rational::ONE.mul(x), x);
        assert_eq!(x.div(Rational::ONE, SourceLocation::unknown()).unwrap(), x);
    }
}
