//! The p-integral rationals `ℤ_(p)`.
//!
//! Fractions `a/b` in lowest terms with `p ∤ b`. This ring has exact
//! equality and an exact unit/valuation decomposition, which makes it the
//! reference collaborator for digit extraction: every element has a
//! well-defined expansion in `ℤ_p`, and finite expansions (integers) as
//! well as eventually periodic ones (`-1/3`, `1/7`, ...) are both covered.

use crate::error::KernelError;
use crate::prime::Prime;
use crate::residue::{Residue, ResidueRing, signed};
use crate::ring::{CompleteRing, Ring};
use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{One, Signed, Zero};
use std::fmt;

/// A p-integral fraction in lowest terms with positive denominator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fraction {
    num: BigInt,
    den: BigUint,
}

impl Fraction {
    pub fn numer(&self) -> &BigInt {
        &self.num
    }

    pub fn denom(&self) -> &BigUint {
        &self.den
    }

    pub fn is_integer(&self) -> bool {
        self.den.is_one()
    }

    fn lowest_terms(num: BigInt, den: BigUint) -> Self {
        let g = num.magnitude().gcd(&den);
        if g.is_one() || g.is_zero() {
            return Self { num, den };
        }
        Self {
            num: num / signed(&g),
            den: den / g,
        }
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_integer() {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

/// `ℤ_(p)` over a fixed prime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalRationals {
    prime: Prime,
}

impl LocalRationals {
    pub fn new(prime: Prime) -> Self {
        Self { prime }
    }

    /// The fraction `num/den`, reduced.
    ///
    /// Fails when `den` is zero or when the reduced denominator is
    /// divisible by `p`.
    pub fn fraction(
        &self,
        num: impl Into<BigInt>,
        den: impl Into<BigInt>,
    ) -> Result<Fraction, KernelError> {
        let num = num.into();
        let den = den.into();
        if den.is_zero() {
            return Err(KernelError::Parse(format!("{num}/0 has a zero denominator")));
        }
        let (num, den) = if den.is_negative() {
            (-num, -den)
        } else {
            (num, den)
        };
        let den = den.to_biguint().unwrap_or_default();
        let frac = Fraction::lowest_terms(num, den);
        if (&frac.den % self.prime.to_biguint()).is_zero() {
            return Err(KernelError::NotIntegral {
                value: frac.to_string(),
                prime: self.prime,
            });
        }
        Ok(frac)
    }

    pub fn integer(&self, n: impl Into<BigInt>) -> Fraction {
        Fraction {
            num: n.into(),
            den: BigUint::one(),
        }
    }

    /// Parse `"a"` or `"a/b"`.
    pub fn parse(&self, s: &str) -> Result<Fraction, KernelError> {
        let parse_int = |t: &str| -> Result<BigInt, KernelError> {
            BigInt::parse_bytes(t.trim().as_bytes(), 10)
                .ok_or_else(|| KernelError::Parse(format!("not an integer: {t}")))
        };
        match s.split_once('/') {
            Some((num, den)) => self.fraction(parse_int(num)?, parse_int(den)?),
            None => Ok(self.integer(parse_int(s)?)),
        }
    }

    /// `num · den⁻¹ mod p^level`, the image of `a` in `R_level`.
    ///
    /// Fails with `NotIntegral` for a fraction built over another prime
    /// whose denominator is not a unit here.
    pub fn reduce_mod(&self, a: &Fraction, level: u32) -> Result<Residue, KernelError> {
        let den = signed(&a.den);
        // R_0 is the zero ring, so p ∤ den is decided in R_1
        let residue_field = ResidueRing::new(self.prime, 1);
        let target = ResidueRing::new(self.prime, level);
        let inv = residue_field
            .inverse(&residue_field.from_int(&den))
            .and_then(|_| target.inverse(&target.from_int(&den)))
            .ok_or_else(|| KernelError::NotIntegral {
                value: a.to_string(),
                prime: self.prime,
            })?;
        Ok(target.mul(&target.from_int(&a.num), &inv))
    }
}

impl Ring for LocalRationals {
    type Element = Fraction;

    fn zero(&self) -> Fraction {
        self.integer(0)
    }

    fn one(&self) -> Fraction {
        self.integer(1)
    }

    fn add(&self, a: &Fraction, b: &Fraction) -> Fraction {
        let num = &a.num * signed(&b.den) + &b.num * signed(&a.den);
        Fraction::lowest_terms(num, &a.den * &b.den)
    }

    fn neg(&self, a: &Fraction) -> Fraction {
        Fraction {
            num: -&a.num,
            den: a.den.clone(),
        }
    }

    fn mul(&self, a: &Fraction, b: &Fraction) -> Fraction {
        Fraction::lowest_terms(&a.num * &b.num, &a.den * &b.den)
    }

    fn from_int(&self, n: &BigInt) -> Fraction {
        self.integer(n.clone())
    }
}

impl CompleteRing for LocalRationals {
    fn prime(&self) -> Prime {
        self.prime
    }

    fn is_zero(&self, a: &Fraction) -> Result<bool, KernelError> {
        Ok(a.num.is_zero())
    }

    fn unit_valuation(&self, a: &Fraction) -> Result<(Fraction, u32), KernelError> {
        let v = self
            .prime
            .multiplicity(a.num.magnitude())
            .ok_or(KernelError::ZeroDecomposition)?;
        let unit = Fraction {
            num: &a.num / signed(&self.prime.pow(v)),
            den: a.den.clone(),
        };
        Ok((unit, v))
    }

    fn residue_mod_p(&self, a: &Fraction) -> Result<u64, KernelError> {
        let digit = self.reduce_mod(a, 1)?;
        u64::try_from(digit.value())
            .map_err(|_| KernelError::Collaborator(format!("digit {} overflows u64", digit)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(p: u64) -> LocalRationals {
        LocalRationals::new(Prime::new(p).unwrap())
    }

    #[test]
    fn fractions_are_reduced() {
        let r = q(5);
        let a = r.fraction(6, -4).unwrap();
        assert_eq!(a.numer(), &BigInt::from(-3));
        assert_eq!(a.denom(), &BigUint::from(2u32));
        assert_eq!(a.to_string(), "-3/2");
    }

    #[test]
    fn non_integral_fraction_is_rejected() {
        let r = q(3);
        assert!(matches!(
            r.fraction(1, 6),
            Err(KernelError::NotIntegral { .. })
        ));
        // 3/6 reduces to 1/2, which is 3-integral
        assert!(r.fraction(3, 6).is_ok());
        assert!(matches!(r.fraction(1, 0), Err(KernelError::Parse(_))));
    }

    #[test]
    fn parse_forms() {
        let r = q(2);
        assert_eq!(r.parse("-7").unwrap(), r.integer(-7));
        assert_eq!(r.parse(" 2 / 6 ").unwrap(), r.fraction(1, 3).unwrap());
        assert!(r.parse("1/2").is_err());
        assert!(r.parse("abc").is_err());
    }

    #[test]
    fn unit_valuation_splits_p_power() {
        let r = q(3);
        let a = r.fraction(-54, 5).unwrap();
        let (u, v) = r.unit_valuation(&a).unwrap();
        assert_eq!(v, 3);
        assert_eq!(u, r.fraction(-2, 5).unwrap());
        assert_eq!(
            r.unit_valuation(&r.zero()),
            Err(KernelError::ZeroDecomposition)
        );
    }

    #[test]
    fn mod_part_inverts_the_denominator() {
        let r = q(7);
        let a = r.fraction(1, 3).unwrap();
        // 3 * 5 = 15 = 1 mod 7
        assert_eq!(r.residue_mod_p(&a).unwrap(), 5);
        assert_eq!(r.residue_mod_p(&r.integer(-1)).unwrap(), 6);
    }

    #[test]
    fn reduce_mod_higher_levels() {
        let r = q(2);
        let third = r.fraction(-1, 3).unwrap();
        // -1/3 = ...010101011 in Z_2; mod 16 it is 5 (3 * 5 = 15 = -1 mod 16)
        assert_eq!(r.reduce_mod(&third, 4).unwrap().value(), &BigUint::from(5u32));
    }

    #[test]
    fn reduce_mod_rejects_foreign_denominators() {
        // 1/3 is 5-integral but not 3-integral
        let third = q(5).fraction(1, 3).unwrap();
        let r = q(3);
        for level in [0, 1, 4] {
            assert!(matches!(
                r.reduce_mod(&third, level),
                Err(KernelError::NotIntegral { .. })
            ));
        }
        assert!(r.reduce_mod(&r.fraction(2, 5).unwrap(), 0).unwrap().is_zero());
    }

    #[test]
    fn arithmetic_is_exact() {
        let r = q(5);
        let a = r.fraction(1, 2).unwrap();
        let b = r.fraction(1, 3).unwrap();
        assert_eq!(r.add(&a, &b), r.fraction(5, 6).unwrap());
        assert_eq!(r.mul(&a, &b), r.fraction(1, 6).unwrap());
        assert_eq!(r.sub(&a, &a), r.zero());
    }
}
