//! Residue rings `R_n = ℤ/p^n` and the restriction maps between them.
//!
//! A [`Residue`] carries its prime and level, so the canonical restriction
//! `R_n → R_m` is an explicit [`Residue::project`] call rather than a
//! coercion, and residues of different levels never compare equal.

use crate::error::KernelError;
use crate::prime::Prime;
use crate::ring::Ring;
use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An element of `ℤ/p^level`, stored as its canonical representative in
/// `[0, p^level)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawResidue")]
pub struct Residue {
    prime: Prime,
    level: u32,
    #[serde(with = "decimal")]
    value: BigUint,
}

#[derive(Deserialize)]
struct RawResidue {
    prime: Prime,
    level: u32,
    #[serde(with = "decimal")]
    value: BigUint,
}

impl TryFrom<RawResidue> for Residue {
    type Error = KernelError;

    fn try_from(raw: RawResidue) -> Result<Self, Self::Error> {
        let modulus = raw.prime.pow(raw.level);
        if raw.value >= modulus {
            return Err(KernelError::Collaborator(format!(
                "residue value {} is not below {}^{}",
                raw.value, raw.prime, raw.level
            )));
        }
        Ok(Self {
            prime: raw.prime,
            level: raw.level,
            value: raw.value,
        })
    }
}

impl Residue {
    pub fn prime(&self) -> Prime {
        self.prime
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// The canonical representative, in `[0, p^level)`.
    pub fn value(&self) -> &BigUint {
        &self.value
    }

    pub fn into_value(self) -> BigUint {
        self.value
    }

    pub fn is_zero(&self) -> bool {
        self.value == BigUint::ZERO
    }

    /// The canonical restriction `R_level → R_to`.
    ///
    /// Fails with `ProjectionLevel` when `to > level`; there is no canonical
    /// map upwards.
    pub fn project(&self, to: u32) -> Result<Residue, KernelError> {
        if to > self.level {
            return Err(KernelError::ProjectionLevel {
                from: self.level,
                to,
            });
        }
        Ok(Residue {
            prime: self.prime,
            level: to,
            value: &self.value % self.prime.pow(to),
        })
    }
}

impl fmt::Display for Residue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mod {}^{}", self.value, self.prime, self.level)
    }
}

/// The ring `ℤ/p^n` for one fixed level `n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidueRing {
    prime: Prime,
    level: u32,
    modulus: BigUint,
}

impl ResidueRing {
    pub fn new(prime: Prime, level: u32) -> Self {
        Self {
            prime,
            level,
            modulus: prime.pow(level),
        }
    }

    pub fn prime(&self) -> Prime {
        self.prime
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// `p^level`.
    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// The residue class of a natural number.
    pub fn element(&self, value: &BigUint) -> Residue {
        Residue {
            prime: self.prime,
            level: self.level,
            value: value % &self.modulus,
        }
    }

    /// Reject residues that do not live in this ring.
    pub fn check(&self, a: &Residue) -> Result<(), KernelError> {
        self.prime.ensure_same(a.prime)?;
        if a.level != self.level {
            return Err(KernelError::LevelMismatch {
                expected: self.level,
                actual: a.level,
            });
        }
        Ok(())
    }

    /// Multiplicative inverse, if `a` is a unit.
    pub fn inverse(&self, a: &Residue) -> Option<Residue> {
        let inv = inverse_mod(&BigInt::from(a.value.clone()), &self.modulus)?;
        Some(self.element(&inv))
    }
}

impl Ring for ResidueRing {
    type Element = Residue;

    fn zero(&self) -> Residue {
        self.element(&BigUint::ZERO)
    }

    fn one(&self) -> Residue {
        self.element(&BigUint::from(1u32))
    }

    fn add(&self, a: &Residue, b: &Residue) -> Residue {
        debug_assert!(self.check(a).is_ok() && self.check(b).is_ok());
        self.element(&(&a.value + &b.value))
    }

    fn neg(&self, a: &Residue) -> Residue {
        debug_assert!(self.check(a).is_ok());
        if a.is_zero() {
            return self.zero();
        }
        self.element(&(&self.modulus - &a.value))
    }

    fn mul(&self, a: &Residue, b: &Residue) -> Residue {
        debug_assert!(self.check(a).is_ok() && self.check(b).is_ok());
        self.element(&(&a.value * &b.value))
    }

    fn from_int(&self, n: &BigInt) -> Residue {
        self.element(&reduce(n, &self.modulus))
    }
}

/// `n mod m` in `[0, m)`, for any sign of `n`.
pub(crate) fn reduce(n: &BigInt, m: &BigUint) -> BigUint {
    let m = BigInt::from(m.clone());
    let r = n.mod_floor(&m);
    // mod_floor with a positive modulus is non-negative
    r.to_biguint().unwrap_or_default()
}

/// Inverse of `a` modulo `m`, if `gcd(a, m) = 1`.
pub(crate) fn inverse_mod(a: &BigInt, m: &BigUint) -> Option<BigUint> {
    if m == &BigUint::from(1u32) {
        return Some(BigUint::ZERO);
    }
    let modulus = BigInt::from(m.clone());
    let egcd = a.mod_floor(&modulus).extended_gcd(&modulus);
    if egcd.gcd != BigInt::from(1) {
        return None;
    }
    Some(reduce(&egcd.x, m))
}

/// Signed integer for a natural number.
pub(crate) fn signed(n: &BigUint) -> BigInt {
    BigInt::from_biguint(Sign::Plus, n.clone())
}

/// Decimal string encoding for big naturals.
pub(crate) mod decimal {
    use num_bigint::BigUint;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_str_radix(10))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let s = String::deserialize(deserializer)?;
        BigUint::parse_bytes(s.as_bytes(), 10)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid decimal natural: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(n: u64) -> Prime {
        Prime::new(n).unwrap()
    }

    #[test]
    fn residue_ring_arithmetic() {
        let r = ResidueRing::new(p(3), 2);
        let a = r.element(&BigUint::from(7u32));
        let b = r.element(&BigUint::from(5u32));
        assert_eq!(r.add(&a, &b).value(), &BigUint::from(3u32));
        assert_eq!(r.mul(&a, &b).value(), &BigUint::from(8u32));
        assert_eq!(r.neg(&a).value(), &BigUint::from(2u32));
        assert_eq!(r.sub(&b, &a).value(), &BigUint::from(7u32));
        assert_eq!(r.from_int(&BigInt::from(-1)).value(), &BigUint::from(8u32));
    }

    #[test]
    fn level_zero_is_the_zero_ring() {
        let r = ResidueRing::new(p(5), 0);
        assert_eq!(r.one(), r.zero());
        assert!(r.element(&BigUint::from(42u32)).is_zero());
    }

    #[test]
    fn projection_is_reduction() {
        let r = ResidueRing::new(p(2), 5);
        let a = r.element(&BigUint::from(27u32));
        let down = a.project(3).unwrap();
        assert_eq!(down.level(), 3);
        assert_eq!(down.value(), &BigUint::from(3u32));
        assert_eq!(a.project(5).unwrap(), a);
    }

    #[test]
    fn projection_upwards_is_rejected() {
        let a = ResidueRing::new(p(2), 2).one();
        assert_eq!(
            a.project(3),
            Err(KernelError::ProjectionLevel { from: 2, to: 3 })
        );
    }

    #[test]
    fn projection_is_a_ring_hom() {
        let hi = ResidueRing::new(p(7), 4);
        let lo = ResidueRing::new(p(7), 2);
        let a = hi.from_int(&BigInt::from(1234));
        let b = hi.from_int(&BigInt::from(-987));
        let sum = hi.add(&a, &b).project(2).unwrap();
        let prod = hi.mul(&a, &b).project(2).unwrap();
        let a2 = a.project(2).unwrap();
        let b2 = b.project(2).unwrap();
        assert_eq!(sum, lo.add(&a2, &b2));
        assert_eq!(prod, lo.mul(&a2, &b2));
        assert_eq!(hi.one().project(2).unwrap(), lo.one());
    }

    #[test]
    fn check_rejects_foreign_residues() {
        let r = ResidueRing::new(p(3), 2);
        let other_level = ResidueRing::new(p(3), 3).one();
        let other_prime = ResidueRing::new(p(5), 2).one();
        assert_eq!(
            r.check(&other_level),
            Err(KernelError::LevelMismatch {
                expected: 2,
                actual: 3
            })
        );
        assert!(matches!(
            r.check(&other_prime),
            Err(KernelError::PrimeMismatch { .. })
        ));
    }

    #[test]
    fn inverse_exists_for_units_only() {
        let r = ResidueRing::new(p(5), 3);
        let a = r.element(&BigUint::from(7u32));
        let inv = r.inverse(&a).unwrap();
        assert_eq!(r.mul(&a, &inv), r.one());
        assert!(r.inverse(&r.element(&BigUint::from(10u32))).is_none());
    }

    #[test]
    fn residue_serde_validates_range() {
        let a = ResidueRing::new(p(2), 3).element(&BigUint::from(5u32));
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["value"], "5");
        let back: Residue = serde_json::from_value(json).unwrap();
        assert_eq!(back, a);

        let bad = serde_json::json!({"prime": 2, "level": 3, "value": "8"});
        assert!(serde_json::from_value::<Residue>(bad).is_err());
    }
}
