//! Ring primitives consumed by the kernel.
//!
//! Rings are objects, elements are plain values: `ring.add(&a, &b)`. A ring
//! object owns whatever ambient data its arithmetic needs (the prime, the
//! level of a residue ring, a working precision), so elements stay small and
//! no ambient state is threaded through call sites.
//!
//! Two layers:
//!
//! - [`Ring`]: commutative ring operations. Sources of compatible families
//!   only need this.
//! - [`CompleteRing`]: a complete, discretely valued ring over a fixed prime,
//!   adding the zero test, the unit × p^v decomposition and reduction mod p.
//!   Digit extraction runs on top of exactly these primitives.

use crate::error::KernelError;
use crate::prime::Prime;
use num_bigint::{BigInt, BigUint};
use std::fmt;

/// A commutative ring with identity.
pub trait Ring: Send + Sync {
    type Element: Clone + fmt::Debug + Send + Sync + 'static;

    fn zero(&self) -> Self::Element;

    fn one(&self) -> Self::Element;

    fn add(&self, a: &Self::Element, b: &Self::Element) -> Self::Element;

    fn neg(&self, a: &Self::Element) -> Self::Element;

    fn mul(&self, a: &Self::Element, b: &Self::Element) -> Self::Element;

    fn sub(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        self.add(a, &self.neg(b))
    }

    /// The image of an integer under the canonical map `ℤ → R`.
    fn from_int(&self, n: &BigInt) -> Self::Element;

    /// `a^exp` by square-and-multiply.
    fn pow(&self, a: &Self::Element, exp: u32) -> Self::Element {
        let mut acc = self.one();
        let mut base = a.clone();
        let mut e = exp;
        while e > 0 {
            if e & 1 == 1 {
                acc = self.mul(&acc, &base);
            }
            e >>= 1;
            if e > 0 {
                base = self.mul(&base, &base);
            }
        }
        acc
    }
}

/// A complete, discretely valued ring with uniformizer `p`.
///
/// Inspections are fallible: a ring may only be able to decide them up to
/// a finite working precision, and a zero element has no unit/valuation
/// decomposition.
pub trait CompleteRing: Ring {
    /// The uniformizer.
    fn prime(&self) -> Prime;

    fn is_zero(&self, a: &Self::Element) -> Result<bool, KernelError>;

    /// Decompose nonzero `a` as `unit * p^valuation`.
    ///
    /// Returns `ZeroDecomposition` for zero.
    fn unit_valuation(&self, a: &Self::Element) -> Result<(Self::Element, u32), KernelError>;

    /// The canonical representative of `a mod p`, in `[0, p)`.
    fn residue_mod_p(&self, a: &Self::Element) -> Result<u64, KernelError>;

    /// The image of a natural number.
    fn from_natural(&self, n: &BigUint) -> Self::Element {
        self.from_int(&BigInt::from(n.clone()))
    }

    /// `p` as a ring element.
    fn uniformizer(&self) -> Self::Element {
        self.from_natural(&self.prime().to_biguint())
    }

    /// The precision up to which zero tests are decided.
    ///
    /// `None` for rings with exact equality.
    fn working_precision(&self) -> Option<u32> {
        None
    }

    /// The p-adic valuation of `a`, `None` for zero.
    fn valuation(&self, a: &Self::Element) -> Result<Option<u32>, KernelError> {
        if self.is_zero(a)? {
            return Ok(None);
        }
        let (_, v) = self.unit_valuation(a)?;
        Ok(Some(v))
    }

    /// Membership in the ideal `(p^n)`.
    fn in_ideal(&self, a: &Self::Element, n: u32) -> Result<bool, KernelError> {
        Ok(match self.valuation(a)? {
            None => true,
            Some(v) => v >= n,
        })
    }
}

/// The integers, the initial ring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Integers;

impl Ring for Integers {
    type Element = BigInt;

    fn zero(&self) -> BigInt {
        BigInt::ZERO
    }

    fn one(&self) -> BigInt {
        BigInt::from(1)
    }

    fn add(&self, a: &BigInt, b: &BigInt) -> BigInt {
        a + b
    }

    fn neg(&self, a: &BigInt) -> BigInt {
        -a
    }

    fn mul(&self, a: &BigInt, b: &BigInt) -> BigInt {
        a * b
    }

    fn sub(&self, a: &BigInt, b: &BigInt) -> BigInt {
        a - b
    }

    fn from_int(&self, n: &BigInt) -> BigInt {
        n.clone()
    }
}
