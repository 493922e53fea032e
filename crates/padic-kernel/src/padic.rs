//! The completed ring `ℤ_p`.
//!
//! A [`PadicInt`] is a compatible tower `k ↦ x mod p^k`, evaluated on
//! demand. Ring operations compose towers lazily and exactly: the level-`k`
//! residue of `a + b` only ever reads the level-`k` residues of `a` and `b`.
//!
//! Zero tests are where completeness bites: `x = 0` is not decidable from
//! finitely many residues. [`PadicIntegers`] fixes a working precision `N`
//! and decides `x = 0` as `x ≡ 0 mod p^N`. Valuations below `N` are exact;
//! anything at or past `N` reads as zero, and the digit extractor refuses to
//! go past `N` for that reason.

use crate::error::KernelError;
use crate::prime::Prime;
use crate::rational::{Fraction, LocalRationals};
use crate::residue::{Residue, ResidueRing, reduce};
use crate::ring::{CompleteRing, Ring};
use num_bigint::{BigInt, BigUint};
use std::fmt;
use std::sync::Arc;

type Tower = dyn Fn(u32) -> Result<BigUint, KernelError> + Send + Sync;

/// Levels shown by `Debug`.
const DEBUG_DIGITS: u32 = 12;

/// A p-adic integer, given by its compatible tower of residues.
#[derive(Clone)]
pub struct PadicInt {
    prime: Prime,
    tower: Arc<Tower>,
}

impl PadicInt {
    /// Wrap a tower of residues.
    ///
    /// `f(k)` is reduced mod `p^k` on evaluation. Compatibility
    /// (`f(k+1) ≡ f(k) mod p^k`) is the caller's obligation.
    pub fn from_tower<F>(prime: Prime, f: F) -> Self
    where
        F: Fn(u32) -> Result<BigUint, KernelError> + Send + Sync + 'static,
    {
        Self {
            prime,
            tower: Arc::new(move |k| Ok(f(k)? % prime.pow(k))),
        }
    }

    /// The image of an integer.
    pub fn from_integer(prime: Prime, n: &BigInt) -> Self {
        let n = n.clone();
        Self::from_tower(prime, move |k| Ok(reduce(&n, &prime.pow(k))))
    }

    /// The image of a p-integral fraction.
    pub fn from_fraction(prime: Prime, a: &Fraction) -> Result<Self, KernelError> {
        let rationals = LocalRationals::new(prime);
        // fail now rather than on first evaluation
        rationals.reduce_mod(a, 1)?;
        let a = a.clone();
        Ok(Self::from_tower(prime, move |k| {
            rationals.reduce_mod(&a, k).map(Residue::into_value)
        }))
    }

    pub fn prime(&self) -> Prime {
        self.prime
    }

    /// The value accurate to `p^k`, as an element of `R_k`.
    pub fn approx(&self, k: u32) -> Result<Residue, KernelError> {
        let value = (self.tower)(k)?;
        Ok(ResidueRing::new(self.prime, k).element(&value))
    }

    fn eval(&self, k: u32) -> Result<BigUint, KernelError> {
        (self.tower)(k)
    }

    /// Base-p digits `d_0 … d_{k-1}`, least significant first.
    pub fn digits(&self, k: u32) -> Result<Vec<u64>, KernelError> {
        let mut value = self.eval(k)?;
        let p = self.prime.to_biguint();
        let mut digits = Vec::with_capacity(k as usize);
        for _ in 0..k {
            let d = &value % &p;
            value /= &p;
            digits.push(u64::try_from(&d).unwrap_or_default());
        }
        Ok(digits)
    }
}

impl fmt::Debug for PadicInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.digits(DEBUG_DIGITS) {
            Ok(digits) => {
                let shown: Vec<String> = digits.iter().rev().map(u64::to_string).collect();
                let sep = if self.prime.get() < 10 { "" } else { "," };
                write!(
                    f,
                    "PadicInt(…{} + O({}^{}))",
                    shown.join(sep),
                    self.prime,
                    DEBUG_DIGITS
                )
            }
            Err(e) => write!(f, "PadicInt(<{e}>)"),
        }
    }
}

/// `ℤ_p` with zero tests decided at a fixed working precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadicIntegers {
    prime: Prime,
    precision: u32,
}

impl PadicIntegers {
    pub fn new(prime: Prime, working_precision: u32) -> Self {
        Self {
            prime,
            precision: working_precision,
        }
    }

    pub fn integer(&self, n: impl Into<BigInt>) -> PadicInt {
        PadicInt::from_integer(self.prime, &n.into())
    }

    pub fn fraction(&self, a: &Fraction) -> Result<PadicInt, KernelError> {
        PadicInt::from_fraction(self.prime, a)
    }

    /// Reject elements built over another prime.
    pub fn check(&self, a: &PadicInt) -> Result<(), KernelError> {
        self.prime.ensure_same(a.prime)
    }

    /// Whether `a` and `b` have the same image in `R_k`.
    ///
    /// Towers are compatible, so agreement at `k` implies agreement at every
    /// level below it.
    pub fn eq_up_to(&self, a: &PadicInt, b: &PadicInt, k: u32) -> Result<bool, KernelError> {
        self.check(a)?;
        self.check(b)?;
        Ok(a.eval(k)? == b.eval(k)?)
    }

    /// Equality at working precision.
    pub fn equal(&self, a: &PadicInt, b: &PadicInt) -> Result<bool, KernelError> {
        self.eq_up_to(a, b, self.precision)
    }

    fn lift2<F>(&self, a: &PadicInt, b: &PadicInt, op: F) -> PadicInt
    where
        F: Fn(BigUint, BigUint) -> BigUint + Send + Sync + 'static,
    {
        let (a, b) = (a.clone(), b.clone());
        PadicInt::from_tower(self.prime, move |k| Ok(op(a.eval(k)?, b.eval(k)?)))
    }
}

impl Ring for PadicIntegers {
    type Element = PadicInt;

    fn zero(&self) -> PadicInt {
        self.integer(0)
    }

    fn one(&self) -> PadicInt {
        self.integer(1)
    }

    fn add(&self, a: &PadicInt, b: &PadicInt) -> PadicInt {
        self.lift2(a, b, |x, y| x + y)
    }

    fn neg(&self, a: &PadicInt) -> PadicInt {
        let a = a.clone();
        let prime = self.prime;
        PadicInt::from_tower(prime, move |k| {
            let modulus = prime.pow(k);
            let x = a.eval(k)?;
            Ok((&modulus - x) % modulus)
        })
    }

    fn mul(&self, a: &PadicInt, b: &PadicInt) -> PadicInt {
        self.lift2(a, b, |x, y| x * y)
    }

    fn sub(&self, a: &PadicInt, b: &PadicInt) -> PadicInt {
        let prime = self.prime;
        let (a, b) = (a.clone(), b.clone());
        PadicInt::from_tower(prime, move |k| {
            let modulus = prime.pow(k);
            Ok((a.eval(k)? + &modulus - b.eval(k)?) % modulus)
        })
    }

    fn from_int(&self, n: &BigInt) -> PadicInt {
        PadicInt::from_integer(self.prime, n)
    }
}

impl CompleteRing for PadicIntegers {
    fn prime(&self) -> Prime {
        self.prime
    }

    fn is_zero(&self, a: &PadicInt) -> Result<bool, KernelError> {
        Ok(a.eval(self.precision)? == BigUint::ZERO)
    }

    fn unit_valuation(&self, a: &PadicInt) -> Result<(PadicInt, u32), KernelError> {
        let top = a.eval(self.precision)?;
        let v = self
            .prime
            .multiplicity(&top)
            .ok_or(KernelError::ZeroDecomposition)?;
        let shift = self.prime.pow(v);
        let a = a.clone();
        let unit = PadicInt::from_tower(self.prime, move |k| {
            let level = k.checked_add(v).ok_or(KernelError::PrecisionExceeded {
                requested: k,
                working: u32::MAX - v,
            })?;
            Ok(a.eval(level)? / &shift)
        });
        Ok((unit, v))
    }

    fn residue_mod_p(&self, a: &PadicInt) -> Result<u64, KernelError> {
        let digit = a.eval(1)?;
        u64::try_from(&digit)
            .map_err(|_| KernelError::Collaborator(format!("digit {digit} overflows u64")))
    }

    fn working_precision(&self) -> Option<u32> {
        Some(self.precision)
    }
}
