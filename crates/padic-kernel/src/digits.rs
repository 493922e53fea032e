//! Digit extraction: `appr(x, n)`, the canonical representative of
//! `x mod p^n` in `[0, p^n)`.
//!
//! The recurrence only uses the complete ring's primitives:
//!
//! ```text
//! appr(x, 0)   = 0
//! appr(x, n+1) = appr(x, n)                            if y = 0
//!              = appr(x, n) + p^n · ((u · p^(v-n)) mod p)  otherwise
//!   where y = x - appr(x, n) = u · p^v
//! ```
//!
//! Each level reuses the previous approximation verbatim as its low-order
//! part, so digits fixed at level `n` are never revisited.

use crate::error::KernelError;
use crate::prime::Prime;
use crate::residue::{Residue, ResidueRing, decimal};
use crate::ring::{CompleteRing, Ring};
use num_bigint::{BigInt, BigUint};
use serde::Serialize;
use tracing::trace;

/// `appr(x, n)`: a natural number below `p^n`.
///
/// Only the extractor can build one, one digit at a time, so the bound
/// holds by construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Approximation {
    prime: Prime,
    level: u32,
    #[serde(with = "decimal")]
    value: BigUint,
}

impl Approximation {
    /// `appr(x, 0) = 0`, for every `x`.
    pub fn base(prime: Prime) -> Self {
        Self {
            prime,
            level: 0,
            value: BigUint::ZERO,
        }
    }

    /// Append digit `d` at position `level`.
    fn extend(&self, digit: u64) -> Result<Self, KernelError> {
        if digit >= self.prime.get() {
            return Err(KernelError::Collaborator(format!(
                "residue digit {digit} is not below {}",
                self.prime
            )));
        }
        Ok(Self {
            prime: self.prime,
            level: self.level + 1,
            value: &self.value + self.prime.pow(self.level) * BigUint::from(digit),
        })
    }

    pub fn prime(&self) -> Prime {
        self.prime
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn value(&self) -> &BigUint {
        &self.value
    }

    /// The same number as an element of `R_level`.
    pub fn to_residue(&self) -> Residue {
        ResidueRing::new(self.prime, self.level).element(&self.value)
    }

    /// Base-p digits, least significant first, exactly `level` of them.
    pub fn digits(&self) -> Vec<u64> {
        let p = self.prime.to_biguint();
        let mut rest = self.value.clone();
        (0..self.level)
            .map(|_| {
                let d = &rest % &p;
                rest /= &p;
                u64::try_from(&d).unwrap_or_default()
            })
            .collect()
    }

    /// Whether `self` extends `lower`: same prime, at least as many
    /// levels, and the same low-order digits.
    pub fn refines(&self, lower: &Approximation) -> bool {
        self.prime == lower.prime
            && lower.level <= self.level
            && &self.value % self.prime.pow(lower.level) == lower.value
    }
}

/// Computes `appr(x, n)` over a complete ring.
#[derive(Debug, Clone)]
pub struct DigitExtractor<R> {
    ring: R,
}

impl<R: CompleteRing> DigitExtractor<R> {
    pub fn new(ring: R) -> Self {
        Self { ring }
    }

    pub fn ring(&self) -> &R {
        &self.ring
    }

    pub fn prime(&self) -> Prime {
        self.ring.prime()
    }

    /// `appr(x, n)`.
    pub fn appr(&self, x: &R::Element, n: u32) -> Result<Approximation, KernelError> {
        self.check_precision(n)?;
        let mut current = Approximation::base(self.prime());
        for _ in 0..n {
            current = self.step(x, &current)?;
        }
        Ok(current)
    }

    /// `appr(x, 0), …, appr(x, n)` in one sequential pass.
    pub fn tower(&self, x: &R::Element, n: u32) -> Result<Vec<Approximation>, KernelError> {
        self.check_precision(n)?;
        let mut levels = Vec::new();
        let mut current = Approximation::base(self.prime());
        for _ in 0..n {
            let next = self.step(x, &current)?;
            levels.push(current);
            current = next;
        }
        levels.push(current);
        Ok(levels)
    }

    /// Base-p digits `d_0 … d_{n-1}` of `x`.
    pub fn digits(&self, x: &R::Element, n: u32) -> Result<Vec<u64>, KernelError> {
        Ok(self.appr(x, n)?.digits())
    }

    /// One refinement step: `appr(x, n) → appr(x, n+1)`.
    ///
    /// `prev` must be `appr(x, n)` for the same `x`.
    pub fn step(&self, x: &R::Element, prev: &Approximation) -> Result<Approximation, KernelError> {
        self.prime().ensure_same(prev.prime)?;
        let n = prev.level;
        let y = self.ring.sub(x, &self.ring.from_natural(&prev.value));

        if self.ring.is_zero(&y)? {
            trace!(level = n, "residual vanishes, digit is zero");
            return prev.extend(0);
        }

        let (unit, v) = self.ring.unit_valuation(&y)?;
        let shift = v.checked_sub(n).ok_or_else(|| {
            KernelError::Collaborator(format!(
                "residual x - appr(x, {n}) has valuation {v} below its level"
            ))
        })?;
        let scaled = self
            .ring
            .mul(&unit, &self.ring.pow(&self.ring.uniformizer(), shift));
        let digit = self.ring.residue_mod_p(&scaled)?;
        trace!(level = n, valuation = v, digit, "appr step");
        prev.extend(digit)
    }

    /// The cofactor `k` with `appr(x, n) - appr(x, m) = p^m · k`, `m ≤ n`.
    ///
    /// Digit stability: the division is always exact. `m > n` is a
    /// `LevelOrder` error.
    pub fn dvd_appr_sub_appr(
        &self,
        x: &R::Element,
        m: u32,
        n: u32,
    ) -> Result<BigUint, KernelError> {
        if m > n {
            return Err(KernelError::LevelOrder { lower: m, upper: n });
        }
        let levels = self.tower(x, n)?;
        let (low, high) = (&levels[m as usize], &levels[n as usize]);
        let diff = high.value() - low.value();
        let modulus = self.prime().pow(m);
        if &diff % &modulus != BigUint::ZERO {
            return Err(KernelError::Collaborator(format!(
                "appr(x, {n}) - appr(x, {m}) = {diff} is not divisible by {}^{m}",
                self.prime()
            )));
        }
        Ok(diff / modulus)
    }

    /// `x - appr(x, n) ∈ (p^n)`.
    pub fn appr_spec(&self, x: &R::Element, n: u32) -> Result<bool, KernelError> {
        let a = self.appr(x, n)?;
        let residual = self.ring.sub(x, &self.ring.from_natural(a.value()));
        self.ring.in_ideal(&residual, n)
    }

    /// The level-1 map `x ↦ x mod p`, straight from the ring primitive.
    pub fn to_zmod(&self, x: &R::Element) -> Result<Residue, KernelError> {
        let digit = self.ring.residue_mod_p(x)?;
        Ok(ResidueRing::new(self.prime(), 1).from_int(&BigInt::from(digit)))
    }

    fn check_precision(&self, n: u32) -> Result<(), KernelError> {
        match self.ring.working_precision() {
            Some(working) if n > working => Err(KernelError::PrecisionExceeded {
                requested: n,
                working,
            }),
            _ => Ok(()),
        }
    }
}
