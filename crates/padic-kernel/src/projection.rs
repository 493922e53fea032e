//! The quotient projections `toResidue(n) : R → ℤ/p^n`.
//!
//! `toResidue(n)(x)` is `appr(x, n)` read as an element of `R_n`. The maps
//! are ring homomorphisms and are strictly compatible: projecting
//! `toResidue(n)(x)` down to level `m` gives `toResidue(m)(x)` on the nose,
//! because `appr` never revisits a digit.

use crate::digits::DigitExtractor;
use crate::error::KernelError;
use crate::family::CompatibleFamily;
use crate::prime::Prime;
use crate::residue::{Residue, ResidueRing};
use crate::ring::CompleteRing;

/// The family `{toResidue(n)}` over a complete ring.
#[derive(Debug, Clone)]
pub struct ToResidue<R> {
    extractor: DigitExtractor<R>,
}

impl<R: CompleteRing> ToResidue<R> {
    pub fn new(ring: R) -> Self {
        Self {
            extractor: DigitExtractor::new(ring),
        }
    }

    pub fn ring(&self) -> &R {
        self.extractor.ring()
    }

    pub fn extractor(&self) -> &DigitExtractor<R> {
        &self.extractor
    }

    /// The target ring of `toResidue(level)`.
    pub fn residue_ring(&self, level: u32) -> ResidueRing {
        ResidueRing::new(self.extractor.prime(), level)
    }

    /// `toResidue(level)(x)`.
    pub fn apply(&self, level: u32, x: &R::Element) -> Result<Residue, KernelError> {
        Ok(self.extractor.appr(x, level)?.to_residue())
    }

    /// `toResidue(1)` computed from `residue_mod_p` alone.
    pub fn to_zmod(&self, x: &R::Element) -> Result<Residue, KernelError> {
        self.extractor.to_zmod(x)
    }

    /// `x ∈ ker toResidue(level)`, decided through the digits.
    pub fn in_kernel(&self, level: u32, x: &R::Element) -> Result<bool, KernelError> {
        Ok(self.apply(level, x)?.is_zero())
    }

    /// `x ∈ (p^level)`, decided through the valuation primitive.
    pub fn in_ideal(&self, level: u32, x: &R::Element) -> Result<bool, KernelError> {
        self.ring().in_ideal(x, level)
    }

    /// Whether `a` and `b` have the same image under every `toResidue(k)`,
    /// `k ≤ level`.
    ///
    /// Only the top level is compared: the projections are compatible, so
    /// agreement at `level` forces agreement below it.
    pub fn agree_up_to(
        &self,
        a: &R::Element,
        b: &R::Element,
        level: u32,
    ) -> Result<bool, KernelError> {
        Ok(self.apply(level, a)? == self.apply(level, b)?)
    }
}

impl<R: CompleteRing> CompatibleFamily for ToResidue<R> {
    type Source = R;

    fn prime(&self) -> Prime {
        self.extractor.prime()
    }

    fn source(&self) -> &R {
        self.ring()
    }

    fn apply(&self, level: u32, r: &R::Element) -> Result<Residue, KernelError> {
        ToResidue::apply(self, level, r)
    }
}
