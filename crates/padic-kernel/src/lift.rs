//! The universal lift `lift(f) : S → ℤ_p`.
//!
//! `lift(f)(r)` is the limit of `nthHom(r)`, packaged as a lazy
//! [`PadicInt`]: its level-`k` residue is read off `f(modulus(k))(r)` when
//! first demanded, after the tail bound is checked. Nothing is evaluated at
//! construction.
//!
//! The lift is a ring homomorphism and satisfies
//! `toResidue(n) ∘ lift(f) = f(n)`; any other map with that property agrees
//! with it at every level.

use crate::error::KernelError;
use crate::family::{CompatibleFamily, NthHom};
use crate::padic::{PadicInt, PadicIntegers};
use crate::prime::Prime;
use crate::projection::ToResidue;
use crate::residue::{Residue, signed};
use crate::ring::{CompleteRing, Ring};
use std::sync::Arc;
use tracing::debug;

/// `lift(f)` for a compatible family `f`, landing in `ℤ_p` at a fixed
/// working precision.
#[derive(Debug)]
pub struct Lift<F> {
    reducer: Arc<NthHom<F>>,
    target: PadicIntegers,
}

impl<F> Clone for Lift<F> {
    fn clone(&self) -> Self {
        Self {
            reducer: Arc::clone(&self.reducer),
            target: self.target,
        }
    }
}

impl<F: CompatibleFamily + 'static> Lift<F> {
    pub fn new(family: F, working_precision: u32) -> Self {
        let target = PadicIntegers::new(family.prime(), working_precision);
        Self {
            reducer: Arc::new(NthHom::new(family)),
            target,
        }
    }

    pub fn prime(&self) -> Prime {
        self.target.prime()
    }

    pub fn target(&self) -> &PadicIntegers {
        &self.target
    }

    pub fn reducer(&self) -> &NthHom<F> {
        &self.reducer
    }

    /// `lift(f)(r)`, accurate to `p^k`.
    pub fn approx(
        &self,
        r: &<F::Source as Ring>::Element,
        k: u32,
    ) -> Result<Residue, KernelError> {
        self.reducer.limit(r, k)
    }

    /// `lift(f)(r)` as a lazy p-adic integer.
    pub fn apply(&self, r: &<F::Source as Ring>::Element) -> PadicInt {
        let reducer = Arc::clone(&self.reducer);
        let r = r.clone();
        debug!(element = ?r, "lifting");
        PadicInt::from_tower(self.prime(), move |k| {
            reducer.limit(&r, k).map(Residue::into_value)
        })
    }

    /// `toResidue(n)(lift(f)(r)) = f(n)(r)` for `n ≤ upto`.
    ///
    /// Reported as `IncompatibleFamily` at the first level where the two
    /// sides differ.
    pub fn check_universal(
        &self,
        r: &<F::Source as Ring>::Element,
        upto: u32,
    ) -> Result<(), KernelError> {
        let projection = ToResidue::new(self.target);
        let lifted = self.apply(r);
        for n in 0..=upto {
            let through_lift = projection.apply(n, &lifted)?;
            let direct = self.reducer.residue(r, n)?;
            if through_lift != direct {
                return Err(KernelError::IncompatibleFamily {
                    lower: n,
                    upper: n,
                    description: format!(
                        "toResidue({n})(lift(r)) = {through_lift}, but f({n})(r) = {direct}"
                    ),
                });
            }
        }
        Ok(())
    }

    /// Whether `candidate` satisfies `toResidue(n)(candidate) = f(n)(r)` for
    /// every `n ≤ upto`.
    pub fn is_lift_of(
        &self,
        candidate: &PadicInt,
        r: &<F::Source as Ring>::Element,
        upto: u32,
    ) -> Result<bool, KernelError> {
        self.target.check(candidate)?;
        let projection = ToResidue::new(self.target);
        for n in 0..=upto {
            if projection.apply(n, candidate)? != self.reducer.residue(r, n)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Whether `candidate` agrees with `lift(f)(r)` at every level up to
    /// `upto`.
    pub fn agrees_with(
        &self,
        candidate: &PadicInt,
        r: &<F::Source as Ring>::Element,
        upto: u32,
    ) -> Result<bool, KernelError> {
        self.target.eq_up_to(candidate, &self.apply(r), upto)
    }

    /// `lift(f)(r) − value(f(n)(r)) ∈ (p^n)`.
    pub fn lift_sub_val_mem_span(
        &self,
        r: &<F::Source as Ring>::Element,
        n: u32,
    ) -> Result<bool, KernelError> {
        let value = self.reducer.residue(r, n)?;
        let residual = self.target.sub(
            &self.apply(r),
            &self.target.from_int(&signed(value.value())),
        );
        self.target.in_ideal(&residual, n)
    }
}
