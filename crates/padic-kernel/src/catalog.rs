//! Named families over `ℤ_(p)`, for the gate and the CLI.
//!
//! - **reduction**: `a/b ↦ a · b⁻¹ mod p^n`. The canonical family.
//! - **appr**: `toResidue(n)` on `ℤ_(p)`, through digit extraction. Equal
//!   to `reduction` level by level; the two are computed independently.
//! - **square**: `r ↦ r² mod p^n`. Compatible and multiplicative, but
//!   neither additive nor injective on kernels, so homomorphism and kernel
//!   checks reject it.
//! - **drift**: `r ↦ r + p^(n-1) mod p^n`. Every level is a shifted
//!   reduction and no two consecutive levels agree, so compatibility,
//!   Cauchy and universal checks reject it.

use crate::error::KernelError;
use crate::family::{CompatibleFamily, FnFamily, RationalReduction};
use crate::prime::Prime;
use crate::projection::ToResidue;
use crate::rational::{Fraction, LocalRationals};
use crate::residue::{Residue, ResidueRing, signed};
use crate::ring::{CompleteRing, Ring};
use std::sync::Arc;

/// A shared family with `ℤ_(p)` as source.
pub type RationalFamily = Arc<dyn CompatibleFamily<Source = LocalRationals>>;

pub const FAMILY_NAMES: [&str; 4] = ["reduction", "appr", "square", "drift"];

/// Look a family up by name.
pub fn get_family(name: &str, prime: Prime) -> Option<RationalFamily> {
    let rationals = LocalRationals::new(prime);
    match name {
        "reduction" | "rational" => Some(Arc::new(RationalReduction::new(prime))),
        "appr" => Some(Arc::new(ToResidue::new(rationals))),
        "square" => Some(Arc::new(FnFamily::new(
            prime,
            rationals,
            move |n: u32, r: &Fraction| rationals.reduce_mod(&rationals.mul(r, r), n),
        ))),
        "drift" => Some(Arc::new(FnFamily::new(
            prime,
            rationals,
            move |n: u32, r: &Fraction| drift(rationals, n, r),
        ))),
        _ => None,
    }
}

/// Like [`get_family`], failing with `UnknownFamily`.
pub fn require_family(name: &str, prime: Prime) -> Result<RationalFamily, KernelError> {
    get_family(name, prime).ok_or_else(|| KernelError::UnknownFamily(name.to_string()))
}

fn drift(
    rationals: LocalRationals,
    n: u32,
    r: &Fraction,
) -> Result<Residue, KernelError> {
    let exact = rationals.reduce_mod(r, n)?;
    let Some(below) = n.checked_sub(1) else {
        return Ok(exact);
    };
    let target = ResidueRing::new(rationals.prime(), n);
    let shift = target.from_int(&signed(&rationals.prime().pow(below)));
    Ok(target.add(&exact, &shift))
}
