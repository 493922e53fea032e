//! # Padic Kernel
//!
//! Finite-precision towers for complete, discretely valued rings: every
//! element `x` of `ℤ_p` is read as the compatible sequence of its residues
//! `x mod p^n`, and every compatible family of residue maps is read back as
//! a unique ring homomorphism into `ℤ_p`.
//!
//! The ring arithmetic itself is consumed through traits. The kernel only
//! adds the tower structure on top.
//!
//! ## Architecture
//!
//! ```text
//! Prime                  ← validated at construction, injected everywhere
//!     │
//! Ring / CompleteRing    ← consumed primitives (zero test, u·p^v, mod p)
//!     │
//! ResidueRing            ← R_n = ℤ/p^n, explicit project: R_n → R_m
//!     │
//! DigitExtractor         ← appr(x, n) ∈ [0, p^n), one digit per level
//!     │
//! ToResidue              ← toResidue(n) = appr(·, n) as a ring hom
//!     │
//! NthHom                 ← compatible family ↦ Cauchy integer sequences
//!     │
//! Lift                   ← lim nthHom: the universal hom S → ℤ_p
//! ```
//!
//! [`gate`] checks the tower laws for named families and reports failures
//! as deterministic [`witness`] records.

pub mod catalog;
pub mod digits;
pub mod error;
pub mod family;
pub mod gate;
pub mod lift;
pub mod padic;
pub mod prime;
pub mod projection;
pub mod rational;
pub mod residue;
pub mod ring;
pub mod witness;

pub use digits::{Approximation, DigitExtractor};
pub use error::{KernelError, Law, Violation};
pub use family::{
    CompatibleFamily, FnFamily, IntegerReduction, NthHom, RationalReduction, padic_equivalent,
};
pub use gate::{GateCase, LawCheck, run_case, run_law_check};
pub use lift::Lift;
pub use padic::{PadicInt, PadicIntegers};
pub use prime::Prime;
pub use projection::ToResidue;
pub use rational::{Fraction, LocalRationals};
pub use residue::{Residue, ResidueRing};
pub use ring::{CompleteRing, Integers, Ring};
pub use witness::{GateFailure, GateResult, Verdict};
