//! Compatible families `f_n : S → ℤ/p^n` and the reducer `nthHom`.
//!
//! A family is compatible when `project(m ← n) ∘ f(n) = f(m)` for all
//! `m ≤ n`. Compatibility is the caller's obligation: the trait cannot
//! enforce it, so the reducer checks it wherever it observes a level pair
//! and reports breaches as [`KernelError::IncompatibleFamily`] or as
//! [`Violation`] records.
//!
//! ```text
//! nthHom(r)(n) = value(f(n)(r)) ∈ [0, p^n)
//! compatible ⇒ p^i | nthHom(r)(j) − nthHom(r)(i)   for i ≤ j
//! ```

use crate::error::{KernelError, Law, Violation};
use crate::prime::Prime;
use crate::rational::{Fraction, LocalRationals};
use crate::residue::{Residue, ResidueRing, reduce, signed};
use crate::ring::{CompleteRing, Integers, Ring};
use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A family of ring homomorphisms `f(n) : Source → R_n`, one per level.
pub trait CompatibleFamily: Send + Sync {
    type Source: Ring;

    fn prime(&self) -> Prime;

    fn source(&self) -> &Self::Source;

    /// `f(level)(r)`.
    fn apply(
        &self,
        level: u32,
        r: &<Self::Source as Ring>::Element,
    ) -> Result<Residue, KernelError>;
}

impl<F: CompatibleFamily + ?Sized> CompatibleFamily for Arc<F> {
    type Source = F::Source;

    fn prime(&self) -> Prime {
        (**self).prime()
    }

    fn source(&self) -> &F::Source {
        (**self).source()
    }

    fn apply(
        &self,
        level: u32,
        r: &<F::Source as Ring>::Element,
    ) -> Result<Residue, KernelError> {
        (**self).apply(level, r)
    }
}

/// `ℤ → R_n`, `r ↦ r mod p^n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerReduction {
    prime: Prime,
    integers: Integers,
}

impl IntegerReduction {
    pub fn new(prime: Prime) -> Self {
        Self {
            prime,
            integers: Integers,
        }
    }
}

impl CompatibleFamily for IntegerReduction {
    type Source = Integers;

    fn prime(&self) -> Prime {
        self.prime
    }

    fn source(&self) -> &Integers {
        &self.integers
    }

    fn apply(&self, level: u32, r: &BigInt) -> Result<Residue, KernelError> {
        Ok(ResidueRing::new(self.prime, level).from_int(r))
    }
}

/// `ℤ_(p) → R_n`, `a/b ↦ a · b⁻¹ mod p^n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RationalReduction {
    rationals: LocalRationals,
}

impl RationalReduction {
    pub fn new(prime: Prime) -> Self {
        Self {
            rationals: LocalRationals::new(prime),
        }
    }
}

impl CompatibleFamily for RationalReduction {
    type Source = LocalRationals;

    fn prime(&self) -> Prime {
        self.rationals.prime()
    }

    fn source(&self) -> &LocalRationals {
        &self.rationals
    }

    fn apply(&self, level: u32, r: &Fraction) -> Result<Residue, KernelError> {
        self.rationals.reduce_mod(r, level)
    }
}

/// A family given by a closure `(n, r) ↦ f(n)(r)`.
///
/// Nothing about the closure is trusted: outputs are checked against the
/// target ring by the reducer, and compatibility is only as good as the
/// closure.
#[derive(Clone)]
pub struct FnFamily<S, F> {
    prime: Prime,
    source: S,
    f: F,
}

impl<S, F> FnFamily<S, F>
where
    S: Ring,
    F: Fn(u32, &S::Element) -> Result<Residue, KernelError> + Send + Sync,
{
    pub fn new(prime: Prime, source: S, f: F) -> Self {
        Self { prime, source, f }
    }
}

impl<S: fmt::Debug, F> fmt::Debug for FnFamily<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFamily")
            .field("prime", &self.prime)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl<S, F> CompatibleFamily for FnFamily<S, F>
where
    S: Ring,
    F: Fn(u32, &S::Element) -> Result<Residue, KernelError> + Send + Sync,
{
    type Source = S;

    fn prime(&self) -> Prime {
        self.prime
    }

    fn source(&self) -> &S {
        &self.source
    }

    fn apply(&self, level: u32, r: &S::Element) -> Result<Residue, KernelError> {
        (self.f)(level, r)
    }
}

/// A breach of the projective law between two levels.
struct Breach {
    lower: u32,
    upper: u32,
    description: String,
}

impl Breach {
    fn into_error(self) -> KernelError {
        KernelError::IncompatibleFamily {
            lower: self.lower,
            upper: self.upper,
            description: self.description,
        }
    }

    fn into_violation(self, law: Law) -> Violation {
        Violation::error(law, Some(self.lower), self.description)
    }
}

/// `a_n ≡ b_n (mod p^n)` for every index `n` of the two sequences.
///
/// Sequences are indexed by level, starting at 0; only the common prefix is
/// compared.
pub fn padic_equivalent(prime: Prime, a: &[BigInt], b: &[BigInt]) -> bool {
    a.iter().zip(b).enumerate().all(|(n, (x, y))| {
        let modulus = signed(&prime.pow(n as u32));
        (x - y).is_multiple_of(&modulus)
    })
}

/// The reducer: a compatible family as integer sequences.
#[derive(Debug, Clone)]
pub struct NthHom<F> {
    family: F,
}

impl<F: CompatibleFamily> NthHom<F> {
    pub fn new(family: F) -> Self {
        Self { family }
    }

    pub fn family(&self) -> &F {
        &self.family
    }

    pub fn prime(&self) -> Prime {
        self.family.prime()
    }

    /// `f(n)(r)`, checked to live in `R_n`.
    pub fn residue(
        &self,
        r: &<F::Source as Ring>::Element,
        n: u32,
    ) -> Result<Residue, KernelError> {
        let out = self.family.apply(n, r)?;
        ResidueRing::new(self.prime(), n).check(&out)?;
        Ok(out)
    }

    /// `nthHom(r)(n)`.
    pub fn nth(&self, r: &<F::Source as Ring>::Element, n: u32) -> Result<BigInt, KernelError> {
        Ok(signed(self.residue(r, n)?.value()))
    }

    /// `nthHom(r)(0), …, nthHom(r)(upto)`.
    pub fn seq(
        &self,
        r: &<F::Source as Ring>::Element,
        upto: u32,
    ) -> Result<Vec<BigInt>, KernelError> {
        (0..=upto).map(|n| self.nth(r, n)).collect()
    }

    /// The Cauchy modulus of `nthHom(r)`: terms from index `modulus(k)` on
    /// agree mod `p^k`. For a compatible family this is `k` itself.
    pub fn modulus(&self, k: u32) -> u32 {
        k
    }

    /// `f(k)(r)` with the tail bound verified against level `k - 1`.
    ///
    /// This is the limit of `nthHom(r)` at precision `k`, and the only
    /// place the lift reads the family.
    pub fn limit(
        &self,
        r: &<F::Source as Ring>::Element,
        k: u32,
    ) -> Result<Residue, KernelError> {
        let n = self.modulus(k);
        let top = self.residue(r, n)?;
        if n > 0 {
            let below = self.residue(r, n - 1)?;
            if top.project(n - 1)? != below {
                return Err(KernelError::IncompatibleFamily {
                    lower: n - 1,
                    upper: n,
                    description: format!(
                        "f({n})(r) = {top} does not restrict to f({})(r) = {below}",
                        n - 1
                    ),
                });
            }
        }
        debug!(precision = k, index = n, value = %top.value(), "limit term");
        top.project(k)
    }

    /// `project(n ← n+1) ∘ f(n+1) = f(n)` at `r`, for `n < upto`.
    pub fn check_compatible(
        &self,
        r: &<F::Source as Ring>::Element,
        upto: u32,
    ) -> Result<(), KernelError> {
        match self.compatibility_breaches(r, upto)?.into_iter().next() {
            Some(breach) => Err(breach.into_error()),
            None => Ok(()),
        }
    }

    /// `p^i | nthHom(r)(j) − nthHom(r)(i)` for all `i ≤ j ≤ upto`.
    pub fn check_cauchy(
        &self,
        r: &<F::Source as Ring>::Element,
        upto: u32,
    ) -> Result<(), KernelError> {
        match self.cauchy_breaches(r, upto)?.into_iter().next() {
            Some(breach) => Err(breach.into_error()),
            None => Ok(()),
        }
    }

    pub fn compatibility_violations(
        &self,
        r: &<F::Source as Ring>::Element,
        upto: u32,
    ) -> Result<Vec<Violation>, KernelError> {
        Ok(self
            .compatibility_breaches(r, upto)?
            .into_iter()
            .map(|b| b.into_violation(Law::Compatibility))
            .collect())
    }

    pub fn cauchy_violations(
        &self,
        r: &<F::Source as Ring>::Element,
        upto: u32,
    ) -> Result<Vec<Violation>, KernelError> {
        Ok(self
            .cauchy_breaches(r, upto)?
            .into_iter()
            .map(|b| b.into_violation(Law::Cauchy))
            .collect())
    }

    /// Levelwise homomorphism laws at `r`, `s`: `f(n)(1) = 1`,
    /// `f(n)(r + s) = f(n)(r) + f(n)(s)` and `f(n)(r · s) = f(n)(r) · f(n)(s)`
    /// for `n ≤ upto`.
    pub fn homomorphism_violations(
        &self,
        r: &<F::Source as Ring>::Element,
        s: &<F::Source as Ring>::Element,
        upto: u32,
    ) -> Result<Vec<Violation>, KernelError> {
        let source = self.family.source();
        let sum = source.add(r, s);
        let product = source.mul(r, s);
        let one = source.one();
        let mut violations = Vec::new();
        for n in 0..=upto {
            let target = ResidueRing::new(self.prime(), n);
            let (fr, fs) = (self.residue(r, n)?, self.residue(s, n)?);

            let f_one = self.residue(&one, n)?;
            if f_one != target.one() {
                violations.push(Violation::error(
                    Law::Homomorphism,
                    Some(n),
                    format!("f({n})(1) = {f_one}"),
                ));
            }
            let f_sum = self.residue(&sum, n)?;
            let expected = target.add(&fr, &fs);
            if f_sum != expected {
                violations.push(Violation::error(
                    Law::Homomorphism,
                    Some(n),
                    format!("f({n})(r + s) = {f_sum}, expected {expected}"),
                ));
            }
            let f_product = self.residue(&product, n)?;
            let expected = target.mul(&fr, &fs);
            if f_product != expected {
                violations.push(Violation::error(
                    Law::Homomorphism,
                    Some(n),
                    format!("f({n})(r * s) = {f_product}, expected {expected}"),
                ));
            }
        }
        Ok(violations)
    }

    /// `nthHom(r + s) ≈ nthHom(r) + nthHom(s)` up to `upto`.
    pub fn add_equivalent(
        &self,
        r: &<F::Source as Ring>::Element,
        s: &<F::Source as Ring>::Element,
        upto: u32,
    ) -> Result<bool, KernelError> {
        let sum = self.seq(&self.family.source().add(r, s), upto)?;
        let termwise: Vec<BigInt> = self
            .seq(r, upto)?
            .into_iter()
            .zip(self.seq(s, upto)?)
            .map(|(a, b)| a + b)
            .collect();
        Ok(padic_equivalent(self.prime(), &sum, &termwise))
    }

    /// `nthHom(r · s) ≈ nthHom(r) · nthHom(s)` up to `upto`.
    pub fn mul_equivalent(
        &self,
        r: &<F::Source as Ring>::Element,
        s: &<F::Source as Ring>::Element,
        upto: u32,
    ) -> Result<bool, KernelError> {
        let product = self.seq(&self.family.source().mul(r, s), upto)?;
        let termwise: Vec<BigInt> = self
            .seq(r, upto)?
            .into_iter()
            .zip(self.seq(s, upto)?)
            .map(|(a, b)| a * b)
            .collect();
        Ok(padic_equivalent(self.prime(), &product, &termwise))
    }

    /// `nthHom(1) ≈ 1` up to `upto`.
    pub fn one_equivalent(&self, upto: u32) -> Result<bool, KernelError> {
        let ones = vec![BigInt::from(1); upto as usize + 1];
        Ok(padic_equivalent(
            self.prime(),
            &self.seq(&self.family.source().one(), upto)?,
            &ones,
        ))
    }

    fn compatibility_breaches(
        &self,
        r: &<F::Source as Ring>::Element,
        upto: u32,
    ) -> Result<Vec<Breach>, KernelError> {
        let mut breaches = Vec::new();
        let mut below = self.residue(r, 0)?;
        for n in 1..=upto {
            let here = self.residue(r, n)?;
            let restricted = here.project(n - 1)?;
            if restricted != below {
                breaches.push(Breach {
                    lower: n - 1,
                    upper: n,
                    description: format!(
                        "f({n})(r) = {here} restricts to {restricted}, but f({})(r) = {below}",
                        n - 1
                    ),
                });
            }
            below = here;
        }
        Ok(breaches)
    }

    fn cauchy_breaches(
        &self,
        r: &<F::Source as Ring>::Element,
        upto: u32,
    ) -> Result<Vec<Breach>, KernelError> {
        let terms = self.seq(r, upto)?;
        let mut breaches = Vec::new();
        for (i, a_i) in terms.iter().enumerate() {
            let modulus = self.prime().pow(i as u32);
            for (j, a_j) in terms.iter().enumerate().skip(i + 1) {
                if reduce(&(a_j - a_i), &modulus) != BigUint::ZERO {
                    breaches.push(Breach {
                        lower: i as u32,
                        upper: j as u32,
                        description: format!(
                            "{}^{i} does not divide a_{j} - a_{i} = {}",
                            self.prime(),
                            a_j - a_i
                        ),
                    });
                }
            }
        }
        Ok(breaches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(n: u64) -> Prime {
        Prime::new(n).unwrap()
    }

    fn ints(xs: &[i64]) -> Vec<BigInt> {
        xs.iter().copied().map(BigInt::from).collect()
    }

    #[test]
    fn integer_reduction_sequence() {
        let h = NthHom::new(IntegerReduction::new(p(2)));
        assert_eq!(h.seq(&BigInt::from(11), 4).unwrap(), ints(&[0, 1, 3, 3, 11]));
        assert_eq!(h.seq(&BigInt::from(-1), 3).unwrap(), ints(&[0, 1, 3, 7]));
        h.check_compatible(&BigInt::from(-1), 6).unwrap();
        h.check_cauchy(&BigInt::from(-1), 6).unwrap();
    }

    #[test]
    fn five_and_seven_in_z3() {
        let h = NthHom::new(IntegerReduction::new(p(3)));
        let (r, s) = (BigInt::from(5), BigInt::from(7));
        assert_eq!(h.seq(&r, 3).unwrap(), ints(&[0, 2, 5, 5]));
        assert_eq!(h.seq(&s, 3).unwrap(), ints(&[0, 1, 7, 7]));
        // r + s = 12: 0, 3, 12
        assert_eq!(h.seq(&BigInt::from(12), 3).unwrap(), ints(&[0, 0, 3, 12]));
        // r * s = 35: 2, 8, 8
        assert_eq!(h.seq(&BigInt::from(35), 3).unwrap(), ints(&[0, 2, 8, 8]));
        assert!(h.add_equivalent(&r, &s, 3).unwrap());
        assert!(h.mul_equivalent(&r, &s, 3).unwrap());
        assert!(h.one_equivalent(3).unwrap());
        assert!(h.homomorphism_violations(&r, &s, 3).unwrap().is_empty());
    }

    #[test]
    fn rational_reduction_is_cauchy() {
        let h = NthHom::new(RationalReduction::new(p(5)));
        let q = LocalRationals::new(p(5));
        let x = q.fraction(2, 7).unwrap();
        h.check_compatible(&x, 8).unwrap();
        h.check_cauchy(&x, 8).unwrap();
        assert!(h.cauchy_violations(&x, 8).unwrap().is_empty());
    }

    #[test]
    fn equivalence_is_levelwise() {
        let two = p(2);
        assert!(padic_equivalent(two, &ints(&[5, 1, 3]), &ints(&[0, 3, 7])));
        assert!(!padic_equivalent(two, &ints(&[0, 1, 3]), &ints(&[0, 1, 1])));
    }

    #[test]
    fn drifting_family_is_reported() {
        // adds p^(n-1) at every level, so no two consecutive levels agree
        let prime = p(3);
        let drift = FnFamily::new(prime, Integers, move |n: u32, r: &BigInt| {
            let target = ResidueRing::new(prime, n);
            let shift = match n {
                0 => BigInt::ZERO,
                _ => signed(&prime.pow(n - 1)),
            };
            Ok(target.from_int(&(r + shift)))
        });
        let h = NthHom::new(drift);
        let r = BigInt::from(4);
        assert!(matches!(
            h.check_compatible(&r, 3),
            Err(KernelError::IncompatibleFamily { lower: 1, upper: 2, .. })
        ));
        assert!(h.check_cauchy(&r, 3).is_err());
        let violations = h.compatibility_violations(&r, 3).unwrap();
        assert_eq!(violations.len(), 2);
        assert!(violations.iter().all(|v| v.law == Law::Compatibility));
        assert!(matches!(
            h.limit(&r, 2),
            Err(KernelError::IncompatibleFamily { lower: 1, upper: 2, .. })
        ));
    }

    #[test]
    fn out_of_ring_output_is_rejected() {
        let prime = p(2);
        let wrong_level = FnFamily::new(prime, Integers, move |n: u32, r: &BigInt| {
            Ok(ResidueRing::new(prime, n + 1).from_int(r))
        });
        let h = NthHom::new(wrong_level);
        assert_eq!(
            h.nth(&BigInt::from(1), 2),
            Err(KernelError::LevelMismatch {
                expected: 2,
                actual: 3
            })
        );
    }

    #[test]
    fn squaring_is_compatible_but_not_additive() {
        let prime = p(5);
        let square = FnFamily::new(prime, Integers, move |n: u32, r: &BigInt| {
            Ok(ResidueRing::new(prime, n).from_int(&(r * r)))
        });
        let h = NthHom::new(square);
        let (r, s) = (BigInt::from(2), BigInt::from(3));
        h.check_compatible(&r, 4).unwrap();
        assert!(!h.add_equivalent(&r, &s, 2).unwrap());
        let violations = h.homomorphism_violations(&r, &s, 1).unwrap();
        // level 1: f(5) = 0 but f(2) + f(3) = 4 + 4 = 3 mod 5, while
        // f(6) = 36 = 1 = f(2) * f(3) mod 5
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].level, Some(1));
    }
}
