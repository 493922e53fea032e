//! The tower law gate.
//!
//! Given a family `f_n : ℤ_(p) → ℤ/p^n` and a [`LawCheck`], the gate decides
//! whether the family (and the digit extractor underneath it) obeys the
//! named law at the submitted values:
//!
//! - TOWER-1 compatibility: `project(n ← n+1) ∘ f(n+1) = f(n)`
//! - TOWER-2 Cauchy: `p^i | nthHom(r)(j) − nthHom(r)(i)`
//! - TOWER-3 homomorphism: `f(n)(1) = 1`, `f(n)` additive and multiplicative
//! - TOWER-4 digits: `appr` is bounded, stable and `x − appr(x, n) ∈ (p^n)`
//! - TOWER-5 kernel: `ker f(n) = ker toResidue(n) = (p^n)`
//! - TOWER-6 universal: `toResidue(n) ∘ lift(f) = f(n)`
//!
//! Only the first failure per law is reported. A value the source ring
//! rejects is itself a failure of the law being checked. Levels above
//! [`MAX_PRECISION`] are refused with `PrecisionExceeded`.

use crate::catalog::require_family;
use crate::digits::DigitExtractor;
use crate::error::{KernelError, Law, Violation};
use crate::family::{CompatibleFamily, NthHom};
use crate::lift::Lift;
use crate::prime::Prime;
use crate::projection::ToResidue;
use crate::rational::{Fraction, LocalRationals};
use crate::ring::CompleteRing;
use crate::witness::{GateFailure, GateResult, classify};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Highest level (`upto` or `level`) a law check may ask for.
pub const MAX_PRECISION: u32 = 64;

/// A single law check. Values are p-integral rationals written `"a"` or
/// `"a/b"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LawCheck {
    Compatibility {
        value: String,
        upto: u32,
        #[serde(default, rename = "tokenPath")]
        token_path: Option<String>,
    },
    Cauchy {
        value: String,
        upto: u32,
        #[serde(default, rename = "tokenPath")]
        token_path: Option<String>,
    },
    Homomorphism {
        lhs: String,
        rhs: String,
        upto: u32,
        #[serde(default, rename = "tokenPath")]
        token_path: Option<String>,
    },
    Digits {
        value: String,
        upto: u32,
        #[serde(default, rename = "tokenPath")]
        token_path: Option<String>,
    },
    Kernel {
        value: String,
        level: u32,
        #[serde(default, rename = "tokenPath")]
        token_path: Option<String>,
    },
    Universal {
        value: String,
        upto: u32,
        #[serde(default, rename = "tokenPath")]
        token_path: Option<String>,
    },
}

impl LawCheck {
    /// The law a failure of this check is filed under.
    pub fn law(&self) -> Law {
        match self {
            LawCheck::Compatibility { .. } => Law::Compatibility,
            LawCheck::Cauchy { .. } => Law::Cauchy,
            LawCheck::Homomorphism { .. } => Law::Homomorphism,
            LawCheck::Digits { .. } => Law::DigitStability,
            LawCheck::Kernel { .. } => Law::Kernel,
            LawCheck::Universal { .. } => Law::UniversalProperty,
        }
    }

    /// The highest level the check evaluates.
    pub fn precision(&self) -> u32 {
        match self {
            LawCheck::Compatibility { upto, .. }
            | LawCheck::Cauchy { upto, .. }
            | LawCheck::Homomorphism { upto, .. }
            | LawCheck::Digits { upto, .. }
            | LawCheck::Universal { upto, .. } => *upto,
            LawCheck::Kernel { level, .. } => *level,
        }
    }

    /// `PrecisionExceeded` when the check asks for more than
    /// [`MAX_PRECISION`].
    pub fn check_precision(&self) -> Result<(), KernelError> {
        let requested = self.precision();
        if requested > MAX_PRECISION {
            return Err(KernelError::PrecisionExceeded {
                requested,
                working: MAX_PRECISION,
            });
        }
        Ok(())
    }

    pub fn token_path(&self) -> Option<&str> {
        match self {
            LawCheck::Compatibility { token_path, .. }
            | LawCheck::Cauchy { token_path, .. }
            | LawCheck::Homomorphism { token_path, .. }
            | LawCheck::Digits { token_path, .. }
            | LawCheck::Kernel { token_path, .. }
            | LawCheck::Universal { token_path, .. } => token_path.as_deref(),
        }
    }
}

/// A self-contained gate input: which family, over which prime, checked
/// against which law.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateCase {
    pub prime: Prime,
    pub family: String,
    pub check: LawCheck,
}

/// Resolve the case's family by name and run its check.
pub fn run_case(case: &GateCase, profile: &str) -> Result<GateResult, KernelError> {
    case.check.check_precision()?;
    let family = require_family(&case.family, case.prime)?;
    Ok(run_law_check(&family, &case.check, profile))
}

/// Run one law check against a family on `ℤ_(p)`.
///
/// A check above [`MAX_PRECISION`] is recorded as a failure of its law
/// without being evaluated.
pub fn run_law_check<F>(family: &F, check: &LawCheck, profile: &str) -> GateResult
where
    F: CompatibleFamily<Source = LocalRationals> + Clone + 'static,
{
    let token_path = check.token_path().map(String::from);
    let outcome = check.check_precision().and_then(|()| match check {
        LawCheck::Compatibility { value, upto, .. } => parse(family, value)
            .and_then(|x| NthHom::new(family.clone()).compatibility_violations(&x, *upto)),
        LawCheck::Cauchy { value, upto, .. } => parse(family, value)
            .and_then(|x| NthHom::new(family.clone()).cauchy_violations(&x, *upto)),
        LawCheck::Homomorphism { lhs, rhs, upto, .. } => parse(family, lhs)
            .and_then(|r| Ok((r, parse(family, rhs)?)))
            .and_then(|(r, s)| {
                NthHom::new(family.clone()).homomorphism_violations(&r, &s, *upto)
            }),
        LawCheck::Digits { value, upto, .. } => parse(family, value)
            .and_then(|x| digit_violations(*family.source(), &x, *upto)),
        LawCheck::Kernel { value, level, .. } => {
            parse(family, value).and_then(|x| kernel_violations(family, &x, *level))
        }
        LawCheck::Universal { value, upto, .. } => {
            parse(family, value).and_then(|x| universal_violations(family, &x, *upto))
        }
    });

    let failures = match outcome {
        Ok(violations) => violations
            .into_iter()
            .take(1)
            .map(|v| GateFailure::from_violation(&v, token_path.clone()))
            .collect(),
        Err(err) => {
            let (class, law_ref) = classify(check.law());
            vec![GateFailure::new(class, law_ref, err.to_string(), token_path, None)]
        }
    };
    let result = GateResult::from_failures(profile, failures);
    debug!(law = ?check.law(), accepted = result.is_accepted(), "law check");
    result
}

fn parse<F>(family: &F, value: &str) -> Result<Fraction, KernelError>
where
    F: CompatibleFamily<Source = LocalRationals>,
{
    family.source().parse(value)
}

fn digit_violations<R: CompleteRing>(
    ring: R,
    x: &R::Element,
    upto: u32,
) -> Result<Vec<Violation>, KernelError> {
    let prime = ring.prime();
    let extractor = DigitExtractor::new(ring);
    let tower = extractor.tower(x, upto)?;
    let mut violations = Vec::new();
    for (n, approx) in tower.iter().enumerate() {
        let n = n as u32;
        if approx.value() >= &prime.pow(n) {
            violations.push(Violation::error(
                Law::Bound,
                Some(n),
                format!("appr(x, {n}) = {} is not below p^{n}", approx.value()),
            ));
        }
        if n > 0 && !approx.refines(&tower[n as usize - 1]) {
            violations.push(Violation::error(
                Law::DigitStability,
                Some(n),
                format!("appr(x, {n}) does not extend appr(x, {})", n - 1),
            ));
        }
        if !extractor.appr_spec(x, n)? {
            violations.push(Violation::error(
                Law::Density,
                Some(n),
                format!("x - appr(x, {n}) is not in (p^{n})"),
            ));
        }
    }
    Ok(violations)
}

fn kernel_violations<F>(
    family: &F,
    x: &Fraction,
    level: u32,
) -> Result<Vec<Violation>, KernelError>
where
    F: CompatibleFamily<Source = LocalRationals> + Clone,
{
    let rationals = *family.source();
    let in_ideal = rationals.in_ideal(x, level)?;
    let projection = ToResidue::new(rationals);
    let mut violations = Vec::new();
    if projection.in_kernel(level, x)? != in_ideal {
        violations.push(Violation::error(
            Law::Kernel,
            Some(level),
            format!("toResidue({level})(x) = 0 disagrees with x in (p^{level}) = {in_ideal}"),
        ));
    }
    let image = NthHom::new(family.clone()).residue(x, level)?;
    if image.is_zero() != in_ideal {
        violations.push(Violation::error(
            Law::Kernel,
            Some(level),
            format!("f({level})(x) = {image}, but x in (p^{level}) is {in_ideal}"),
        ));
    }
    Ok(violations)
}

fn universal_violations<F>(
    family: &F,
    x: &Fraction,
    upto: u32,
) -> Result<Vec<Violation>, KernelError>
where
    F: CompatibleFamily<Source = LocalRationals> + Clone + 'static,
{
    let lift = Lift::new(family.clone(), upto);
    match lift.check_universal(x, upto) {
        Ok(()) => Ok(Vec::new()),
        Err(KernelError::IncompatibleFamily {
            lower, description, ..
        }) => Ok(vec![Violation::error(
            Law::UniversalProperty,
            Some(lower),
            description,
        )]),
        Err(err) => Err(err),
    }
}
