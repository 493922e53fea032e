//! The fixed prime p.
//!
//! Every object in the kernel is built over one prime: residue rings, the
//! complete ring, extractors and lifts. The prime is validated once at
//! construction and then carried by value, so two objects over different
//! primes can be detected and rejected instead of silently mixed.

use crate::error::KernelError;
use num_bigint::BigUint;
use num_traits::One;
use serde::{Deserialize, Serialize};

/// A validated prime, immutable for the lifetime of whatever captures it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u64", into = "u64")]
pub struct Prime(u64);

impl Prime {
    /// Validate `p` and wrap it.
    pub fn new(p: u64) -> Result<Self, KernelError> {
        if is_prime(p) {
            Ok(Self(p))
        } else {
            Err(KernelError::NotPrime(p))
        }
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn to_biguint(self) -> BigUint {
        BigUint::from(self.0)
    }

    /// `p^n` as a natural number.
    pub fn pow(self, n: u32) -> BigUint {
        if n == 0 {
            return BigUint::one();
        }
        self.to_biguint().pow(n)
    }

    /// Number of times `p` divides `value`. `None` for zero.
    pub fn multiplicity(self, value: &BigUint) -> Option<u32> {
        if value == &BigUint::ZERO {
            return None;
        }
        let p = self.to_biguint();
        let mut rest = value.clone();
        let mut count = 0;
        while &rest % &p == BigUint::ZERO {
            rest /= &p;
            count += 1;
        }
        Some(count)
    }

    /// Fail with `PrimeMismatch` unless `other` is the same prime.
    pub fn ensure_same(self, other: Prime) -> Result<(), KernelError> {
        if self == other {
            Ok(())
        } else {
            Err(KernelError::PrimeMismatch {
                expected: self,
                actual: other,
            })
        }
    }
}

impl TryFrom<u64> for Prime {
    type Error = KernelError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Prime> for u64 {
    fn from(p: Prime) -> Self {
        p.0
    }
}

impl std::fmt::Display for Prime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Prime {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u64 = s
            .trim()
            .parse()
            .map_err(|_| KernelError::Parse(format!("not an unsigned integer: {s}")))?;
        Self::new(value)
    }
}

/// Deterministic Miller-Rabin for the full `u64` range.
fn is_prime(n: u64) -> bool {
    const WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

    if n < 2 {
        return false;
    }
    for &w in &WITNESSES {
        if n % w == 0 {
            return n == w;
        }
    }

    let mut d = n - 1;
    let mut s = 0;
    while d % 2 == 0 {
        d /= 2;
        s += 1;
    }

    'witness: for &a in &WITNESSES {
        let mut x = pow_mod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
    ((a as u128 * b as u128) % m as u128) as u64
}

fn pow_mod(mut base: u64, mut exp: u64, m: u64) -> u64 {
    let mut acc = 1u64;
    base %= m;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = mul_mod(acc, base, m);
        }
        base = mul_mod(base, base, m);
        exp >>= 1;
    }
    acc
}
