//! Error types for tower kernel operations.

use crate::prime::Prime;

/// Errors arising from contract violations of the tower kernel or of the
/// ring primitives it consumes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KernelError {
    /// The configured modulus is not prime.
    #[error("not a prime: {0}")]
    NotPrime(u64),

    /// Two objects built over different primes were combined.
    #[error("prime mismatch: expected {expected}, got {actual}")]
    PrimeMismatch { expected: Prime, actual: Prime },

    /// Restriction `R_from → R_to` requested with `to > from`.
    #[error("cannot project residue from level {from} up to level {to}")]
    ProjectionLevel { from: u32, to: u32 },

    /// A residue of one level was handed to a ring of another level.
    #[error("residue level mismatch: expected {expected}, got {actual}")]
    LevelMismatch { expected: u32, actual: u32 },

    /// A two-level operation was called with its levels out of order.
    #[error("level order violation: lower level {lower} exceeds upper level {upper}")]
    LevelOrder { lower: u32, upper: u32 },

    /// A precision beyond the ring's working precision was requested.
    #[error("precision {requested} exceeds working precision {working}")]
    PrecisionExceeded { requested: u32, working: u32 },

    /// Unit/valuation decomposition was asked for the zero element.
    #[error("unit/valuation decomposition of zero")]
    ZeroDecomposition,

    /// A rational with denominator divisible by p is not p-integral.
    #[error("{value} is not {prime}-integral")]
    NotIntegral { value: String, prime: Prime },

    /// Malformed numeric input.
    #[error("invalid number: {0}")]
    Parse(String),

    /// A ring primitive broke its contract (digit out of range,
    /// valuation below the current level, ...).
    #[error("collaborator contract violation: {0}")]
    Collaborator(String),

    /// No family is registered under this name.
    #[error("unknown family: {0}")]
    UnknownFamily(String),

    /// A family of residue maps is not compatible across levels.
    #[error("incompatible family at level {lower} <- {upper}: {description}")]
    IncompatibleFamily {
        lower: u32,
        upper: u32,
        description: String,
    },
}

/// Which tower law was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Law {
    Bound,
    DigitStability,
    Compatibility,
    Cauchy,
    Homomorphism,
    Kernel,
    Density,
    UniversalProperty,
}

/// A concrete violation of a tower law, observed at some precision level.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Violation {
    pub law: Law,
    pub level: Option<u32>,
    pub description: String,
}

impl Violation {
    pub fn error(law: Law, level: Option<u32>, description: impl Into<String>) -> Self {
        Self {
            law,
            level,
            description: description.into(),
        }
    }
}
