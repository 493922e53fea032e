use clap::{Parser, Subcommand};
use padic_kernel::Prime;

#[derive(Parser)]
#[command(
    name = "padic",
    about = "p-adic digit towers: approximations, residue projections and universal lifts",
    version
)]
pub struct Cli {
    /// Config file with prime, precision and working_precision
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Log kernel decisions at debug level (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Digit approximations appr(x, 0..=n) of a p-integral rational
    Appr {
        /// Value, written `a` or `a/b`
        #[arg(allow_hyphen_values = true)]
        value: String,

        /// The prime p
        #[arg(long)]
        prime: Option<Prime>,

        /// Number of digits n
        #[arg(long)]
        precision: Option<u32>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// The residue toResidue(n)(x) and kernel membership
    Residue {
        /// Value, written `a` or `a/b`
        #[arg(allow_hyphen_values = true)]
        value: String,

        /// The prime p
        #[arg(long)]
        prime: Option<Prime>,

        /// Level n of the target ring Z/p^n
        #[arg(long)]
        level: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Lift a value into Z_p through a named compatible family
    Lift {
        /// Value, written `a` or `a/b`
        #[arg(allow_hyphen_values = true)]
        value: String,

        /// The prime p
        #[arg(long)]
        prime: Option<Prime>,

        /// Number of digits of the lift to show and check
        #[arg(long)]
        precision: Option<u32>,

        /// Family: reduction (alias rational), appr, square or drift
        #[arg(long, default_value = "rational")]
        family: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a tower law check case (prime, family, check) from a JSON file
    Gate {
        /// Path to the case JSON
        case: String,

        /// Conformance profile recorded in the result
        #[arg(long, default_value = "padic")]
        profile: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
