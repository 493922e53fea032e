use super::OUTPUT_SCHEMA;
use crate::support::{CliError, Config, join_digits, print_json};
use padic_kernel::catalog::{RationalFamily, require_family};
use padic_kernel::{Fraction, KernelError, Lift, LocalRationals, Prime, Residue, ToResidue};
use serde_json::json;
use tracing::warn;

pub struct Args {
    pub value: String,
    pub prime: Option<Prime>,
    pub precision: Option<u32>,
    pub family: String,
    pub json: bool,
}

pub fn run(config: &Config, args: Args) -> Result<(), CliError> {
    let settings = config.resolve(args.prime, args.precision)?;
    let rationals = LocalRationals::new(settings.prime);
    let x = rationals.parse(&args.value)?;
    let family = require_family(&args.family, settings.prime)?;
    let lift = Lift::new(family, settings.working_precision);
    let precision = settings.precision;

    let failure = match lift.check_universal(&x, precision) {
        Ok(()) => None,
        Err(KernelError::IncompatibleFamily { description, .. }) => {
            warn!(%description, "universal property fails");
            Some(description)
        }
        Err(e) => return Err(e.into()),
    };

    // an incompatible family has no lift to read digits from
    let report = match failure {
        None => Some(read_lift(&lift, &x, precision, settings.working_precision)?),
        Some(_) => None,
    };

    if args.json {
        print_json(&json!({
            "schema": OUTPUT_SCHEMA,
            "kind": "padic.lift",
            "value": x.to_string(),
            "prime": settings.prime,
            "family": args.family,
            "precision": precision,
            "digits": report.as_ref().map(|r| r.digits.clone()),
            "approx": report.as_ref().map(|r| r.approx.value().to_string()),
            "universal": failure.is_none(),
            "universalFailure": failure,
            "roundTrip": report.as_ref().map(|r| r.round_trip),
        }))?;
    } else {
        println!(
            "padic lift {x} --prime {} --family {} --precision {precision}",
            settings.prime, args.family
        );
        match (&report, &failure) {
            (Some(report), _) => {
                println!(
                    "  Digits (least significant first): {}",
                    join_digits(&report.digits)
                );
                println!("  lift(f)(x) = {}", report.approx);
                println!("  Universal property: holds");
                println!(
                    "  Round trip through toResidue: {}",
                    if report.round_trip { "yes" } else { "no" }
                );
            }
            (None, Some(description)) => {
                println!("  Universal property: fails");
                println!("      {description}");
            }
            (None, None) => {}
        }
    }

    if failure.is_some() {
        std::process::exit(1);
    }
    Ok(())
}

struct LiftReport {
    digits: Vec<u64>,
    approx: Residue,
    round_trip: bool,
}

fn read_lift(
    lift: &Lift<RationalFamily>,
    x: &Fraction,
    precision: u32,
    working_precision: u32,
) -> Result<LiftReport, CliError> {
    let lifted = lift.apply(x);
    let digits = lifted.digits(precision)?;
    let approx = lift.approx(x, precision)?;

    // lift(toResidue) should hand the lifted element back unchanged
    let zp = *lift.target();
    let identity = Lift::new(ToResidue::new(zp), working_precision);
    let round_trip = zp.eq_up_to(&identity.apply(&lifted), &lifted, precision)?;

    Ok(LiftReport {
        digits,
        approx,
        round_trip,
    })
}
