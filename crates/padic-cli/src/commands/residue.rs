use super::OUTPUT_SCHEMA;
use crate::support::{CliError, Config, print_json};
use padic_kernel::{LocalRationals, Prime, ToResidue};
use serde_json::json;

pub fn run(
    config: &Config,
    value: &str,
    prime: Option<Prime>,
    level: u32,
    json_output: bool,
) -> Result<(), CliError> {
    let settings = config.resolve(prime, Some(level))?;
    let rationals = LocalRationals::new(settings.prime);
    let x = rationals.parse(value)?;
    let projection = ToResidue::new(rationals);

    let image = projection.apply(level, &x)?;
    let in_kernel = projection.in_kernel(level, &x)?;
    let in_ideal = projection.in_ideal(level, &x)?;

    if json_output {
        print_json(&json!({
            "schema": OUTPUT_SCHEMA,
            "kind": "padic.residue",
            "value": x.to_string(),
            "prime": settings.prime,
            "level": level,
            "residue": image.value().to_string(),
            "inKernel": in_kernel,
            "inIdeal": in_ideal,
        }))
    } else {
        println!("padic residue {x} --prime {} --level {level}", settings.prime);
        println!("  toResidue({level})(x) = {image}");
        println!("  In kernel: {}", if in_kernel { "yes" } else { "no" });
        println!(
            "  In (p^{level}): {}",
            if in_ideal { "yes" } else { "no" }
        );
        Ok(())
    }
}
