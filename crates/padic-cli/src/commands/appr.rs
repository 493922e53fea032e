use super::OUTPUT_SCHEMA;
use crate::support::{CliError, Config, join_digits, print_json};
use padic_kernel::{DigitExtractor, LocalRationals, Prime};
use serde_json::json;

pub fn run(
    config: &Config,
    value: &str,
    prime: Option<Prime>,
    precision: Option<u32>,
    json_output: bool,
) -> Result<(), CliError> {
    let settings = config.resolve(prime, precision)?;
    let rationals = LocalRationals::new(settings.prime);
    let x = rationals.parse(value)?;
    let extractor = DigitExtractor::new(rationals);

    let tower = extractor.tower(&x, settings.precision)?;
    let digits = extractor.digits(&x, settings.precision)?;

    if json_output {
        let tower: Vec<String> = tower.iter().map(|a| a.value().to_string()).collect();
        print_json(&json!({
            "schema": OUTPUT_SCHEMA,
            "kind": "padic.appr",
            "value": x.to_string(),
            "prime": settings.prime,
            "precision": settings.precision,
            "digits": digits,
            "tower": tower,
        }))
    } else {
        println!(
            "padic appr {x} --prime {} --precision {}",
            settings.prime, settings.precision
        );
        println!("  Digits (least significant first): {}", join_digits(&digits));
        for a in &tower {
            println!("  appr(x, {}) = {}", a.level(), a.value());
        }
        Ok(())
    }
}
