use crate::support::{CliError, print_json, read_json_file};
use padic_kernel::{GateCase, run_case};

pub fn run(case_path: &str, profile: &str, json_output: bool) -> Result<(), CliError> {
    let case: GateCase = read_json_file(case_path, "gate case")?;
    let result = run_case(&case, profile)?;

    if json_output {
        print_json(&serde_json::to_value(&result)?)?;
    } else {
        println!("padic gate {case_path} --profile {profile}");
        println!("  Prime: {}", case.prime);
        println!("  Family: {}", case.family);
        println!(
            "  Result: {}",
            if result.is_accepted() { "accepted" } else { "rejected" }
        );
        for failure in &result.failures {
            println!(
                "  - {} [{}] {}",
                failure.class, failure.law_ref, failure.witness_id
            );
            println!("      {}", failure.message);
        }
    }

    if !result.is_accepted() {
        std::process::exit(1);
    }
    Ok(())
}
