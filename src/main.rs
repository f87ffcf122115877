// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{bail, Context, Result};
use std::env;
use std::time::Instant;
use tokamak_mdo::components::machine::{machine, DESIGN_VARIABLES, RESPONSES};
use tokamak_mdo::config::load_constants;
use tokamak_mdo::engine::{Problem, VariableListing};
use tokamak_mdo::jacobian::CheckOptions;
use tracing_subscriber::EnvFilter;

/// Parsed command line
struct Args {
    constants: Option<String>,
    check_partials: bool,
    json: bool,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut parsed = Args {
        constants: None,
        check_partials: false,
        json: false,
    };
    for arg in args {
        match arg.as_str() {
            "--check-partials" => parsed.check_partials = true,
            "--json" => parsed.json = true,
            flag if flag.starts_with("--") => bail!("unknown option '{}'", flag),
            path if parsed.constants.is_none() => parsed.constants = Some(path.to_string()),
            extra => bail!("unexpected argument '{}'", extra),
        }
    }
    Ok(parsed)
}

fn print_listing(title: &str, listings: &[VariableListing]) {
    println!("\n{}", title);
    for v in listings {
        let units = v.units.as_deref().unwrap_or("");
        let value = match v.value.as_slice() {
            [single] => format!("{:.6}", single),
            many => format!("[{} values]", many.len()),
        };
        println!("  {:<40} {:>16} {}", v.name, value, units);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let argv: Vec<String> = env::args().collect();
    let args = match parse_args(&argv[1..]) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Usage: {} [constants.(yaml|toml)] [--check-partials] [--json]", argv[0]);
            std::process::exit(1);
        }
    };

    let start = Instant::now();
    let config = load_constants(args.constants.as_deref()).context("loading constants")?;
    let mut problem = Problem::new(machine(&config)?)?;
    problem.run().context("evaluating the machine model")?;
    let totals = problem.compute_totals(RESPONSES, DESIGN_VARIABLES)?;

    if args.json {
        println!("{}", problem.state().to_json()?);
        println!("{}", totals.to_json()?);
    } else {
        println!("Tokamak machine model");
        println!("=====================");
        print_listing("Design variables:", &problem.list_design_variables());
        print_listing("Outputs:", &problem.list_outputs());

        println!("\nTotal derivatives:");
        print!("  {:<30}", "");
        for wrt in DESIGN_VARIABLES {
            print!(" {:>14}", wrt);
        }
        println!();
        for of in RESPONSES {
            print!("  {:<30}", of);
            for wrt in DESIGN_VARIABLES {
                let value = totals.get(of, wrt).and_then(|m| m.get((0, 0)).copied()).unwrap_or(f64::NAN);
                print!(" {:>14.6e}", value);
            }
            println!();
        }
    }

    if args.check_partials {
        let report = problem.check_partials(&CheckOptions::finite_difference())?;
        if args.json {
            println!("{}", report.to_json()?);
        } else {
            println!("\nPartials check ({} blocks):", report.checks.len());
            for failure in report.failures() {
                println!(
                    "  FAILED {} d({})/d({}): abs {:.3e}, rel {:.3e}",
                    failure.component, failure.of, failure.wrt, failure.max_abs_error, failure.max_rel_error
                );
            }
            if report.passed() {
                println!("  all partials agree with finite differences");
            }
        }
    }

    if !args.json {
        println!("\nCompleted in {:?}", start.elapsed());
    }
    Ok(())
}
