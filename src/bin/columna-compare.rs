//! Standalone result-file comparator.
//!
//! `columna-compare <file_a> <file_b>`
//!
//! Streams two raw binary double files and reports either how many leading
//! values matched or the first differing pair. Verification stays outside
//! the factorization binary so outputs from different kernels, runs, and
//! machines can be checked against stored reference files.

use std::env;

use anyhow::Result;
use columna::io::{self, Comparison};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        let program = args.first().map(String::as_str).unwrap_or("columna-compare");
        println!("Usage: {program} <file_a> <file_b>");
        return Ok(());
    }

    match io::compare_files(&args[1], &args[2]) {
        Ok(Comparison::Match { values }) => {
            println!("Results seem correct - {values} values were matching.");
            Ok(())
        }
        Ok(Comparison::Mismatch {
            position,
            left,
            right,
        }) => {
            println!("Incorrect results - mismatch at position {position}: {left} != {right}");
            println!("Results seem wrong.");
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
