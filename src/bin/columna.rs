//! Command-line front end for the factorization kernels.
//!
//! `columna <matrix_size> <input_file> [thread_count] [--mode <kernel>]`
//!
//! Reads a raw binary matrix, factorizes it with the selected kernel, and
//! writes the packed result to `result.mat` in the current directory.
//! Argument mistakes print a usage message and exit with status 0; only
//! runtime failures (unreadable input, wrong file size) exit nonzero.

use std::env;
use std::time::Instant;

use anyhow::Result;
use columna::{io, reference, LuFactors, Matrix, Mode};
use rayon::ThreadPoolBuilder;

const DEFAULT_THREADS: usize = 4;
const RESULT_FILE: &str = "result.mat";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    println!();
    match parse_args(&args) {
        Parsed::Run(config) => {
            if let Err(e) = run(&config) {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Parsed::Exit(message) => {
            println!("{message}\n");
            Ok(())
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Config {
    size: usize,
    input: String,
    threads: usize,
    thread_arg_given: bool,
    mode: Mode,
}

/// Outcome of argument parsing: either a runnable configuration or a
/// message to print before exiting with status 0
#[derive(Debug, PartialEq, Eq)]
enum Parsed {
    Run(Config),
    Exit(String),
}

fn usage(program: &str) -> String {
    format!(
        "Usage: {program} <matrix_size> <matrix_file> [thread_count] [--mode serial|forkjoin|pipelined]\n\
         Matrix size and file are mandatory; thread count defaults to {DEFAULT_THREADS}."
    )
}

fn parse_args(args: &[String]) -> Parsed {
    let program = args.first().map(String::as_str).unwrap_or("columna");

    let mut positional: Vec<&str> = Vec::new();
    let mut mode = Mode::default();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--mode" => {
                i += 1;
                let Some(name) = args.get(i) else {
                    return Parsed::Exit(usage(program));
                };
                match name.parse::<Mode>() {
                    Ok(m) => mode = m,
                    Err(e) => return Parsed::Exit(e.to_string()),
                }
            }
            arg => positional.push(arg),
        }
        i += 1;
    }

    if positional.len() < 2 {
        return Parsed::Exit(format!("Incorrect number of arguments!\n{}", usage(program)));
    }

    let Some(size) = parse_positive(positional[0]) else {
        return Parsed::Exit(format!(
            "Invalid value {} for matrix size. Please enter a positive integer.",
            positional[0]
        ));
    };

    let (threads, thread_arg_given) = match positional.get(2) {
        Some(arg) => match parse_positive(arg) {
            Some(t) => (t, true),
            None => {
                return Parsed::Exit(format!(
                    "Invalid value {arg} for thread count. Please enter a positive integer."
                ));
            }
        },
        None => (DEFAULT_THREADS, false),
    };

    Parsed::Run(Config {
        size,
        input: positional[1].to_string(),
        threads,
        thread_arg_given,
        mode,
    })
}

fn parse_positive(arg: &str) -> Option<usize> {
    arg.parse::<usize>().ok().filter(|&v| v > 0)
}

/// Note about the thread argument, printed before the kernel runs
///
/// Serial ignores an explicit count; the parallel kernels fall back to the
/// default when none is given. When an explicit count reaches a parallel
/// kernel there is nothing to announce.
fn thread_note(config: &Config) -> Option<String> {
    match config.mode {
        Mode::Serial if config.thread_arg_given => {
            Some("Thread count is ignored in serial mode.".to_string())
        }
        Mode::ForkJoin | Mode::Pipelined if !config.thread_arg_given => Some(format!(
            "No thread count given. Running with {DEFAULT_THREADS} threads."
        )),
        _ => None,
    }
}

/// Runs the configured kernel on `matrix`
///
/// The fork-join kernel takes its width from the rayon pool it runs in, so
/// it is installed in a pool sized to the configured thread count.
fn factorize(config: &Config, matrix: &Matrix) -> Result<Matrix> {
    match config.mode {
        Mode::Serial => Ok(reference::lu_serial(matrix)?),
        Mode::ForkJoin => {
            let pool = ThreadPoolBuilder::new()
                .num_threads(config.threads)
                .build()?;
            Ok(pool.install(|| reference::lu_fork_join(matrix))?)
        }
        Mode::Pipelined => Ok(LuFactors::compute(matrix, config.threads)?.to_matrix()),
    }
}

fn run(config: &Config) -> Result<()> {
    if let Some(note) = thread_note(config) {
        println!("{note}\n");
    }

    println!("Reading matrix from '{}'", config.input);
    let matrix = io::read_matrix(&config.input, config.size)?;

    let start = Instant::now();
    let result = factorize(config, &matrix)?;
    let elapsed = start.elapsed();

    println!(
        "LU factorization in {} mode finished in {:.6} seconds\n",
        config.mode,
        elapsed.as_secs_f64()
    );

    println!("Saving result matrix to {RESULT_FILE}\n");
    io::write_matrix(RESULT_FILE, &result)?;

    Ok(())
}
