//! Raw binary matrix files and test-case generation.
//!
//! Matrices travel as bare `f64` values in native byte order, row-major,
//! with no header or dimension field; the reader is told the dimension and
//! verifies it against the file length. Every kernel serializes through the
//! same row-major layout (the pipelined engine transposes its column-major
//! storage on export), so output files from different kernels can be
//! compared byte for byte.

use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{ColumnaError, Matrix, Result};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Outcome of comparing two result files value by value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparison {
    /// Every paired value matched; `values` is how many pairs were read
    Match {
        /// Number of matching pairs
        values: usize,
    },
    /// Comparison stopped at the first differing pair
    Mismatch {
        /// 1-based position of the differing pair
        position: usize,
        /// Value from the first file
        left: f64,
        /// Value from the second file
        right: f64,
    },
}

/// Reads an `n x n` matrix from a raw binary file
///
/// # Errors
///
/// - `Io` if the file cannot be read.
/// - `InvalidInput` if `n * n * 8` overflows `usize`.
/// - `SizeMismatch` if the file is not exactly `n * n * 8` bytes.
#[cfg_attr(feature = "tracing", instrument(skip(path), fields(n)))]
pub fn read_matrix<P: AsRef<Path>>(path: P, n: usize) -> Result<Matrix> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| {
        ColumnaError::Io(format!(
            "failed to open input file '{}': {e}",
            path.display()
        ))
    })?;

    let expected = n
        .checked_mul(n)
        .and_then(|cells| cells.checked_mul(std::mem::size_of::<f64>()))
        .ok_or_else(|| {
            ColumnaError::InvalidInput(format!(
                "matrix size {n} overflows the expected file length"
            ))
        })?;
    if bytes.len() != expected {
        return Err(ColumnaError::SizeMismatch {
            expected,
            actual: bytes.len(),
        });
    }

    let mut data = Vec::with_capacity(n * n);
    for chunk in bytes.chunks_exact(8) {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(chunk);
        data.push(f64::from_ne_bytes(raw));
    }
    Matrix::from_vec(n, n, data)
}

/// Writes a matrix to a raw binary file, row-major
///
/// # Errors
///
/// - `Io` if the file cannot be created or written.
#[cfg_attr(feature = "tracing", instrument(skip(path, matrix)))]
pub fn write_matrix<P: AsRef<Path>>(path: P, matrix: &Matrix) -> Result<()> {
    let path = path.as_ref();
    let values = matrix.as_slice();
    let mut bytes = Vec::with_capacity(values.len() * 8);
    for value in values {
        bytes.extend_from_slice(&value.to_ne_bytes());
    }
    fs::write(path, bytes)
        .map_err(|e| ColumnaError::Io(format!("failed to write '{}': {e}", path.display())))
}

/// Compares two result files as streams of `f64` values
///
/// Pairs values until either file runs out; trailing values in the longer
/// file are ignored. Matching means IEEE `==`, so a NaN never matches, even
/// against the same bit pattern.
///
/// # Errors
///
/// - `Io` if either file cannot be read.
#[cfg_attr(feature = "tracing", instrument(skip(left, right)))]
pub fn compare_files<A: AsRef<Path>, B: AsRef<Path>>(left: A, right: B) -> Result<Comparison> {
    let left = left.as_ref();
    let right = right.as_ref();
    let a = fs::read(left)
        .map_err(|e| ColumnaError::Io(format!("failed to open '{}': {e}", left.display())))?;
    let b = fs::read(right)
        .map_err(|e| ColumnaError::Io(format!("failed to open '{}': {e}", right.display())))?;

    let mut values = 0;
    for (ca, cb) in a.chunks_exact(8).zip(b.chunks_exact(8)) {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(ca);
        let x = f64::from_ne_bytes(raw);
        raw.copy_from_slice(cb);
        let y = f64::from_ne_bytes(raw);

        values += 1;
        if x != y {
            return Ok(Comparison::Mismatch {
                position: values,
                left: x,
                right: y,
            });
        }
    }

    Ok(Comparison::Match { values })
}

/// Builds the `n x n` matrix with values `1..=n*n`, row-major
///
/// Small deterministic test cases. The leading principal minors of these
/// matrices vanish from step 2 on, which makes them singular inputs for the
/// factorization kernels.
pub fn sequential_matrix(n: usize) -> Matrix {
    let mut out = Matrix::zeros(n, n);
    for (i, value) in out.as_mut_slice().iter_mut().enumerate() {
        *value = (i + 1) as f64;
    }
    out
}

/// Builds an `n x n` matrix of seeded random values in `0.1..100.1`
///
/// Integer draws offset by 0.1, the value shape used for the large
/// benchmark inputs. The same seed reproduces the same matrix.
pub fn random_matrix(n: usize, seed: u64) -> Matrix {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = Matrix::zeros(n, n);
    for value in out.as_mut_slice().iter_mut() {
        *value = f64::from(rng.gen_range(0..100u32)) + 0.1;
    }
    out
}

/// Writes the sequential test matrix to a file
///
/// # Errors
///
/// - `Io` if the file cannot be written.
pub fn write_sequential_matrix<P: AsRef<Path>>(path: P, n: usize) -> Result<()> {
    write_matrix(path, &sequential_matrix(n))
}

/// Writes a seeded random matrix to a file
///
/// # Errors
///
/// - `Io` if the file cannot be written.
pub fn write_random_matrix<P: AsRef<Path>>(path: P, n: usize, seed: u64) -> Result<()> {
    write_matrix(path, &random_matrix(n, seed))
}
