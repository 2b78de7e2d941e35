//! Baseline LU kernels the pipelined engine is checked against.
//!
//! Both kernels work on a row-major copy of the input and apply the same
//! Doolittle recurrence as the engine, so on finite inputs all three produce
//! bit-identical packed factorizations: every entry receives the same
//! sequence of multiply-subtract updates in the same step order regardless
//! of which kernel ran. That makes the serialized outputs directly
//! comparable with [`crate::io::compare_files`].
//!
//! [`lu_serial`] is the plain triple loop. [`lu_fork_join`] normalizes each
//! pivot column serially, then updates the trailing rows of that step on the
//! rayon pool; the implicit join at the end of each step is the
//! coarse-grained schedule the pipelined engine exists to beat.

use rayon::prelude::*;

use crate::{ColumnaError, Matrix, Result};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Single-threaded Doolittle factorization without pivoting
///
/// Returns the packed factors in one row-major matrix: L multipliers below
/// the diagonal (unit diagonal implicit), U on and above it. A zero pivot is
/// not detected; it propagates non-finite values.
///
/// # Errors
///
/// - `InvalidInput` if the matrix is not square or is empty.
///
/// # Example
///
/// ```
/// use columna::{reference::lu_serial, Matrix};
///
/// let a = Matrix::from_vec(2, 2, vec![4.0, 3.0, 6.0, 3.0]).unwrap();
/// let lu = lu_serial(&a).unwrap();
/// assert_eq!(lu.get(1, 0), Some(&1.5)); // multiplier 6/4
/// assert_eq!(lu.get(1, 1), Some(&-1.5)); // 3 - 1.5 * 3
/// ```
#[cfg_attr(feature = "tracing", instrument(skip(matrix), fields(n = matrix.rows())))]
pub fn lu_serial(matrix: &Matrix) -> Result<Matrix> {
    let n = validate_input(matrix)?;
    let mut out = matrix.clone();
    let a = out.as_mut_slice();

    for k in 0..n {
        let inv = 1.0 / a[k * n + k];
        for i in k + 1..n {
            a[i * n + k] *= inv;
        }
        for i in k + 1..n {
            let mult = a[i * n + k];
            for j in k + 1..n {
                a[i * n + j] -= mult * a[k * n + j];
            }
        }
    }

    Ok(out)
}

/// Fork-join parallel Doolittle factorization without pivoting
///
/// Per elimination step: the pivot column is normalized on the calling
/// thread, then every trailing row's update runs as a rayon task. The step
/// boundary is a full join, so threads idle whenever a step's trailing
/// matrix is too small to feed the pool. Worker count comes from the rayon
/// pool the call runs in; installing it in a sized
/// [`ThreadPool`](rayon::ThreadPool) pins the width, which is how the CLI
/// applies its thread-count argument.
///
/// # Errors
///
/// - `InvalidInput` if the matrix is not square or is empty.
#[cfg_attr(feature = "tracing", instrument(skip(matrix), fields(n = matrix.rows())))]
pub fn lu_fork_join(matrix: &Matrix) -> Result<Matrix> {
    let n = validate_input(matrix)?;
    let mut out = matrix.clone();

    for k in 0..n {
        let a = out.as_mut_slice();
        let inv = 1.0 / a[k * n + k];
        for i in k + 1..n {
            a[i * n + k] *= inv;
        }

        // Rows up to and including k are final; splitting there lets the
        // trailing rows borrow the pivot row immutably while they update.
        let (done, trailing) = a.split_at_mut((k + 1) * n);
        let pivot_row = &done[k * n..(k + 1) * n];

        trailing.par_chunks_mut(n).for_each(|row| {
            let mult = row[k];
            for j in k + 1..n {
                row[j] -= mult * pivot_row[j];
            }
        });
    }

    Ok(out)
}

fn validate_input(matrix: &Matrix) -> Result<usize> {
    if !matrix.is_square() {
        return Err(ColumnaError::InvalidInput(format!(
            "Matrix must be square for LU factorization, got {}x{}",
            matrix.rows(),
            matrix.cols()
        )));
    }
    if matrix.rows() == 0 {
        return Err(ColumnaError::InvalidInput(
            "Cannot factorize an empty matrix".to_string(),
        ));
    }
    Ok(matrix.rows())
}
