//! Pipelined LU factorization over column-cyclic worker threads.
//!
//! Computes the Doolittle factorization `A = L·U` (unit diagonal of L
//! implicit, no pivoting) in place, with one scoped pool of worker threads
//! and a single barrier. After initialization, steps are synchronized only by
//! per-column [`ReadyGate`]s: a worker blocks solely when the pivot column it
//! needs next has not been normalized yet, so elimination steps overlap
//! across threads in a wavefront instead of proceeding in lock step.
//!
//! # Protocol
//!
//! With `n` the matrix size, `t` the worker count (clamped to `n`) and
//! `nlim = n - t + 1`:
//!
//! 1. **First touch**: worker `id` allocates and fills columns
//!    `id, id+t, ...` on its own thread, then waits at the one barrier.
//! 2. **Seed**: worker 0 scales column 0 below the diagonal by the
//!    reciprocal of the first pivot and releases gate 0.
//! 3. **Pipelined steps**: for `k` in `0..nlim`, every worker waits on gate
//!    `k`, then applies the rank-1 update to its owned trailing columns
//!    ([`schedule::owned_columns`]). The worker that owns column `k+1`
//!    normalizes it right after updating it and releases gate `k+1`, making
//!    the next pivot available while other workers are still on step `k`.
//! 4. **Serial tail**: after the scope joins, the last `t-1` columns are
//!    eliminated single-threaded; at that point the available parallelism is
//!    smaller than the pool and coordination would dominate.
//!
//! A zero pivot is not detected: the algorithm assumes all leading principal
//! minors are non-singular, and a violation propagates non-finite values
//! through the remaining arithmetic.
//!
//! # Example
//!
//! ```
//! use columna::{LuFactors, Matrix};
//!
//! let a = Matrix::from_vec(3, 3, vec![
//!     2.0, 1.0, 1.0,
//!     4.0, 3.0, 3.0,
//!     8.0, 7.0, 9.0,
//! ]).unwrap();
//!
//! let lu = LuFactors::compute(&a, 2).unwrap();
//! let product = lu.reconstruct().unwrap();
//! assert!(a.max_abs_diff(&product).unwrap() < 1e-12);
//! ```

use std::sync::Barrier;
use std::thread;

use crate::gate::ReadyGate;
use crate::schedule;
use crate::store::ColumnStore;
use crate::{clamp_threads, ColumnaError, Matrix, Result};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// An in-place LU factorization produced by the pipelined engine
///
/// Owns the column-major working storage after all workers have joined.
/// Entry (i, j) holds the L multiplier for `i > j` and the U entry for
/// `i ≤ j`; the unit diagonal of L is implicit. No permutation accompanies
/// the factors because the engine never pivots.
#[derive(Debug)]
pub struct LuFactors {
    store: ColumnStore,
    threads: usize,
}

impl LuFactors {
    /// Factorizes a square matrix with `threads` workers
    ///
    /// `threads` is clamped to `1..=n`. The input is copied into per-column
    /// buffers (first-touched by their owning workers) and factorized in
    /// place there; the input matrix itself is left untouched.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the matrix is not square or is empty.
    ///
    /// # Example
    ///
    /// ```
    /// use columna::{LuFactors, Matrix};
    ///
    /// let lu = LuFactors::compute(&Matrix::identity(5), 4).unwrap();
    /// assert_eq!(lu.value(2, 2), Some(1.0));
    /// assert_eq!(lu.value(3, 1), Some(0.0));
    /// ```
    #[cfg_attr(feature = "tracing", instrument(skip(matrix), fields(n = matrix.rows(), threads)))]
    pub fn compute(matrix: &Matrix, threads: usize) -> Result<Self> {
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

        let n = matrix.rows();
        let threads = clamp_threads(threads, n);

        let mut store = factorize_pipelined(matrix, threads);
        serial_tail(&mut store, n - threads + 1);

        Ok(LuFactors { store, threads })
    }

    /// Matrix dimension
    pub fn n(&self) -> usize {
        self.store.n()
    }

    /// Number of worker threads actually used (after clamping)
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Entry (row, col) of the packed factorization
    ///
    /// Below the diagonal this is the L multiplier, on and above it the U
    /// entry. Returns `None` for out-of-bounds indices.
    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        self.store.value(row, col)
    }

    /// The unit lower-triangular factor L as a dense matrix
    ///
    /// Strict lower part from the packed storage, ones on the diagonal.
    pub fn l(&self) -> Matrix {
        let n = self.n();
        let packed = self.store.to_matrix();
        let src = packed.as_slice();
        let mut out = Matrix::identity(n);
        let dst = out.as_mut_slice();
        for row in 1..n {
            for col in 0..row {
                dst[row * n + col] = src[row * n + col];
            }
        }
        out
    }

    /// The upper-triangular factor U as a dense matrix
    pub fn u(&self) -> Matrix {
        let n = self.n();
        let packed = self.store.to_matrix();
        let src = packed.as_slice();
        let mut out = Matrix::zeros(n, n);
        let dst = out.as_mut_slice();
        for row in 0..n {
            for col in row..n {
                dst[row * n + col] = src[row * n + col];
            }
        }
        out
    }

    /// Exports the packed factorization as a row-major matrix
    ///
    /// The engine's storage is column-major, so this performs the index-swap
    /// transpose; the result is laid out exactly like the reference kernels'
    /// output and serializes identically.
    pub fn to_matrix(&self) -> Matrix {
        self.store.to_matrix()
    }

    /// Recomputes `L·U`, which must reproduce the original input within
    /// floating-point rounding
    ///
    /// # Example
    ///
    /// ```
    /// use columna::{LuFactors, Matrix};
    ///
    /// let a = Matrix::from_vec(2, 2, vec![4.0, 3.0, 6.0, 3.0]).unwrap();
    /// let lu = LuFactors::compute(&a, 1).unwrap();
    /// let back = lu.reconstruct().unwrap();
    /// assert!(a.max_abs_diff(&back).unwrap() < 1e-12);
    /// ```
    pub fn reconstruct(&self) -> Result<Matrix> {
        self.l().matmul(&self.u())
    }
}

/// Runs phases 1–3 of the protocol and returns the worked storage
///
/// `threads` must already be clamped to `1..=n`.
fn factorize_pipelined(input: &Matrix, threads: usize) -> ColumnStore {
    let n = input.rows();
    let nlim = n - threads + 1;

    let store = ColumnStore::new(n);
    let gates: Vec<ReadyGate> = (0..n).map(|_| ReadyGate::new()).collect();
    let barrier = Barrier::new(threads);

    thread::scope(|s| {
        for id in 0..threads {
            let store = &store;
            let gates = &gates;
            let barrier = &barrier;
            s.spawn(move || worker(id, threads, nlim, input, store, gates, barrier));
        }
    });

    store
}

/// One worker's run through first touch, seed, and the pipelined steps
fn worker(
    id: usize,
    threads: usize,
    nlim: usize,
    input: &Matrix,
    store: &ColumnStore,
    gates: &[ReadyGate],
    barrier: &Barrier,
) {
    let n = store.n();

    for col in schedule::first_touch_columns(id, threads, n) {
        // SAFETY: the cyclic split assigns each column to exactly one
        // worker, and the barrier below orders every touch before any read.
        unsafe { store.first_touch(col, input) };
    }

    // The only barrier in the engine: all columns allocated, all gates still
    // closed, before any elimination work starts.
    barrier.wait();

    if id == 0 {
        // SAFETY: no other worker accesses column 0 until gate 0 opens.
        let col0 = unsafe { store.owned_column(0) };
        let inv = 1.0 / col0[0];
        for value in col0.iter_mut().skip(1) {
            *value *= inv;
        }
        gates[0].release();
    }

    for k in 0..nlim {
        gates[k].wait();

        // SAFETY: gate k was released after the last write to column k, and
        // nothing writes a column once it has become a pivot.
        let pivot = unsafe { store.pivot_column(k) };

        for col in schedule::owned_columns(k, id, threads, n) {
            // SAFETY: the ownership sets of distinct workers at step k are
            // disjoint (schedule invariant), so this worker is the only one
            // touching `col` during this step.
            let column = unsafe { store.owned_column(col) };

            let mult = column[k];
            for j in k + 1..n {
                column[j] -= pivot[j] * mult;
            }

            // The owner of column k+1 turns it into the next pivot as soon
            // as its step-k update lands, releasing waiters on gate k+1
            // while other workers may still be working on step k.
            if col == k + 1 && col < nlim {
                let inv = 1.0 / column[col];
                for value in column.iter_mut().skip(col + 1) {
                    *value *= inv;
                }
                gates[k + 1].release();
            }
        }
    }
}

/// Completes elimination for the last `t - 1` columns, single-threaded
///
/// Runs strictly after every worker has joined. For these columns the
/// available parallelism is smaller than the pool, so the pointwise gate
/// protocol would cost more than it buys.
fn serial_tail(store: &mut ColumnStore, nlim: usize) {
    let n = store.n();

    for k in nlim..n {
        let pivot = store.column_mut(k);
        let inv = 1.0 / pivot[k];
        for value in pivot.iter_mut().skip(k + 1) {
            *value *= inv;
        }

        for col in k + 1..n {
            let (pivot, target) = store.pivot_and_target(k, col);
            let mult = target[k];
            for j in k + 1..n {
                target[j] -= pivot[j] * mult;
            }
        }
    }
}
