//! Column-major working storage for the pipelined engine.
//!
//! The working matrix is held as `n` independently allocated column buffers
//! rather than one contiguous block. Each buffer is allocated and filled by
//! the worker thread that owns the column first (the first-touch contract),
//! so physical pages land near the execution context that uses them first and
//! columns owned by different workers never share an allocation.
//!
//! # Safety
//!
//! During the parallel phases, multiple workers hold `&ColumnStore` and
//! access *disjoint* columns through the `unsafe` accessors. The aliasing
//! discipline lives in the elimination schedule, not in this type:
//!
//! - at most one thread first-touches a given column, before any reader;
//! - a column has at most one writer per elimination step (cyclic
//!   assignment), and is read as a pivot only after its gate was released.
//!
//! Everything after the worker join uses the safe `&mut self`/quiescent
//! `&self` API; the unsafe surface is confined to the engine.

use std::cell::UnsafeCell;

use crate::Matrix;

/// Per-column storage for an n×n factorization in progress
///
/// Entry (row, col) of the logical matrix lives at `column[col][row]`. Slots
/// start empty; [`first_touch`](Self::first_touch) installs the actual
/// buffer. After factorization the same storage holds the result in place: L
/// multipliers below the diagonal, U on and above it, unit diagonal of L
/// implicit.
#[derive(Debug)]
pub struct ColumnStore {
    n: usize,
    cols: Vec<UnsafeCell<Vec<f64>>>,
}

// SAFETY: concurrent access goes through the unsafe accessors, whose
// contracts require disjoint columns per thread; the per-column gates provide
// the release/acquire edge for the one cross-thread read (the pivot column).
unsafe impl Sync for ColumnStore {}

impl ColumnStore {
    /// Creates a store with `n` empty column slots
    ///
    /// No column data is allocated here; buffers are installed by
    /// [`first_touch`](Self::first_touch) on their owning threads.
    pub fn new(n: usize) -> Self {
        let cols = (0..n).map(|_| UnsafeCell::new(Vec::new())).collect();
        ColumnStore { n, cols }
    }

    /// Builds a fully-touched store from a row-major matrix, single-threaded
    ///
    /// Convenience for tests; all buffers are allocated on the calling
    /// thread.
    pub fn from_matrix(source: &Matrix) -> Self {
        let n = source.rows();
        let store = ColumnStore::new(n);
        for col in 0..n {
            // SAFETY: single-threaded, each slot touched exactly once.
            unsafe { store.first_touch(col, source) };
        }
        store
    }

    /// Matrix dimension (number of columns, which equals column length)
    pub fn n(&self) -> usize {
        self.n
    }

    /// Returns true if `col` has been first-touched
    pub fn is_touched(&self, col: usize) -> bool {
        // SAFETY: reads only the Vec header; callers use this from contexts
        // with no concurrent writer to the slot (tests, post-join checks).
        col < self.n && !unsafe { &*self.cols[col].get() }.is_empty()
    }

    /// Allocates column `col` on the calling thread and fills it from the
    /// row-major `source`
    ///
    /// The buffer (header and data pages) is created entirely on the calling
    /// thread, which is what gives the first-touch placement its effect.
    ///
    /// # Safety
    ///
    /// - `col < self.n()` and `source` is n×n.
    /// - At most one thread may first-touch a given column, and no thread may
    ///   access that column until the touching thread is synchronized-with
    ///   (the engine's post-initialization barrier).
    pub unsafe fn first_touch(&self, col: usize, source: &Matrix) {
        debug_assert!(col < self.n);
        debug_assert_eq!(source.shape(), (self.n, self.n));

        let src = source.as_slice();
        let mut buf = Vec::with_capacity(self.n);
        for row in 0..self.n {
            buf.push(src[row * self.n + col]);
        }
        *self.cols[col].get() = buf;
    }

    /// Shared read access to a finalized pivot column
    ///
    /// # Safety
    ///
    /// - `col < self.n()` and the column was first-touched.
    /// - No thread writes this column for the lifetime of the returned slice,
    ///   and the last write is synchronized-with this thread (gate released).
    pub unsafe fn pivot_column(&self, col: usize) -> &[f64] {
        debug_assert!(col < self.n);
        (*self.cols[col].get()).as_slice()
    }

    /// Exclusive write access to a column owned by the calling thread
    ///
    /// # Safety
    ///
    /// - `col < self.n()` and the column was first-touched.
    /// - The caller is the only thread accessing `col` for the lifetime of
    ///   the returned slice (guaranteed by the cyclic schedule: one writer
    ///   per column per step, and a column is never a pivot while owned).
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn owned_column(&self, col: usize) -> &mut [f64] {
        debug_assert!(col < self.n);
        (*self.cols[col].get()).as_mut_slice()
    }

    /// Safe exclusive access to one column (post-join phases)
    pub fn column_mut(&mut self, col: usize) -> &mut [f64] {
        self.cols[col].get_mut().as_mut_slice()
    }

    /// Safe simultaneous access to a read-only pivot column and a distinct
    /// write target (post-join phases)
    ///
    /// # Panics
    ///
    /// Panics if `pivot == target` or either index is out of bounds.
    pub fn pivot_and_target(&mut self, pivot: usize, target: usize) -> (&[f64], &mut [f64]) {
        assert_ne!(pivot, target, "pivot and target must be distinct columns");
        assert!(pivot < self.n && target < self.n);

        // SAFETY: &mut self gives exclusive access to the whole store and the
        // two columns are distinct, so the borrows cannot alias.
        unsafe {
            let p = (*self.cols[pivot].get()).as_slice();
            let t = (*self.cols[target].get()).as_mut_slice();
            (p, t)
        }
    }

    /// Value at logical position (row, col), if present
    ///
    /// Returns `None` for out-of-bounds indices or untouched columns.
    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.n || col >= self.n {
            return None;
        }
        // SAFETY: shared read with no concurrent writer; this accessor is
        // only reachable outside the engine's parallel region.
        let buf = unsafe { &*self.cols[col].get() };
        buf.get(row).copied()
    }

    /// Exports the store as a row-major [`Matrix`] (index-swap transpose)
    ///
    /// Untouched columns export as zeros.
    pub fn to_matrix(&self) -> Matrix {
        let mut out = Matrix::zeros(self.n, self.n);
        let data = out.as_mut_slice();
        for col in 0..self.n {
            // SAFETY: shared read, quiescent store.
            let buf = unsafe { &*self.cols[col].get() };
            for (row, &v) in buf.iter().enumerate() {
                data[row * self.n + col] = v;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_3x3() -> Matrix {
        Matrix::from_vec(
            3,
            3,
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0],
        )
        .unwrap()
    }

    #[test]
    fn test_new_store_is_untouched() {
        let store = ColumnStore::new(3);
        assert_eq!(store.n(), 3);
        for col in 0..3 {
            assert!(!store.is_touched(col));
            assert_eq!(store.value(0, col), None);
        }
    }

    #[test]
    fn test_first_touch_transposes_source() {
        let m = sample_3x3();
        let store = ColumnStore::new(3);
        unsafe { store.first_touch(1, &m) };

        assert!(store.is_touched(1));
        assert!(!store.is_touched(0));
        // column 1 of the row-major source is [2, 5, 8]
        assert_eq!(store.value(0, 1), Some(2.0));
        assert_eq!(store.value(1, 1), Some(5.0));
        assert_eq!(store.value(2, 1), Some(8.0));
    }

    #[test]
    fn test_from_matrix_round_trips() {
        let m = sample_3x3();
        let store = ColumnStore::from_matrix(&m);
        assert_eq!(store.to_matrix(), m);
    }

    #[test]
    fn test_value_out_of_bounds() {
        let store = ColumnStore::from_matrix(&sample_3x3());
        assert_eq!(store.value(3, 0), None);
        assert_eq!(store.value(0, 3), None);
    }

    #[test]
    fn test_column_mut_writes_through() {
        let mut store = ColumnStore::from_matrix(&sample_3x3());
        store.column_mut(2)[0] = -1.0;
        assert_eq!(store.value(0, 2), Some(-1.0));
    }

    #[test]
    fn test_pivot_and_target_disjoint() {
        let mut store = ColumnStore::from_matrix(&sample_3x3());
        let (pivot, target) = store.pivot_and_target(0, 2);
        assert_eq!(pivot, &[1.0, 4.0, 7.0]);
        target[2] = 0.0;
        assert_eq!(store.value(2, 2), Some(0.0));
    }

    #[test]
    #[should_panic(expected = "distinct columns")]
    fn test_pivot_and_target_same_column_panics() {
        let mut store = ColumnStore::from_matrix(&sample_3x3());
        let _ = store.pivot_and_target(1, 1);
    }

    #[test]
    fn test_parallel_first_touch_by_owners() {
        use crate::schedule::first_touch_columns;
        use std::thread;

        let n = 8;
        let threads = 3;
        let data: Vec<f64> = (0..n * n).map(|i| i as f64).collect();
        let m = Matrix::from_vec(n, n, data).unwrap();
        let store = ColumnStore::new(n);

        thread::scope(|s| {
            for id in 0..threads {
                let store = &store;
                let m = &m;
                s.spawn(move || {
                    for col in first_touch_columns(id, threads, n) {
                        // SAFETY: cyclic split means each column is touched
                        // by exactly one thread; the scope join synchronizes
                        // before any read below.
                        unsafe { store.first_touch(col, m) };
                    }
                });
            }
        });

        assert_eq!(store.to_matrix(), m);
    }
}
