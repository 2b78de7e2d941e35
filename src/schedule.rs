//! Cyclic column-to-thread assignment, expressed as pure functions.
//!
//! The elimination engine distributes trailing columns over workers in a
//! fixed cyclic pattern: worker `id` owns every column congruent to `id`
//! modulo the worker count. Ownership of *work on* a column is re-derived
//! from these functions at every elimination step; the underlying storage
//! buffer never changes hands. Keeping the assignment a pure function (rather
//! than mutable loop state) makes the schedule independently testable: the
//! per-step ownership sets of distinct workers are provably disjoint, which
//! is what lets the engine update the trailing submatrix without a lock per
//! column.

/// First column owned by `thread_id` at elimination step `step`
///
/// This is the smallest column index strictly greater than `step` that is
/// congruent to `thread_id` modulo `threads`. Columns at or before `step`
/// are already finalized and receive no further updates.
///
/// `threads` must be non-zero and `thread_id < threads`.
///
/// # Example
///
/// ```
/// use columna::schedule::first_owned_column;
///
/// // 4 workers at step 5: worker 1 next touches column 9, worker 2 column 6
/// assert_eq!(first_owned_column(5, 1, 4), 9);
/// assert_eq!(first_owned_column(5, 2, 4), 6);
/// ```
pub fn first_owned_column(step: usize, thread_id: usize, threads: usize) -> usize {
    debug_assert!(threads > 0);
    debug_assert!(thread_id < threads);

    let base = (step / threads) * threads + thread_id;
    if base <= step {
        base + threads
    } else {
        base
    }
}

/// Columns worker `thread_id` updates at elimination step `step`
///
/// Lazy ascending sequence starting at [`first_owned_column`] and stepping by
/// `threads`, bounded by the matrix size `n`. Across all `thread_id` values
/// the sequences partition the trailing columns `step+1..n`: every trailing
/// column appears in exactly one worker's sequence, so at most one worker
/// writes a given column during a given step.
///
/// # Example
///
/// ```
/// use columna::schedule::owned_columns;
///
/// let cols: Vec<usize> = owned_columns(2, 0, 3, 10).collect();
/// assert_eq!(cols, vec![3, 6, 9]);
/// ```
pub fn owned_columns(
    step: usize,
    thread_id: usize,
    threads: usize,
    n: usize,
) -> impl Iterator<Item = usize> {
    (first_owned_column(step, thread_id, threads)..n).step_by(threads)
}

/// Columns worker `thread_id` first-touches during initialization
///
/// Plain cyclic split of `0..n`: worker `id` allocates and fills columns
/// `id, id+threads, id+2*threads, ...`. The same worker later performs the
/// step-0 work on those columns, so the buffers are touched first on the
/// execution context that uses them first.
pub fn first_touch_columns(
    thread_id: usize,
    threads: usize,
    n: usize,
) -> impl Iterator<Item = usize> {
    debug_assert!(threads > 0);
    (thread_id..n).step_by(threads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    /// Original formulation of the starting column, kept as an oracle:
    /// round `step` down to a multiple of `threads`, add the worker offset,
    /// and bump by one cycle if that lands at or before `step`.
    fn first_owned_column_oracle(step: usize, thread_id: usize, threads: usize) -> usize {
        let mut start = (step / threads) * threads;
        if start + thread_id <= step {
            start += threads;
        }
        start + thread_id
    }

    #[test]
    fn test_first_owned_matches_oracle() {
        for threads in 1..9 {
            for step in 0..64 {
                for id in 0..threads {
                    assert_eq!(
                        first_owned_column(step, id, threads),
                        first_owned_column_oracle(step, id, threads),
                        "step={step} id={id} threads={threads}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_first_owned_is_strictly_after_step() {
        for threads in 1..9 {
            for step in 0..64 {
                for id in 0..threads {
                    let col = first_owned_column(step, id, threads);
                    assert!(col > step, "step={step} id={id} threads={threads} col={col}");
                    assert_eq!(col % threads, id % threads);
                }
            }
        }
    }

    #[test]
    fn test_single_thread_owns_everything() {
        let cols: Vec<usize> = owned_columns(3, 0, 1, 8).collect();
        assert_eq!(cols, vec![4, 5, 6, 7]);
    }

    #[test]
    fn test_owned_columns_partition_trailing_submatrix() {
        for threads in 1..7 {
            for n in [1usize, 2, 5, 16, 33] {
                for step in 0..n {
                    let mut seen = BTreeSet::new();
                    for id in 0..threads {
                        for col in owned_columns(step, id, threads, n) {
                            assert!(
                                seen.insert(col),
                                "column {col} owned twice at step {step} (threads={threads})"
                            );
                        }
                    }
                    let expected: BTreeSet<usize> = (step + 1..n).collect();
                    assert_eq!(seen, expected, "step={step} threads={threads} n={n}");
                }
            }
        }
    }

    #[test]
    fn test_first_touch_columns_cover_all() {
        let threads = 3;
        let n = 10;
        let mut seen = BTreeSet::new();
        for id in 0..threads {
            for col in first_touch_columns(id, threads, n) {
                assert!(seen.insert(col));
            }
        }
        assert_eq!(seen.len(), n);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(128))]

            /// No two workers ever own the same column at the same step,
            /// and together they own exactly the trailing columns.
            #[test]
            fn prop_ownership_disjoint_and_complete(
                threads in 1usize..12,
                n in 1usize..96,
                step_seed in 0usize..96,
            ) {
                let step = step_seed % n;
                let mut seen = BTreeSet::new();
                for id in 0..threads {
                    for col in owned_columns(step, id, threads, n) {
                        prop_assert!(col > step);
                        prop_assert!(col < n);
                        prop_assert!(seen.insert(col), "column {} owned twice", col);
                    }
                }
                prop_assert_eq!(seen.len(), n - step - 1);
            }

            /// The race-relevant configurations from the concurrency
            /// property: 4 and 8 workers over a grid of steps.
            #[test]
            fn prop_no_shared_writer_at_common_thread_counts(
                n in 9usize..64,
                step_seed in 0usize..64,
            ) {
                for threads in [4usize, 8] {
                    let step = step_seed % n;
                    let mut seen = BTreeSet::new();
                    for id in 0..threads {
                        for col in owned_columns(step, id, threads, n) {
                            prop_assert!(seen.insert(col));
                        }
                    }
                }
            }
        }
    }
}
