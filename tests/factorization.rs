//! End-to-end factorization suite
//!
//! Exercises the three kernels through the public API, the way the binaries
//! drive them: generate or load a matrix, factorize, serialize, compare.
//!
//! Coverage:
//! - Kernel agreement (serial / fork-join / pipelined) across thread counts
//! - Round-trip law: L·U reproduces the input
//! - The full binary pipeline: write file, read, factorize, write, compare
//! - Boundary sizes, thread-count clamping, singular inputs

use proptest::prelude::*;

use columna::io::{self, Comparison};
use columna::{reference, LuFactors, Matrix};

const PROPTEST_CASES: u32 = 48;

/// Random matrix with a bumped diagonal: elimination without pivoting is
/// guaranteed well conditioned, values keep a realistic spread.
fn dominant_matrix(n: usize, seed: u64) -> Matrix {
    let mut m = io::random_matrix(n, seed);
    let bump = 100.0 * n as f64;
    for i in 0..n {
        m.as_mut_slice()[i * n + i] += bump;
    }
    m
}

// ============================================================================
// KERNEL AGREEMENT
// ============================================================================

#[test]
fn pipelined_matches_serial_for_every_thread_count() {
    let n = 24;
    let a = dominant_matrix(n, 3);
    let serial = reference::lu_serial(&a).unwrap();

    for threads in 1..=n {
        let lu = LuFactors::compute(&a, threads).unwrap();
        // Same per-entry update order in every schedule: the packed results
        // are identical, not merely close.
        assert_eq!(serial, lu.to_matrix(), "threads={threads}");
    }
}

#[test]
fn fork_join_matches_serial() {
    let a = dominant_matrix(33, 4);
    assert_eq!(
        reference::lu_serial(&a).unwrap(),
        reference::lu_fork_join(&a).unwrap()
    );
}

#[test]
fn repeated_pipelined_runs_are_stable() {
    // Re-running the same factorization must always land on the same bytes;
    // a scheduling race would show up here as a flaky mismatch.
    let a = dominant_matrix(24, 5);
    let first = LuFactors::compute(&a, 8).unwrap().to_matrix();
    for _ in 0..50 {
        let again = LuFactors::compute(&a, 8).unwrap().to_matrix();
        assert_eq!(first, again);
    }
}

// ============================================================================
// ROUND-TRIP LAW
// ============================================================================

#[test]
fn reconstruction_reproduces_input() {
    for (n, threads) in [(5, 2), (12, 4), (20, 7), (31, 8)] {
        let a = dominant_matrix(n, n as u64);
        let lu = LuFactors::compute(&a, threads).unwrap();
        let back = lu.reconstruct().unwrap();
        let diff = a.max_abs_diff(&back).unwrap();
        assert!(diff < 1e-6, "n={n} threads={threads} diff={diff}");
    }
}

#[test]
fn factors_have_triangular_shape() {
    let a = dominant_matrix(9, 1);
    let lu = LuFactors::compute(&a, 3).unwrap();
    let l = lu.l();
    let u = lu.u();

    for i in 0..9 {
        assert_eq!(l.get(i, i), Some(&1.0));
        for j in i + 1..9 {
            assert_eq!(l.get(i, j), Some(&0.0));
            assert_eq!(u.get(j, i), Some(&0.0));
        }
    }
}

// ============================================================================
// FULL BINARY PIPELINE
// ============================================================================

#[test]
fn identity_pipeline_matches_reference_file() {
    // Identity in, identity out; the comparator sees all 25 values match.
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("n5.mat");
    let result = dir.path().join("result.mat");
    let expected = dir.path().join("expected.mat");

    io::write_matrix(&input, &Matrix::identity(5)).unwrap();
    io::write_matrix(&expected, &Matrix::identity(5)).unwrap();

    let matrix = io::read_matrix(&input, 5).unwrap();
    let lu = LuFactors::compute(&matrix, 4).unwrap();
    io::write_matrix(&result, &lu.to_matrix()).unwrap();

    assert_eq!(
        io::compare_files(&result, &expected).unwrap(),
        Comparison::Match { values: 25 }
    );
}

#[test]
fn comparator_flags_diverging_results() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.mat");
    let b = dir.path().join("b.mat");

    let matrix = dominant_matrix(4, 9);
    io::write_matrix(&a, &reference::lu_serial(&matrix).unwrap()).unwrap();
    io::write_matrix(&b, &matrix).unwrap(); // unfactorized

    assert!(matches!(
        io::compare_files(&a, &b).unwrap(),
        Comparison::Mismatch { .. }
    ));
}

#[test]
fn kernel_output_files_are_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let serial_file = dir.path().join("serial.mat");
    let piped_file = dir.path().join("piped.mat");

    let a = dominant_matrix(16, 2);
    io::write_matrix(&serial_file, &reference::lu_serial(&a).unwrap()).unwrap();
    io::write_matrix(&piped_file, &LuFactors::compute(&a, 4).unwrap().to_matrix()).unwrap();

    assert_eq!(
        io::compare_files(&serial_file, &piped_file).unwrap(),
        Comparison::Match { values: 256 }
    );
}

// ============================================================================
// BOUNDARIES AND DEGENERATE INPUTS
// ============================================================================

#[test]
fn single_entry_matrix_is_unchanged() {
    let a = Matrix::from_vec(1, 1, vec![3.25]).unwrap();
    let lu = LuFactors::compute(&a, 4).unwrap();
    assert_eq!(lu.to_matrix(), a);
    assert_eq!(lu.l(), Matrix::identity(1));
    assert_eq!(lu.u(), a);
}

#[test]
fn oversized_thread_request_is_clamped() {
    let a = dominant_matrix(6, 8);
    let lu = LuFactors::compute(&a, 1000).unwrap();
    assert_eq!(lu.threads(), 6);
    assert_eq!(lu.to_matrix(), reference::lu_serial(&a).unwrap());
}

#[test]
fn singular_sequential_matrix_never_hangs() {
    // Rows [1..5], [6..10], ...: rank 2, exact zero pivot at step 2. The
    // kernels push non-finite values through instead of crashing or
    // deadlocking.
    let a = io::sequential_matrix(5);

    for threads in 1..=5 {
        let lu = LuFactors::compute(&a, threads).unwrap();
        assert!(
            lu.to_matrix().as_slice().iter().any(|v| !v.is_finite()),
            "threads={threads}"
        );
    }
    assert!(reference::lu_serial(&a)
        .unwrap()
        .as_slice()
        .iter()
        .any(|v| !v.is_finite()));
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(PROPTEST_CASES))]

    /// Any size, any seed, any thread count: the pipelined schedule agrees
    /// with the serial baseline exactly.
    #[test]
    fn prop_schedule_independence(
        n in 1usize..24,
        seed in 0u64..1000,
        threads in 1usize..16,
    ) {
        let a = dominant_matrix(n, seed);
        let serial = reference::lu_serial(&a).unwrap();
        let lu = LuFactors::compute(&a, threads).unwrap();
        prop_assert_eq!(serial, lu.to_matrix());
    }

    /// L·U reproduces the input within accumulated rounding error.
    #[test]
    fn prop_reconstruction_round_trip(
        n in 1usize..20,
        seed in 0u64..1000,
        threads in 1usize..8,
    ) {
        let a = dominant_matrix(n, seed);
        let lu = LuFactors::compute(&a, threads).unwrap();
        let back = lu.reconstruct().unwrap();
        let diff = a.max_abs_diff(&back).unwrap();
        prop_assert!(diff < 1e-6, "diff={diff}");
    }
}
