//! Columna: Pipelined Dense LU Factorization
//!
//! **Columna** (Spanish: "column") computes the Doolittle LU factorization
//! of dense square matrices without pivoting, through three kernels:
//!
//! 1. **Serial** - the plain triple loop, the correctness baseline
//! 2. **Fork-join** - per-step parallel trailing update on the rayon pool
//! 3. **Pipelined** - column-cyclic worker threads synchronized by
//!    per-column ready gates instead of per-step barriers
//!
//! # Design Principles
//!
//! - **Fixed column ownership**: each column is updated by one worker across
//!   all steps, derived from a pure cyclic rule with no shared scheduler state
//! - **First-touch storage**: every worker allocates and fills the columns it
//!   owns, keeping its working set in memory it touched first
//! - **One barrier, then gates**: after initialization the only blocking is a
//!   wait for the next pivot column to be normalized, so consecutive
//!   elimination steps overlap across workers
//! - **Bit-identical kernels**: all kernels apply the same updates in the same
//!   per-entry order, so their serialized results can be compared byte for
//!   byte
//!
//! # Quick Start
//!
//! ```rust
//! use columna::{LuFactors, Matrix};
//!
//! let a = Matrix::from_vec(3, 3, vec![
//!     2.0, 1.0, 1.0,
//!     4.0, 3.0, 3.0,
//!     8.0, 7.0, 9.0,
//! ]).unwrap();
//!
//! let lu = LuFactors::compute(&a, 4).unwrap();
//! let product = lu.reconstruct().unwrap();
//! assert!(a.max_abs_diff(&product).unwrap() < 1e-12);
//! ```

pub mod engine;
pub mod error;
pub mod gate;
pub mod io;
pub mod matrix;
pub mod reference;
pub mod schedule;
pub mod store;

pub use engine::LuFactors;
pub use error::{ColumnaError, Result};
pub use gate::ReadyGate;
pub use matrix::Matrix;
pub use store::ColumnStore;

/// Factorization kernel selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Single-threaded baseline
    Serial,
    /// Rayon fork/join with a full barrier per elimination step
    ForkJoin,
    /// Gate-pipelined worker pool
    #[default]
    Pipelined,
}

impl Mode {
    /// All modes, in baseline-to-pipelined order
    pub const ALL: [Mode; 3] = [Mode::Serial, Mode::ForkJoin, Mode::Pipelined];

    /// The name accepted by [`Mode::from_str`]
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Serial => "serial",
            Mode::ForkJoin => "forkjoin",
            Mode::Pipelined => "pipelined",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Mode {
    type Err = ColumnaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "serial" => Ok(Mode::Serial),
            "forkjoin" => Ok(Mode::ForkJoin),
            "pipelined" => Ok(Mode::Pipelined),
            other => Err(ColumnaError::InvalidInput(format!(
                "Unknown mode '{other}', expected serial, forkjoin, or pipelined"
            ))),
        }
    }
}

/// Clamps a requested worker count to what a factorization can use
///
/// At least one worker always runs. More workers than columns would leave
/// the extras with nothing to own, and the pipelined engine's serial
/// tail of `threads - 1` columns must not swallow the whole matrix, so the
/// count is capped at `n`.
///
/// # Examples
///
/// ```
/// use columna::clamp_threads;
///
/// assert_eq!(clamp_threads(4, 100), 4);
/// assert_eq!(clamp_threads(0, 100), 1);
/// assert_eq!(clamp_threads(16, 3), 3);
/// ```
pub fn clamp_threads(requested: usize, n: usize) -> usize {
    requested.clamp(1, n.max(1))
}
