use rayon::prelude::*;
use thiserror::Error;

/// Number of samples above which [`ExecutionStrategy::Auto`] runs in parallel.
pub const AUTO_PARALLEL_MIN_SAMPLES: usize = 100_000;

/// Errors that can occur during parallel execution.
#[derive(Error, Debug, PartialEq)]
pub enum ParallelError {
    /// The thread pool failed to build.
    #[error("failed to build thread pool: {0}")]
    BuildError(String),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),
}

/// Controls how the independent lines and rows of a filter pass are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExecutionStrategy {
    /// Run in parallel on the global Rayon pool for buffers of at least
    /// [`AUTO_PARALLEL_MIN_SAMPLES`] samples, serially otherwise.
    #[default]
    Auto,

    /// Run sequentially on the current thread. Results are bit-identical to the parallel
    /// strategies.
    Serial,

    /// Always use the global Rayon thread pool.
    Parallel,

    /// Run on a local thread pool with `n` threads.
    ///
    /// The pool is built anew for each filter call and dropped afterwards.
    Fixed(usize),
}

impl ExecutionStrategy {
    /// Whether a buffer of `num_samples` samples is processed in parallel.
    pub fn is_parallel(&self, num_samples: usize) -> bool {
        match self {
            ExecutionStrategy::Serial => false,
            ExecutionStrategy::Parallel | ExecutionStrategy::Fixed(_) => true,
            ExecutionStrategy::Auto => num_samples >= AUTO_PARALLEL_MIN_SAMPLES,
        }
    }

    /// Run `op` under this strategy.
    ///
    /// [`ExecutionStrategy::Fixed`] installs a local thread pool for the duration of `op`, the
    /// other strategies run `op` on the calling thread.
    pub fn run<R, F>(&self, op: F) -> Result<R, ParallelError>
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match *self {
            ExecutionStrategy::Fixed(n) => {
                if n == 0 {
                    return Err(ParallelError::InvalidThreadCount(n));
                }
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| ParallelError::BuildError(e.to_string()))?;
                Ok(pool.install(op))
            }
            _ => Ok(op()),
        }
    }
}

/// Fill `dst` chunk by chunk, calling `f(chunk_index, chunk)` for every chunk of `chunk_len`
/// samples.
///
/// PRECONDITION: `chunk_len > 0`.
pub fn for_each_chunk_mut<T, F>(strategy: ExecutionStrategy, dst: &mut [T], chunk_len: usize, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Send + Sync,
{
    if strategy.is_parallel(dst.len()) {
        dst.par_chunks_mut(chunk_len)
            .enumerate()
            .for_each(|(i, chunk)| f(i, chunk));
    } else {
        dst.chunks_mut(chunk_len)
            .enumerate()
            .for_each(|(i, chunk)| f(i, chunk));
    }
}
