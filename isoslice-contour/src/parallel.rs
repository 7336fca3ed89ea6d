//! Thread pool and fork-join helpers for contouring sweeps
//!
//! Sweeps split the element range into chunks. Each chunk fills its own
//! output vector and the vectors are concatenated in chunk order once the
//! parallel region ends, so no lock is taken on the hot path.

use isoslice_core::{Error, Result};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::ops::Range;
use std::sync::{Arc, OnceLock, RwLock};

/// Dedicated sweep pool; `None` when building it failed and rayon's global pool is used
static SWEEP_POOL: OnceLock<Option<Arc<ThreadPool>>> = OnceLock::new();
static SWEEP_CONFIG: RwLock<ThreadPoolConfig> = RwLock::new(ThreadPoolConfig::new());

/// Sizing of the sweep pool and of the chunks handed to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadPoolConfig {
    /// Worker count, `None` for one per logical CPU
    pub num_threads: Option<usize>,
    /// Run sweeps on the pool; when off they stay on the calling thread
    pub enabled: bool,
    /// Smallest chunk of elements worth a task
    pub min_chunk_size: usize,
    pub max_chunk_size: usize,
    /// Aim for several chunks per worker instead of one
    pub adaptive_chunks: bool,
}

impl ThreadPoolConfig {
    const fn new() -> Self {
        Self {
            num_threads: None,
            enabled: true,
            min_chunk_size: 64,
            max_chunk_size: 4096,
            adaptive_chunks: true,
        }
    }

    /// Set number of threads
    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    /// Enable or disable parallel sweeps
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the bounds of adaptive chunk sizes
    pub fn with_chunk_size_range(mut self, min: usize, max: usize) -> Self {
        self.min_chunk_size = min;
        self.max_chunk_size = max;
        self
    }

    /// Scale chunk sizes with the pool size
    pub fn with_adaptive_chunks(mut self, adaptive: bool) -> Self {
        self.adaptive_chunks = adaptive;
        self
    }

    /// Check thread count and chunk bounds
    pub fn validate(&self) -> Result<()> {
        if self.num_threads == Some(0) {
            return Err(Error::InvalidConfig(
                "Thread count must be at least 1".to_string(),
            ));
        }
        if self.min_chunk_size == 0 || self.min_chunk_size > self.max_chunk_size {
            return Err(Error::InvalidConfig(format!(
                "Invalid chunk size range {}..{}",
                self.min_chunk_size, self.max_chunk_size
            )));
        }
        Ok(())
    }
}

impl Default for ThreadPoolConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn build_pool(config: &ThreadPoolConfig) -> Result<ThreadPool> {
    let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("isoslice-sweep-{i}"));
    if let Some(num_threads) = config.num_threads {
        builder = builder.num_threads(num_threads);
    }
    builder
        .build()
        .map_err(|e| Error::Algorithm(format!("Failed to create thread pool: {}", e)))
}

/// Configure the sweep pool before the first sweep runs
///
/// Once a sweep has created the pool only the chunking settings change.
pub fn init_thread_pool(config: ThreadPoolConfig) -> Result<()> {
    config.validate()?;
    if SWEEP_POOL.get().is_none() {
        let pool = build_pool(&config)?;
        // a concurrent first sweep may have won the race; keep its pool
        let _ = SWEEP_POOL.set(Some(Arc::new(pool)));
    }
    if let Ok(mut current) = SWEEP_CONFIG.write() {
        *current = config;
    }
    Ok(())
}

/// The sweep pool, built with defaults on first use
pub fn get_thread_pool() -> Option<Arc<ThreadPool>> {
    SWEEP_POOL
        .get_or_init(|| {
            build_pool(&get_config())
                .map(Arc::new)
                .map_err(|e| tracing::warn!("falling back to the rayon global pool: {}", e))
                .ok()
        })
        .clone()
}

/// Current sweep configuration
pub fn get_config() -> ThreadPoolConfig {
    SWEEP_CONFIG
        .read()
        .map(|config| config.clone())
        .unwrap_or_default()
}

/// Whether sweeps run on the thread pool
pub fn is_parallel_enabled() -> bool {
    get_config().enabled
}

fn worker_count() -> usize {
    get_thread_pool()
        .map_or_else(rayon::current_num_threads, |pool| pool.current_num_threads())
        .max(1)
}

/// Elements per chunk for a sweep over `len` elements
pub fn compute_chunk_size(len: usize) -> usize {
    let config = get_config();
    let per_worker = if config.adaptive_chunks {
        len / (worker_count() * 4)
    } else {
        len / worker_count()
    };
    per_worker.clamp(config.min_chunk_size, config.max_chunk_size)
}

/// Run `op` inside the sweep pool
pub fn execute_parallel<F, R>(op: F) -> R
where
    F: FnOnce() -> R + Send,
    R: Send,
{
    match get_thread_pool() {
        Some(pool) if is_parallel_enabled() => pool.install(op),
        _ => op(),
    }
}

/// Map over a slice in parallel, keeping order
pub fn parallel_map<T, U, F>(data: &[T], f: F) -> Vec<U>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> U + Sync + Send,
{
    if !is_parallel_enabled() || data.len() < get_config().min_chunk_size {
        return data.iter().map(f).collect();
    }
    execute_parallel(|| data.par_iter().map(f).collect())
}

/// Map and reduce a slice in parallel
pub fn parallel_reduce<T, U, F, R>(data: &[T], identity: U, map_op: F, reduce_op: R) -> U
where
    T: Sync,
    U: Clone + Send + Sync,
    F: Fn(&T) -> U + Sync + Send,
    R: Fn(U, U) -> U + Sync + Send,
{
    if !is_parallel_enabled() || data.len() < get_config().min_chunk_size {
        return data.iter().map(map_op).fold(identity, reduce_op);
    }
    execute_parallel(|| {
        data.par_iter()
            .map(map_op)
            .reduce(|| identity.clone(), reduce_op)
    })
}

/// Run `f` over index chunks of `0..len` and concatenate the chunk outputs
///
/// Chunk outputs keep index order. `f` returns `None` to abandon the whole
/// run, in which case the result is `None` as well.
pub fn parallel_chunks<U, F>(len: usize, f: F) -> Option<Vec<U>>
where
    U: Send,
    F: Fn(Range<usize>) -> Option<Vec<U>> + Sync + Send,
{
    if len == 0 {
        return Some(Vec::new());
    }

    let chunk_size = compute_chunk_size(len).max(1);
    let ranges: Vec<Range<usize>> = (0..len)
        .step_by(chunk_size)
        .map(|start| start..(start + chunk_size).min(len))
        .collect();

    let parts: Option<Vec<Vec<U>>> = if !is_parallel_enabled() || ranges.len() == 1 {
        ranges.into_iter().map(&f).collect()
    } else {
        execute_parallel(|| ranges.into_par_iter().map(&f).collect())
    };

    parts.map(|parts| parts.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_pool_config() {
        let config = ThreadPoolConfig::default()
            .with_threads(4)
            .with_adaptive_chunks(false)
            .with_enabled(true);

        assert_eq!(config.num_threads, Some(4));
        assert!(!config.adaptive_chunks);
        assert!(config.enabled);
        assert!(config.validate().is_ok());
        assert!(config.clone().with_threads(0).validate().is_err());
        assert!(config.with_chunk_size_range(10, 5).validate().is_err());
    }

    #[test]
    fn test_chunk_size_computation() {
        let chunk_size = compute_chunk_size(100_000);
        let config = get_config();

        assert!(chunk_size >= config.min_chunk_size);
        assert!(chunk_size <= config.max_chunk_size);
    }

    #[test]
    fn test_parallel_map() {
        let data: Vec<u32> = (0..500).collect();
        let result = parallel_map(&data, |x| x * 2);
        assert_eq!(result[..5], [0, 2, 4, 6, 8]);
        assert_eq!(result.len(), 500);
    }

    #[test]
    fn test_parallel_reduce() {
        let data: Vec<u64> = (1..=1000).collect();
        let sum = parallel_reduce(&data, 0, |x| *x, |a, b| a + b);
        assert_eq!(sum, 500_500);
    }

    #[test]
    fn test_parallel_chunks_keep_order() {
        let out = parallel_chunks(10_000, |range| Some(range.collect::<Vec<_>>())).unwrap();
        assert_eq!(out, (0..10_000).collect::<Vec<_>>());
        assert_eq!(parallel_chunks::<usize, _>(0, |_| None), Some(Vec::new()));
    }

    #[test]
    fn test_parallel_chunks_abandon() {
        let out = parallel_chunks(10_000, |range| {
            if range.contains(&5_000) {
                None
            } else {
                Some(vec![range.start])
            }
        });
        assert!(out.is_none());
    }
}
