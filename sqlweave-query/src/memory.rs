//! Reusable render buffers.
//!
//! Rendering allocates a SQL string, an argument vector and a parameter
//! map. [`OutputPool`] keeps released outputs around so hot paths can render
//! without allocating. A borrowed output is returned to its pool when the
//! [`PooledOutput`] guard drops, and is always cleared before reuse.
//!
//! ```rust
//! use sqlweave_query::memory::OutputPool;
//!
//! let pool = OutputPool::new();
//! {
//!     let mut out = pool.get();
//!     out.sql.push_str("SELECT 1");
//! } // returned to the pool here
//!
//! assert_eq!(pool.available(), 1);
//! assert!(pool.get().sql.is_empty());
//! ```

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

use crate::fragment::RenderOutput;

/// Default SQL buffer capacity for new outputs.
pub const DEFAULT_BUFFER_CAPACITY: usize = 256;

/// Outputs whose SQL buffer grew past this are dropped instead of pooled.
pub const DEFAULT_MAX_POOLED_CAPACITY: usize = 4096;

/// A thread-safe pool of [`RenderOutput`]s.
#[derive(Debug)]
pub struct OutputPool {
    outputs: Mutex<Vec<RenderOutput>>,
    default_capacity: usize,
    max_pooled_capacity: usize,
    created: AtomicUsize,
}

impl OutputPool {
    /// Create a pool with default capacities.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY, DEFAULT_MAX_POOLED_CAPACITY)
    }

    /// Create a pool with custom buffer capacities.
    pub fn with_capacity(default_capacity: usize, max_pooled_capacity: usize) -> Self {
        info!(default_capacity, max_pooled_capacity, "OutputPool initialized");
        Self {
            outputs: Mutex::new(Vec::new()),
            default_capacity,
            max_pooled_capacity,
            created: AtomicUsize::new(0),
        }
    }

    /// Borrow an output from the pool, creating one if none is free.
    pub fn get(&self) -> PooledOutput<'_> {
        let output = self.outputs.lock().pop().unwrap_or_else(|| {
            self.created.fetch_add(1, Ordering::Relaxed);
            RenderOutput::with_capacity(self.default_capacity)
        });
        PooledOutput { output, pool: self }
    }

    fn release(&self, mut output: RenderOutput) {
        let capacity = output.sql.capacity();
        if capacity == 0 || capacity > self.max_pooled_capacity {
            crate::sqlweave_trace!(capacity, "render output not returned to pool");
            return;
        }
        output.clear();
        self.outputs.lock().push(output);
    }

    /// Number of outputs waiting in the pool.
    pub fn available(&self) -> usize {
        self.outputs.lock().len()
    }

    /// Pool statistics.
    pub fn stats(&self) -> OutputPoolStats {
        OutputPoolStats {
            available: self.available(),
            created: self.created.load(Ordering::Relaxed),
        }
    }

    /// Drop every pooled output.
    pub fn clear(&self) {
        self.outputs.lock().clear();
    }
}

impl Default for OutputPool {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics for an [`OutputPool`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputPoolStats {
    /// Outputs currently in the pool.
    pub available: usize,
    /// Outputs allocated over the pool's lifetime.
    pub created: usize,
}

/// An output borrowed from an [`OutputPool`].
///
/// Automatically returns to the pool when dropped.
pub struct PooledOutput<'a> {
    output: RenderOutput,
    pool: &'a OutputPool,
}

impl<'a> PooledOutput<'a> {
    /// Take ownership of the output (it will not return to the pool).
    pub fn take(mut self) -> RenderOutput {
        std::mem::take(&mut self.output)
    }
}

impl<'a> std::ops::Deref for PooledOutput<'a> {
    type Target = RenderOutput;

    fn deref(&self) -> &Self::Target {
        &self.output
    }
}

impl<'a> std::ops::DerefMut for PooledOutput<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.output
    }
}

impl<'a> Drop for PooledOutput<'a> {
    fn drop(&mut self) {
        let output = std::mem::take(&mut self.output);
        self.pool.release(output);
    }
}

/// Global output pool used by the top-level render functions.
pub static GLOBAL_OUTPUT_POOL: std::sync::LazyLock<OutputPool> =
    std::sync::LazyLock::new(OutputPool::new);

/// Borrow an output from the global pool.
#[inline]
pub fn get_output() -> PooledOutput<'static> {
    GLOBAL_OUTPUT_POOL.get()
}
