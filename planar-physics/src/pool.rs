// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Memory pooling for reducing allocation churn
//!
//! The world partitions its bodies into islands every step, and each island
//! needs a scratch buffer for its working copies of bodies. This module
//! provides a thread-safe pool of reusable `Vec` buffers so those
//! allocations are paid once rather than every frame. Buffers are handed out
//! behind an RAII guard that returns them on drop, including from rayon
//! worker threads.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Configuration for buffer pool behavior
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Initial capacity for each newly allocated buffer
    pub initial_capacity: usize,
    /// Maximum number of idle buffers to keep in the pool
    pub max_pool_size: usize,
    /// Whether to log when the pool has to allocate
    pub log_resize_events: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            initial_capacity: 16,
            max_pool_size: 64,
            log_resize_events: false,
        }
    }
}

impl PoolConfig {
    /// Create a new pool configuration with custom settings
    pub fn new(initial_capacity: usize, max_pool_size: usize) -> Self {
        PoolConfig {
            initial_capacity,
            max_pool_size,
            log_resize_events: false,
        }
    }

    /// Enable logging for allocation events
    pub fn with_logging(mut self) -> Self {
        self.log_resize_events = true;
        self
    }
}

/// Statistics for monitoring pool performance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoolStats {
    /// Number of times a buffer was successfully borrowed from the pool
    pub hits: usize,
    /// Number of times a new buffer had to be allocated
    pub misses: usize,
    /// Current number of idle buffers in the pool
    pub pool_size: usize,
    /// Peak number of idle buffers ever held
    pub peak_size: usize,
}

impl PoolStats {
    /// Calculate the hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

// A poisoned lock only means another thread panicked mid-update; the buffers
// and counters inside are still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A thread-safe pool of `Vec<T>` buffers
pub struct BufferPool<T> {
    pool: Arc<Mutex<Vec<Vec<T>>>>,
    config: PoolConfig,
    stats: Arc<Mutex<PoolStats>>,
}

impl<T> BufferPool<T> {
    /// Create a new pool with default configuration
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Create a new pool with custom configuration
    pub fn with_config(config: PoolConfig) -> Self {
        BufferPool {
            pool: Arc::new(Mutex::new(Vec::new())),
            config,
            stats: Arc::new(Mutex::new(PoolStats::default())),
        }
    }

    /// Acquire an empty buffer from the pool
    ///
    /// If the pool is empty, allocates a new buffer. The buffer is
    /// automatically returned to the pool when the guard is dropped.
    pub fn acquire(&self) -> PooledBuffer<T> {
        // LOCK ORDERING: Acquire pool lock, get buffer, release lock, then update stats
        let (buffer, was_hit, pool_len) = {
            let mut pool = lock(&self.pool);
            let was_hit = !pool.is_empty();
            let buf = pool
                .pop()
                .unwrap_or_else(|| Vec::with_capacity(self.config.initial_capacity));
            (buf, was_hit, pool.len())
        };

        {
            let mut stats = lock(&self.stats);
            if was_hit {
                stats.hits += 1;
            } else {
                stats.misses += 1;
                if self.config.log_resize_events {
                    log::trace!(
                        "BufferPool: allocating new buffer (hit rate: {:.1}%)",
                        stats.hit_rate()
                    );
                }
            }
            stats.pool_size = pool_len;
        }

        PooledBuffer {
            buffer,
            pool: Arc::clone(&self.pool),
            stats: Arc::clone(&self.stats),
            max_pool_size: self.config.max_pool_size,
        }
    }

    /// Get current pool statistics
    pub fn stats(&self) -> PoolStats {
        lock(&self.stats).clone()
    }

    /// Drop all idle buffers
    pub fn clear(&self) {
        lock(&self.pool).clear();
        lock(&self.stats).pool_size = 0;
    }

    /// Number of idle buffers in the pool
    pub fn len(&self) -> usize {
        lock(&self.pool).len()
    }

    /// Check if the pool holds no idle buffers
    pub fn is_empty(&self) -> bool {
        lock(&self.pool).is_empty()
    }
}

impl<T> Default for BufferPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for BufferPool<T> {
    fn clone(&self) -> Self {
        BufferPool {
            pool: Arc::clone(&self.pool),
            config: self.config.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}

/// RAII guard for a pooled buffer
///
/// When dropped, the buffer is cleared and returned to the pool.
pub struct PooledBuffer<T> {
    buffer: Vec<T>,
    pool: Arc<Mutex<Vec<Vec<T>>>>,
    stats: Arc<Mutex<PoolStats>>,
    max_pool_size: usize,
}

impl<T> Deref for PooledBuffer<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Vec<T> {
        &self.buffer
    }
}

impl<T> DerefMut for PooledBuffer<T> {
    fn deref_mut(&mut self) -> &mut Vec<T> {
        &mut self.buffer
    }
}

impl<T> Drop for PooledBuffer<T> {
    fn drop(&mut self) {
        let mut buffer = std::mem::take(&mut self.buffer);
        buffer.clear();
        let mut pool = lock(&self.pool);
        if pool.len() < self.max_pool_size {
            pool.push(buffer);

            let mut stats = lock(&self.stats);
            stats.pool_size = pool.len();
            if stats.pool_size > stats.peak_size {
                stats.peak_size = stats.pool_size;
            }
        }
        // If pool is full, buffer is dropped (deallocated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_config_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.initial_capacity, 16);
        assert_eq!(config.max_pool_size, 64);
        assert!(!config.log_resize_events);
    }

    #[test]
    fn test_pool_config_custom() {
        let config = PoolConfig::new(128, 4).with_logging();
        assert_eq!(config.initial_capacity, 128);
        assert_eq!(config.max_pool_size, 4);
        assert!(config.log_resize_events);
    }

    #[test]
    fn test_pool_acquire_and_return() {
        let pool: BufferPool<i32> = BufferPool::new();
        assert!(pool.is_empty());

        {
            let mut guard = pool.acquire();
            guard.push(42);
            assert_eq!(guard.len(), 1);
        } // Guard dropped, buffer returned to pool

        assert_eq!(pool.len(), 1);
        let stats = pool.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_pool_reuse_returns_cleared_buffer() {
        let pool: BufferPool<i32> = BufferPool::new();
        {
            let mut guard = pool.acquire();
            guard.extend([1, 2, 3]);
        }
        {
            let guard = pool.acquire();
            assert!(guard.is_empty());
            assert!(guard.capacity() >= 3);
        }

        let stats = pool.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate(), 50.0);
    }

    #[test]
    fn test_pool_max_size() {
        let pool: BufferPool<i32> = BufferPool::with_config(PoolConfig::new(8, 2));
        {
            let _g1 = pool.acquire();
            let _g2 = pool.acquire();
            let _g3 = pool.acquire();
        }
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.stats().peak_size, 2);
    }

    #[test]
    fn test_pool_concurrent_access() {
        use std::thread;

        let pool: BufferPool<usize> = BufferPool::new();
        let pool_clone = pool.clone();

        let handle = thread::spawn(move || {
            let mut guard = pool_clone.acquire();
            guard.push(1);
        });

        let mut guard = pool.acquire();
        guard.push(2);
        handle.join().unwrap();
        drop(guard);

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.stats().misses + pool.stats().hits, 2);
    }

    #[test]
    fn test_pool_clear() {
        let pool: BufferPool<i32> = BufferPool::new();
        {
            let _g1 = pool.acquire();
            let _g2 = pool.acquire();
        }
        assert_eq!(pool.len(), 2);
        pool.clear();
        assert!(pool.is_empty());
        assert_eq!(pool.stats().pool_size, 0);
    }
}
