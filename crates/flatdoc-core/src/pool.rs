//! Reusable builder pool
//!
//! A [`BuilderPool`] hands out [`PooledBuilder`] guards. Dropping a guard
//! resets the builder together with its string table and puts it back on the
//! idle list, so capacity grown by one batch is reused by the next. Release
//! happens on every exit path, including `?` returns and unwinding.

use std::{
    fmt,
    ops::{Deref, DerefMut},
    sync::Arc,
};

use parking_lot::Mutex;

use crate::{builder::ArenaBuilder, config::PoolConfig, strings::StringTable};

/// Thread-safe pool of [`ArenaBuilder`]s; cloning shares the same pool
#[derive(Clone)]
pub struct BuilderPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    config: PoolConfig,
    state: Mutex<PoolState>,
}

#[derive(Default)]
struct PoolState {
    idle: Vec<ArenaBuilder>,
    created: u64,
    reused: u64,
    returned: u64,
    discarded: u64,
}

/// Snapshot of pool activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Builders allocated because the idle list was empty
    pub created: u64,
    /// Acquisitions served from the idle list
    pub reused: u64,
    /// Releases that went back onto the idle list
    pub returned: u64,
    /// Releases dropped because the idle list was full
    pub discarded: u64,
    /// Builders currently idle
    pub idle: usize,
}

impl PoolStats {
    /// Share of acquisitions served by reuse
    pub fn hit_ratio(&self) -> f64 {
        let total = self.created + self.reused;
        if total == 0 {
            0.0
        } else {
            self.reused as f64 / total as f64
        }
    }
}

impl BuilderPool {
    /// Create an empty pool; builders are allocated on demand
    pub fn new(config: PoolConfig) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                state: Mutex::new(PoolState {
                    idle: Vec::with_capacity(config.max_idle),
                    ..PoolState::default()
                }),
                config,
            }),
        }
    }

    /// Take an idle builder or create a new one.
    ///
    /// The builder comes with a string table attached and empty buffers.
    pub fn acquire(&self) -> PooledBuilder {
        let reused = {
            let mut state = self.inner.state.lock();
            let builder = state.idle.pop();
            if builder.is_some() {
                state.reused += 1;
            } else {
                state.created += 1;
            }
            builder
        };

        let was_reused = reused.is_some();
        let builder = reused.unwrap_or_else(|| self.inner.fresh_builder());
        tracing::trace!(reused = was_reused, "builder acquired");

        PooledBuilder {
            builder: Some(builder),
            pool: Arc::clone(&self.inner),
        }
    }

    /// Counters since the pool was created
    pub fn stats(&self) -> PoolStats {
        let state = self.inner.state.lock();
        PoolStats {
            created: state.created,
            reused: state.reused,
            returned: state.returned,
            discarded: state.discarded,
            idle: state.idle.len(),
        }
    }

    /// Number of builders waiting for reuse
    pub fn idle_count(&self) -> usize {
        self.inner.state.lock().idle.len()
    }

    /// Pool configuration
    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }
}

impl Default for BuilderPool {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

impl fmt::Debug for BuilderPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuilderPool")
            .field("config", &self.inner.config)
            .field("stats", &self.stats())
            .finish()
    }
}

impl PoolInner {
    fn fresh_builder(&self) -> ArenaBuilder {
        let config = &self.config.builder;
        ArenaBuilder::with_config(config)
            .with_string_table(StringTable::with_capacity(config.string_capacity))
    }

    fn release(&self, mut builder: ArenaBuilder) {
        builder.reset_all();
        if builder.string_table().is_none() {
            builder.use_string_table(StringTable::with_capacity(
                self.config.builder.string_capacity,
            ));
        }

        let mut state = self.state.lock();
        if state.idle.len() < self.config.max_idle {
            state.idle.push(builder);
            state.returned += 1;
            tracing::trace!(idle = state.idle.len(), "builder released");
        } else {
            state.discarded += 1;
            tracing::debug!(
                max_idle = self.config.max_idle,
                "idle list full, discarding builder"
            );
        }
    }
}

/// Builder on loan from a [`BuilderPool`], returned when dropped
pub struct PooledBuilder {
    builder: Option<ArenaBuilder>,
    pool: Arc<PoolInner>,
}

impl Deref for PooledBuilder {
    type Target = ArenaBuilder;

    fn deref(&self) -> &ArenaBuilder {
        match &self.builder {
            Some(builder) => builder,
            None => unreachable!("pooled builder accessed after release"),
        }
    }
}

impl DerefMut for PooledBuilder {
    fn deref_mut(&mut self) -> &mut ArenaBuilder {
        match &mut self.builder {
            Some(builder) => builder,
            None => unreachable!("pooled builder accessed after release"),
        }
    }
}

impl fmt::Debug for PooledBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PooledBuilder").field(&self.builder).finish()
    }
}

impl Drop for PooledBuilder {
    fn drop(&mut self) {
        if let Some(builder) = self.builder.take() {
            self.pool.release(builder);
        }
    }
}
