//! Capacity and pooling configuration
//!
//! Capacities are starting sizes only: every buffer still grows on demand and
//! keeps its grown capacity across resets.

use serde::{Deserialize, Serialize};

/// Initial capacities for one [`ArenaBuilder`](crate::ArenaBuilder)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Nodes in the arena
    pub arena_capacity: usize,
    /// Pending object fields in scratch
    pub field_capacity: usize,
    /// Pending array elements in scratch
    pub element_capacity: usize,
    /// Open scopes per scratch stack before it spills to the heap
    pub stack_capacity: usize,
    /// Frozen object fields
    pub frozen_field_capacity: usize,
    /// Frozen array elements
    pub frozen_element_capacity: usize,
    /// Distinct keys in the string table
    pub string_capacity: usize,
}

impl BuilderConfig {
    /// Small buffers for memory-constrained guests
    pub fn low_memory() -> Self {
        Self {
            arena_capacity: 16,
            field_capacity: 8,
            element_capacity: 8,
            stack_capacity: 4,
            frozen_field_capacity: 16,
            frozen_element_capacity: 16,
            string_capacity: 8,
        }
    }

    /// Large buffers for batches of thousands of records
    pub fn high_throughput() -> Self {
        Self {
            arena_capacity: 16 * 1024,
            field_capacity: 256,
            element_capacity: 256,
            stack_capacity: 16,
            frozen_field_capacity: 8 * 1024,
            frozen_element_capacity: 8 * 1024,
            string_capacity: 128,
        }
    }
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            arena_capacity: 128,
            field_capacity: 32,
            element_capacity: 32,
            stack_capacity: 8,
            frozen_field_capacity: 64,
            frozen_element_capacity: 64,
            string_capacity: 16,
        }
    }
}

/// Configuration for a [`BuilderPool`](crate::BuilderPool)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Idle builders kept for reuse; extras are dropped on release
    pub max_idle: usize,
    /// Capacities for newly created builders
    pub builder: BuilderConfig,
}

impl PoolConfig {
    /// Few small builders
    pub fn low_memory() -> Self {
        Self {
            max_idle: 2,
            builder: BuilderConfig::low_memory(),
        }
    }

    /// Many large builders
    pub fn high_throughput() -> Self {
        Self {
            max_idle: 64,
            builder: BuilderConfig::high_throughput(),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle: 16,
            builder: BuilderConfig::default(),
        }
    }
}
