//! # Error Types
//!
//! Everything that can go wrong in the storage layer.
//!
//! Stale handles on the defensive accessors (`try_get`, `contains`, `erase`)
//! are not errors and never show up here. Only the trusting accessors and the
//! allocation paths report through these types.

use thiserror::Error;

/// Errors raised by chunked pools and their allocators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Chunk sizes must be non-zero powers of two (index split is shift/mask).
    #[error("chunk size {0} is not a non-zero power of two")]
    ChunkSizeNotPowerOfTwo(usize),

    /// The allocator could not provide memory for a new chunk.
    #[error("chunk allocation of {bytes} bytes failed")]
    AllocationFailed {
        /// Size of the failed request.
        bytes: usize,
    },

    /// Growing would exceed the addressable element count.
    #[error("capacity overflow: {requested} elements requested")]
    CapacityOverflow {
        /// Total element count that was requested.
        requested: usize,
    },
}

/// Result type for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;

/// Errors raised by slot maps.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotMapError {
    /// The key's index does not name an occupied slot.
    #[error("slot index {index} is out of range (slot table holds {len})")]
    OutOfRange {
        /// Index carried by the key.
        index: u32,
        /// Current slot table size.
        len: usize,
    },

    /// The slot exists but is on the free list.
    #[error("slot {index} is vacant")]
    Vacant {
        /// Index carried by the key.
        index: u32,
    },

    /// The slot exists but its generation no longer matches the key.
    #[error("stale key: slot {index} expected generation {expected}, key has {found}")]
    StaleKey {
        /// Index carried by the key.
        index: u32,
        /// Generation currently stored in the slot.
        expected: u32,
        /// Generation carried by the key.
        found: u32,
    },

    /// No more keys can be issued (slot indices are 32-bit).
    #[error("slot map is full: {0} slots")]
    Exhausted(usize),

    /// Backing storage could not grow.
    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// Result type for slot map operations.
pub type SlotMapResult<T> = Result<T, SlotMapError>;

/// Errors raised by the entity manager and component registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// The entity handle is stale or was never issued.
    #[error("entity {index}:{generation} is not alive")]
    DeadEntity {
        /// Slot index of the handle.
        index: u32,
        /// Generation of the handle.
        generation: u32,
    },

    /// Component type was used before being registered.
    #[error("component type `{0}` is not registered")]
    UnregisteredComponent(&'static str),

    /// The entity does not carry this component.
    #[error("entity {index}:{generation} has no `{component}` component")]
    MissingComponent {
        /// Slot index of the handle.
        index: u32,
        /// Generation of the handle.
        generation: u32,
        /// Type name of the component.
        component: &'static str,
    },

    /// The registry is already at its configured limit.
    #[error("component registry is full: {max} types")]
    TooManyComponentTypes {
        /// Configured maximum.
        max: usize,
    },

    /// The storage configuration was rejected.
    #[error("invalid entity manager config: {0}")]
    InvalidConfig(String),

    /// Underlying slot map failure.
    #[error(transparent)]
    SlotMap(#[from] SlotMapError),
}

/// Result type for entity manager operations.
pub type EcsResult<T> = Result<T, EcsError>;

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field holds an unusable value.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;
