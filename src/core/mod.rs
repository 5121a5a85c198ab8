//! Core error definitions shared across the pipeline.

pub mod error;

pub use error::{
    ConfigError, DbError, DecodeError, IndexerError, IndexerResult, QueueError, TransportError,
};
