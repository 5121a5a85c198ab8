//! Streaming ingestion pipeline for pump.fun-style trade events and
//! Raydium-style swap events.
//!
//! Subscribes to a Geyser gRPC transaction-update feed, classifies
//! incoming transactions against a configured set of on-chain program
//! ids, decodes matching event payloads, and persists them into a
//! relational store in per-protocol batches. See `DESIGN.md` for the
//! grounding of each module against the original prior art.

pub mod classifier;
pub mod config;
pub mod core;
pub mod db;
pub mod decode;
pub mod event;
pub mod metrics;
pub mod queue;
pub mod subscription;

pub use classifier::{Detector, Protocol, ProtocolPattern};
pub use config::Config;
pub use core::error::{
    ConfigError, DbError, DecodeError, IndexerError, IndexerResult, QueueError, TransportError,
};
pub use event::Event;
pub use metrics::METRICS;
