//! Batching database writer: coalesces decoded events into per-protocol
//! batches and flushes them as multi-row `INSERT` statements.

pub mod sql;
pub mod writer;

pub use writer::BatchWriter;
