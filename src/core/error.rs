//! Centralized error types for the ingestion pipeline.

use thiserror::Error;

/// Top-level error surfaced at the crate boundary (startup failures only).
#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors raised while loading configuration from the environment.
/// All are fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid base58 program id in {var}: {source}")]
    InvalidProgramId {
        var: &'static str,
        #[source]
        source: bs58::decode::Error,
    },

    #[error("program id in {var} must decode to 32 bytes, got {len}")]
    ProgramIdLength { var: &'static str, len: usize },

    #[error("invalid integer value for {var}: {value}")]
    InvalidInteger { var: &'static str, value: String },
}

/// Errors raised by the bounded event queue. Never escalated past the
/// caller that pushed or popped; the only failure mode is operating on a
/// closed queue.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum QueueError {
    #[error("event queue is closed")]
    Closed,
}

/// Errors raised while establishing or running a subscription session.
/// Recovered in-place by the reconnect loop; never surfaced past the
/// subscription worker.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to connect to geyser endpoint: {0}")]
    Connect(#[source] anyhow::Error),

    #[error("failed to send subscribe request: {0}")]
    Subscribe(#[source] anyhow::Error),

    #[error("stream error: {0}")]
    Stream(#[source] tonic::Status),
}

/// Errors raised while decoding a raw event payload. Always handled by
/// skipping the candidate line and moving to the next; never escalated.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("buffer too short: need {need} bytes, have {have}")]
    TooShort { need: usize, have: usize },

    #[error("\"Program data: \" preamble not found")]
    NoPreamble,

    #[error("invalid base64 payload")]
    InvalidBase64,
}

/// Errors raised by the batching database writer.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("connection error: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("command error: {0}")]
    Command(#[source] sqlx::Error),
}

pub type IndexerResult<T> = Result<T, IndexerError>;
