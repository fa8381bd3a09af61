use matching_core::CoreError;
use thiserror::Error;

/// Errors raised by the matching engine's public API.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("ingest queue is closed")]
    QueueClosed,

    #[error("unknown symbol {0}")]
    UnknownSymbol(String),
}
