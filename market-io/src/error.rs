use thiserror::Error;

/// Errors raised by the CSV import/export adapters.
///
/// Per-row failures during import are not represented here: they are
/// collected into `ImportReport::errors` instead, since a bad row
/// shouldn't abort an otherwise-good file. This variant covers failures
/// that make the whole file unusable.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("missing required column(s): {0}")]
    MissingColumns(String),

    #[error("empty csv input")]
    EmptyInput,
}
