use thiserror::Error;

/// Errors raised by order construction, fill application, and book mutation.
///
/// `OverFill` and a mismatched `SymbolMismatch` are invariant breaches: a
/// correct engine never triggers them from valid input. They propagate as
/// `Err` so a caller (the matching engine) can log and abort the offending
/// step rather than panic the whole process.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("fill of {qty} exceeds remaining quantity {remaining}")]
    OverFill { qty: i64, remaining: i64 },

    #[error("order symbol {order_symbol} does not match book symbol {book_symbol}")]
    SymbolMismatch {
        order_symbol: String,
        book_symbol: String,
    },
}
