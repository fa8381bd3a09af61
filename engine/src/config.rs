/// Tunables for a `MatchingEngine`. Defaults match the reference sizes
/// called out in the engine's design: a 100-order matching batch, a
/// 1000-trade per-symbol tape, and a 10000-trade global tape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub batch_size: usize,
    pub book_trade_tape_capacity: usize,
    pub global_trade_tape_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            book_trade_tape_capacity: 1000,
            global_trade_tape_capacity: 10_000,
        }
    }
}
