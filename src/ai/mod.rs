//! 完美博弈的极小极大对手。

pub mod minimax;

pub use minimax::{evaluate, AiAgent, AiDecision, Score, BOT_LOSS, BOT_WIN, DRAW};
