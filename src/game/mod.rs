//! 棋盘与对局状态（落子、胜负判定）。

pub mod rules;
pub mod state;

pub use rules::{detect_win, find_any_win, RuleError};
pub use state::{
    Board,
    Cell,
    GameState,
    MatchStatus,
    MoveResolution,
    Player,
    Position,
    WinLocation,
    BOARD_SIZE,
    CELL_COUNT,
};
