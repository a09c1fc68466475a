use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::rules::{detect_win, RuleError};

/// 棋盘边长。
pub const BOARD_SIZE: usize = 3;
/// 棋盘格子总数，也是一局的最大步数。
pub const CELL_COUNT: usize = BOARD_SIZE * BOARD_SIZE;

/// 对局双方。对手配置为第二名人类玩家时，`Bot` 一方即为第二名玩家。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    Human,
    Bot,
}

impl Player {
    pub fn opponent(self) -> Self {
        match self {
            Player::Human => Player::Bot,
            Player::Bot => Player::Human,
        }
    }

    pub fn mark(self) -> Cell {
        match self {
            Player::Human => Cell::Human,
            Player::Bot => Cell::Bot,
        }
    }
}

impl FromStr for Player {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "human" | "player" | "x" => Ok(Player::Human),
            "bot" | "ai" | "computer" | "o" => Ok(Player::Bot),
            _ => Err(()),
        }
    }
}

/// 单个格子的状态。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Cell {
    #[default]
    Empty,
    Human,
    Bot,
}

impl Cell {
    pub fn owner(self) -> Option<Player> {
        match self {
            Cell::Empty => None,
            Cell::Human => Some(Player::Human),
            Cell::Bot => Some(Player::Bot),
        }
    }

    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }

    /// 交换双方棋子，空格保持不变。
    pub fn swapped(self) -> Self {
        match self {
            Cell::Empty => Cell::Empty,
            Cell::Human => Cell::Bot,
            Cell::Bot => Cell::Human,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub fn in_bounds(self) -> bool {
        self.row < BOARD_SIZE && self.col < BOARD_SIZE
    }

    pub fn on_main_diagonal(self) -> bool {
        self.row == self.col
    }

    pub fn on_anti_diagonal(self) -> bool {
        self.row + self.col == BOARD_SIZE - 1
    }

    /// 按行优先顺序遍历所有格子。
    pub fn all() -> impl Iterator<Item = Position> {
        (0..BOARD_SIZE).flat_map(|row| (0..BOARD_SIZE).map(move |col| Position::new(row, col)))
    }
}

/// 3×3 棋盘，按行存储。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(transparent)]
pub struct Board {
    cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(cells: [[Cell; BOARD_SIZE]; BOARD_SIZE]) -> Self {
        Self { cells }
    }

    pub fn rows(&self) -> &[[Cell; BOARD_SIZE]; BOARD_SIZE] {
        &self.cells
    }

    /// 越界坐标返回 `None`。
    pub fn get(&self, position: Position) -> Option<Cell> {
        self.cells
            .get(position.row)
            .and_then(|row| row.get(position.col))
            .copied()
    }

    /// 调用方负责保证坐标在棋盘内。
    pub fn set(&mut self, position: Position, cell: Cell) {
        self.cells[position.row][position.col] = cell;
    }

    pub fn is_empty_at(&self, position: Position) -> bool {
        matches!(self.get(position), Some(Cell::Empty))
    }

    pub fn empty_cells(&self) -> impl Iterator<Item = Position> + '_ {
        Position::all().filter(|position| self.is_empty_at(*position))
    }

    pub fn occupied_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| !cell.is_empty())
            .count()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().flatten().all(|cell| !cell.is_empty())
    }

    pub fn swapped(&self) -> Self {
        let mut cells = self.cells;
        for cell in cells.iter_mut().flatten() {
            *cell = cell.swapped();
        }
        Self { cells }
    }
}

/// 获胜连线。`index` 为渲染层使用的编号：行 0–2，列 3–5，主对角线 6，副对角线 7。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum WinLocation {
    Row0,
    Row1,
    Row2,
    Col0,
    Col1,
    Col2,
    DiagMain,
    DiagAnti,
}

impl WinLocation {
    pub fn row(index: usize) -> Option<Self> {
        match index {
            0 => Some(WinLocation::Row0),
            1 => Some(WinLocation::Row1),
            2 => Some(WinLocation::Row2),
            _ => None,
        }
    }

    pub fn col(index: usize) -> Option<Self> {
        match index {
            0 => Some(WinLocation::Col0),
            1 => Some(WinLocation::Col1),
            2 => Some(WinLocation::Col2),
            _ => None,
        }
    }

    pub fn index(self) -> u8 {
        match self {
            WinLocation::Row0 => 0,
            WinLocation::Row1 => 1,
            WinLocation::Row2 => 2,
            WinLocation::Col0 => 3,
            WinLocation::Col1 => 4,
            WinLocation::Col2 => 5,
            WinLocation::DiagMain => 6,
            WinLocation::DiagAnti => 7,
        }
    }

    /// 连线经过的三个格子，供画线使用。
    pub fn cells(self) -> [Position; BOARD_SIZE] {
        let at = |row, col| Position::new(row, col);
        match self {
            WinLocation::Row0 => [at(0, 0), at(0, 1), at(0, 2)],
            WinLocation::Row1 => [at(1, 0), at(1, 1), at(1, 2)],
            WinLocation::Row2 => [at(2, 0), at(2, 1), at(2, 2)],
            WinLocation::Col0 => [at(0, 0), at(1, 0), at(2, 0)],
            WinLocation::Col1 => [at(0, 1), at(1, 1), at(2, 1)],
            WinLocation::Col2 => [at(0, 2), at(1, 2), at(2, 2)],
            WinLocation::DiagMain => [at(0, 0), at(1, 1), at(2, 2)],
            WinLocation::DiagAnti => [at(0, 2), at(1, 1), at(2, 0)],
        }
    }
}

/// 对局状态机：`NotStarted → InProgress → {Won, Drawn}`。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "type")]
pub enum MatchStatus {
    #[default]
    NotStarted,
    InProgress,
    Won {
        winner: Player,
        line: WinLocation,
    },
    Drawn,
}

impl MatchStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, MatchStatus::Won { .. } | MatchStatus::Drawn)
    }
}

/// 一次成功落子的结果。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoveResolution {
    pub player: Player,
    pub position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win: Option<WinLocation>,
    pub status: MatchStatus,
}

/// 权威对局状态。只能通过 [`GameState::apply_move`] / [`GameState::try_move`] 修改棋盘。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameState {
    pub board: Board,
    pub turn: Player,
    pub game_over: bool,
    pub moves: u8,
    #[serde(default)]
    pub blocked: bool,
    #[serde(default)]
    pub status: MatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_move: Option<Position>,
}

impl GameState {
    pub fn new(first: Player) -> Self {
        Self {
            board: Board::new(),
            turn: first,
            game_over: false,
            moves: 0,
            blocked: false,
            status: MatchStatus::NotStarted,
            last_move: None,
        }
    }

    /// 从任意局面构造状态，`moves` 由已落子数推出。局面已分出胜负时不再接受落子。
    pub fn from_position(board: Board, turn: Player) -> Self {
        let moves = board.occupied_count() as u8;
        let mut state = Self {
            board,
            turn,
            game_over: false,
            moves,
            blocked: false,
            status: if moves == 0 {
                MatchStatus::NotStarted
            } else {
                MatchStatus::InProgress
            },
            last_move: None,
        };
        if let Some((winner, line)) = super::rules::find_any_win(&board) {
            state.finish(MatchStatus::Won { winner, line });
        } else if board.is_full() {
            state.finish(MatchStatus::Drawn);
        }
        state
    }

    /// 落子。任何前置条件不满足时静默忽略，返回 `None`。
    pub fn apply_move(&mut self, row: usize, col: usize) -> Option<WinLocation> {
        match self.try_move(row, col) {
            Ok(resolution) => resolution.win,
            Err(error) => {
                tracing::debug!(row, col, ?error, "move ignored");
                None
            }
        }
    }

    pub fn try_move(&mut self, row: usize, col: usize) -> Result<MoveResolution, RuleError> {
        self.ensure_accepting()?;
        let position = Position::new(row, col);
        if !position.in_bounds() {
            return Err(RuleError::OutOfBounds { row, col });
        }
        if !self.board.is_empty_at(position) {
            return Err(RuleError::CellOccupied { position });
        }

        let player = self.turn;
        self.board.set(position, player.mark());
        self.moves += 1;
        self.turn = player.opponent();
        self.last_move = Some(position);
        self.status = MatchStatus::InProgress;

        let win = detect_win(&self.board, row, col);
        if let Some(line) = win {
            self.finish(MatchStatus::Won {
                winner: player,
                line,
            });
        } else if self.moves as usize >= CELL_COUNT {
            self.finish(MatchStatus::Drawn);
        }

        tracing::debug!(?player, row, col, moves = self.moves, status = ?self.status, "move applied");
        Ok(MoveResolution {
            player,
            position,
            win,
            status: self.status,
        })
    }

    pub fn winner(&self) -> Option<Player> {
        match self.status {
            MatchStatus::Won { winner, .. } => Some(winner),
            _ => None,
        }
    }

    pub fn win_location(&self) -> Option<WinLocation> {
        match self.status {
            MatchStatus::Won { line, .. } => Some(line),
            _ => None,
        }
    }

    fn ensure_accepting(&self) -> Result<(), RuleError> {
        if self.game_over {
            return Err(RuleError::GameFinished);
        }
        if self.blocked {
            return Err(RuleError::Blocked);
        }
        Ok(())
    }

    fn finish(&mut self, status: MatchStatus) {
        self.game_over = true;
        self.status = status;
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(Player::Human)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const H: Cell = Cell::Human;
    const B: Cell = Cell::Bot;
    const E: Cell = Cell::Empty;

    fn snapshot(state: &GameState) -> (Board, Player, u8) {
        (state.board, state.turn, state.moves)
    }

    #[test]
    fn accepted_moves_alternate_and_count() {
        let mut state = GameState::new(Player::Human);
        assert_eq!(state.status, MatchStatus::NotStarted);

        assert_eq!(state.apply_move(1, 1), None);
        assert_eq!(state.moves, 1);
        assert_eq!(state.turn, Player::Bot);
        assert_eq!(state.board.get(Position::new(1, 1)), Some(Cell::Human));
        assert_eq!(state.status, MatchStatus::InProgress);

        state.apply_move(0, 0);
        assert_eq!(state.moves, 2);
        assert_eq!(state.turn, Player::Human);
        assert_eq!(state.board.get(Position::new(0, 0)), Some(Cell::Bot));
        assert_eq!(state.board.occupied_count(), state.moves as usize);
    }

    #[test]
    fn occupied_cell_is_ignored() {
        let mut state = GameState::new(Player::Human);
        state.apply_move(0, 0);
        let before = snapshot(&state);

        assert_eq!(state.apply_move(0, 0), None);
        assert_eq!(snapshot(&state), before);
        assert_eq!(
            state.try_move(0, 0),
            Err(RuleError::CellOccupied {
                position: Position::new(0, 0)
            })
        );
    }

    #[test]
    fn out_of_range_is_ignored() {
        let mut state = GameState::new(Player::Bot);
        let before = snapshot(&state);
        assert_eq!(state.apply_move(3, 0), None);
        assert_eq!(state.apply_move(0, 7), None);
        assert_eq!(snapshot(&state), before);
        assert_eq!(
            state.try_move(5, 5),
            Err(RuleError::OutOfBounds { row: 5, col: 5 })
        );
    }

    #[test]
    fn blocked_state_rejects_moves() {
        let mut state = GameState::new(Player::Human);
        state.blocked = true;
        let before = snapshot(&state);
        assert_eq!(state.try_move(1, 1), Err(RuleError::Blocked));
        assert_eq!(snapshot(&state), before);
    }

    #[test]
    fn win_ends_game_and_freezes_board() {
        let mut state = GameState::new(Player::Human);
        // Human: top row. Bot: middle row.
        for (row, col) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            assert_eq!(state.apply_move(row, col), None);
        }
        assert_eq!(state.apply_move(0, 2), Some(WinLocation::Row0));
        assert!(state.game_over);
        assert_eq!(state.winner(), Some(Player::Human));
        assert_eq!(state.win_location(), Some(WinLocation::Row0));

        let before = snapshot(&state);
        assert_eq!(state.apply_move(2, 2), None);
        assert_eq!(snapshot(&state), before);
        assert_eq!(state.try_move(2, 2), Err(RuleError::GameFinished));
    }

    #[test]
    fn full_board_without_line_is_drawn() {
        let mut state = GameState::new(Player::Human);
        // H B H / H B B / B H H
        let sequence = [
            (0, 0),
            (0, 1),
            (0, 2),
            (1, 1),
            (1, 0),
            (1, 2),
            (2, 1),
            (2, 0),
            (2, 2),
        ];
        for (index, (row, col)) in sequence.into_iter().enumerate() {
            assert!(!state.game_over, "game ended early at move {index}");
            assert_eq!(state.apply_move(row, col), None);
            assert_eq!(state.moves as usize, index + 1);
        }
        assert!(state.game_over);
        assert_eq!(state.status, MatchStatus::Drawn);
        assert_eq!(state.winner(), None);
        assert_eq!(state.moves as usize, CELL_COUNT);
    }

    #[test]
    fn bot_completes_anti_diagonal_from_position() {
        let board = Board::from_rows([[B, H, B], [H, B, H], [E, E, H]]);
        let mut state = GameState::from_position(board, Player::Bot);
        assert_eq!(state.moves, 7);
        assert!(!state.game_over);

        assert_eq!(state.apply_move(2, 0), Some(WinLocation::DiagAnti));
        assert!(state.game_over);
        assert_eq!(state.winner(), Some(Player::Bot));
    }

    #[test]
    fn finished_position_rejects_moves() {
        let board = Board::from_rows([[H, H, H], [B, B, E], [E, E, E]]);
        let mut state = GameState::from_position(board, Player::Bot);
        assert!(state.game_over);
        assert_eq!(state.win_location(), Some(WinLocation::Row0));
        assert_eq!(state.apply_move(2, 2), None);
        assert_eq!(state.moves, 5);
    }

    #[test]
    fn win_location_indices_are_distinct() {
        let all = [
            WinLocation::Row0,
            WinLocation::Row1,
            WinLocation::Row2,
            WinLocation::Col0,
            WinLocation::Col1,
            WinLocation::Col2,
            WinLocation::DiagMain,
            WinLocation::DiagAnti,
        ];
        for (expected, line) in all.into_iter().enumerate() {
            assert_eq!(line.index() as usize, expected);
        }
    }

    #[test]
    fn player_parses_settings_aliases() {
        assert_eq!("Bot".parse::<Player>(), Ok(Player::Bot));
        assert_eq!("computer".parse::<Player>(), Ok(Player::Bot));
        assert_eq!("HUMAN".parse::<Player>(), Ok(Player::Human));
        assert!("nobody".parse::<Player>().is_err());
    }
}
