use serde::{Deserialize, Serialize};

use super::state::{Board, Player, Position, WinLocation, BOARD_SIZE};

/// 落子被拒绝的原因。对外一律静默处理，只用于日志与测试。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RuleError {
    GameFinished,
    Blocked,
    OutOfBounds { row: usize, col: usize },
    CellOccupied { position: Position },
}

fn line_complete(board: &Board, cells: [Position; BOARD_SIZE]) -> bool {
    let [a, b, c] = cells.map(|position| board.get(position));
    match (a, b, c) {
        (Some(a), Some(b), Some(c)) => !a.is_empty() && a == b && b == c,
        _ => false,
    }
}

/// 检查经过 `(row, col)` 的连线：所在行、所在列，以及该格位于对角线上时的两条对角线。
/// 多条线同时成立时按 行 > 列 > 主对角线 > 副对角线 取第一条。
pub fn detect_win(board: &Board, row: usize, col: usize) -> Option<WinLocation> {
    let position = Position::new(row, col);
    if !position.in_bounds() {
        return None;
    }

    let mut candidates = Vec::with_capacity(4);
    candidates.extend(WinLocation::row(row));
    candidates.extend(WinLocation::col(col));
    if position.on_main_diagonal() || position.on_anti_diagonal() {
        candidates.push(WinLocation::DiagMain);
        candidates.push(WinLocation::DiagAnti);
    }

    candidates
        .into_iter()
        .find(|line| line_complete(board, line.cells()))
}

/// 扫描全部八条线，用于从任意局面恢复状态。
pub fn find_any_win(board: &Board) -> Option<(Player, WinLocation)> {
    Position::all()
        .filter_map(|position| {
            let line = detect_win(board, position.row, position.col)?;
            let winner = board.get(position)?.owner()?;
            Some((winner, line))
        })
        .next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::Cell;

    const H: Cell = Cell::Human;
    const B: Cell = Cell::Bot;
    const E: Cell = Cell::Empty;

    #[test]
    fn detects_every_line() {
        let lines = [
            WinLocation::Row0,
            WinLocation::Row1,
            WinLocation::Row2,
            WinLocation::Col0,
            WinLocation::Col1,
            WinLocation::Col2,
            WinLocation::DiagMain,
            WinLocation::DiagAnti,
        ];

        for line in lines {
            let mut board = Board::new();
            for position in line.cells() {
                board.set(position, Cell::Bot);
            }
            for position in line.cells() {
                assert_eq!(
                    detect_win(&board, position.row, position.col),
                    Some(line),
                    "{line:?} should be found from {position:?}"
                );
            }
        }
    }

    #[test]
    fn mixed_marks_do_not_win() {
        let board = Board::from_rows([[H, B, H], [B, H, B], [B, H, B]]);
        for position in Position::all() {
            assert_eq!(detect_win(&board, position.row, position.col), None);
        }
        assert_eq!(find_any_win(&board), None);
    }

    #[test]
    fn empty_line_is_not_a_win() {
        let board = Board::new();
        assert_eq!(detect_win(&board, 1, 1), None);
        assert_eq!(detect_win(&board, 4, 1), None);
    }

    #[test]
    fn edge_cell_ignores_diagonals() {
        // Anti-diagonal is complete but (0, 1) does not lie on it.
        let board = Board::from_rows([[E, E, B], [E, B, E], [B, E, E]]);
        assert_eq!(detect_win(&board, 0, 1), None);
        assert_eq!(detect_win(&board, 0, 2), Some(WinLocation::DiagAnti));
    }

    #[test]
    fn precedence_is_row_column_main_anti() {
        // Centre completes row 1, column 1 and both diagonals at once.
        let board = Board::from_rows([[B, B, B], [B, B, B], [B, B, B]]);
        assert_eq!(detect_win(&board, 1, 1), Some(WinLocation::Row1));

        let board = Board::from_rows([[B, B, H], [H, B, H], [B, B, B]]);
        assert_eq!(detect_win(&board, 2, 0), Some(WinLocation::Row2));

        let board = Board::from_rows([[B, H, H], [H, B, E], [E, E, B]]);
        assert_eq!(detect_win(&board, 2, 2), Some(WinLocation::DiagMain));

        let board = Board::from_rows([[B, H, B], [H, B, H], [B, E, B]]);
        assert_eq!(detect_win(&board, 0, 0), Some(WinLocation::DiagMain));
        // (0, 2) is only on the anti-diagonal, but both diagonals are checked.
        assert_eq!(detect_win(&board, 0, 2), Some(WinLocation::DiagMain));

        let board = Board::from_rows([[H, H, B], [E, B, E], [B, E, H]]);
        assert_eq!(detect_win(&board, 2, 0), Some(WinLocation::DiagAnti));
    }

    #[test]
    fn find_any_win_reports_owner() {
        let board = Board::from_rows([[H, B, E], [H, B, E], [H, E, B]]);
        assert_eq!(find_any_win(&board), Some((Player::Human, WinLocation::Col0)));
    }
}
