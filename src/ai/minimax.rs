use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::game::{detect_win, Board, Cell, Player, Position};

/// 始终站在机器人视角的评分。
pub type Score = i8;

pub const BOT_WIN: Score = 1;
pub const DRAW: Score = 0;
pub const BOT_LOSS: Score = -1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AiDecision {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,
    /// 并列最优的所有落点，`position` 从中随机选出。
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<Position>,
    pub nodes: u64,
}

struct SearchStats {
    nodes: u64,
}

impl SearchStats {
    fn new() -> Self {
        Self { nodes: 0 }
    }
}

pub struct AiAgent {
    rng: SmallRng,
}

impl AiAgent {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// 为 `bot` 一方选出最优落点；棋盘已满时返回 `None`。
    pub fn choose_bot_move(&mut self, board: &Board, bot: Player) -> Option<Position> {
        self.decide(board, bot).position
    }

    #[tracing::instrument(level = "debug", skip(self, board))]
    pub fn decide(&mut self, board: &Board, bot: Player) -> AiDecision {
        let mut stats = SearchStats::new();
        let mut scratch = *board;
        let mut best_score = None;
        let mut candidates = Vec::new();

        for position in Position::all() {
            let Some(score) = evaluate_rec(&mut scratch, position, bot, true, &mut stats) else {
                continue;
            };
            match best_score {
                Some(best) if score < best => {}
                Some(best) if score == best => candidates.push(position),
                _ => {
                    best_score = Some(score);
                    candidates.clear();
                    candidates.push(position);
                }
            }
        }

        let position = candidates.choose(&mut self.rng).copied();
        tracing::trace!(
            ?position,
            score = ?best_score,
            ties = candidates.len(),
            nodes = stats.nodes,
            "search finished"
        );

        AiDecision {
            position,
            score: best_score,
            candidates,
            nodes: stats.nodes,
        }
    }
}

impl Default for AiAgent {
    fn default() -> Self {
        Self::new()
    }
}

/// 对“`mark` 落在 `position`”这一步做完整的极小极大搜索。
///
/// `bot_placed` 表示这一步是否由机器人走出。目标格已被占用时返回 `None`。
/// 搜索在棋盘副本上以落子/撤销的方式进行，传入的棋盘不会被修改。
pub fn evaluate(board: &Board, position: Position, mark: Player, bot_placed: bool) -> Option<Score> {
    let mut scratch = *board;
    evaluate_rec(&mut scratch, position, mark, bot_placed, &mut SearchStats::new())
}

fn evaluate_rec(
    board: &mut Board,
    position: Position,
    mark: Player,
    bot_placed: bool,
    stats: &mut SearchStats,
) -> Option<Score> {
    if !board.is_empty_at(position) {
        return None;
    }
    stats.nodes += 1;

    board.set(position, mark.mark());
    let score = if detect_win(board, position.row, position.col).is_some() {
        if bot_placed {
            BOT_WIN
        } else {
            BOT_LOSS
        }
    } else if board.is_full() {
        DRAW
    } else {
        let opponent = mark.opponent();
        let children = Position::all()
            .filter_map(|next| evaluate_rec(board, next, opponent, !bot_placed, stats));
        // 机器人刚走完则轮到对手取最小值，反之机器人取最大值。
        let best = if bot_placed {
            children.min()
        } else {
            children.max()
        };
        best.unwrap_or(DRAW)
    };
    board.set(position, Cell::Empty);

    Some(score)
}
