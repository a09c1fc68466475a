//! 一局对战的会话：持有权威状态、配置、电脑对手以及待执行的延迟落子。

use serde::Serialize;

use crate::ai::{AiAgent, AiDecision};
use crate::config::{MatchConfig, Opponent};
use crate::game::{Board, GameState, MatchStatus, Player, Position, WinLocation};

/// 已排期的电脑落子。重置或执行后即失效，过期的票据不会改动棋盘。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BotTicket {
    id: u64,
}

/// 提供给界面层的只读快照。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub board: Board,
    pub turn: Player,
    pub game_over: bool,
    pub blocked: bool,
    pub moves: u8,
    pub status: MatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_move: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win: Option<WinLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win_line: Option<[Position; 3]>,
    pub opponent: Opponent,
}

pub struct MatchSession {
    config: MatchConfig,
    state: GameState,
    agent: AiAgent,
    pending: Option<u64>,
    next_ticket: u64,
}

impl MatchSession {
    pub fn new(config: MatchConfig) -> Self {
        let agent = make_agent(&config);
        let state = GameState::new(config.first_player);
        Self {
            config,
            state,
            agent,
            pending: None,
            next_ticket: 0,
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let win = self.state.win_location();
        GameSnapshot {
            board: self.state.board,
            turn: self.state.turn,
            game_over: self.state.game_over,
            blocked: self.state.blocked,
            moves: self.state.moves,
            status: self.state.status,
            last_move: self.state.last_move,
            win,
            win_line: win.map(WinLocation::cells),
            opponent: self.config.opponent,
        }
    }

    /// 轮到电脑且对局未结束。
    pub fn bot_to_move(&self) -> bool {
        self.config.bot_enabled() && !self.state.game_over && self.state.turn == Player::Bot
    }

    /// 界面层的落子入口。电脑执子的回合、等待电脑回应期间以及其它非法落子均被静默忽略。
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn apply_move(&mut self, row: usize, col: usize) -> Option<WinLocation> {
        if self.bot_to_move() {
            tracing::debug!("input ignored: bot is to move");
            return None;
        }
        self.state.apply_move(row, col)
    }

    /// 同步为电脑选点并落子。非电脑回合或已有排期时不做任何事。
    pub fn play_bot_turn(&mut self) -> Option<AiDecision> {
        if !self.bot_to_move() || self.state.blocked {
            return None;
        }
        let decision = self.agent.decide(&self.state.board, Player::Bot);
        let position = decision.position?;
        let resolution = self.state.try_move(position.row, position.col).ok()?;
        tracing::debug!(?position, score = ?decision.score, status = ?resolution.status, "bot moved");
        Some(decision)
    }

    /// 为电脑回合排期，并在执行前锁定人类输入。
    pub fn schedule_bot_turn(&mut self) -> Option<BotTicket> {
        if !self.bot_to_move() || self.pending.is_some() {
            return None;
        }
        let id = self.next_ticket;
        self.next_ticket += 1;
        self.pending = Some(id);
        self.state.blocked = true;
        tracing::debug!(ticket = id, "bot turn scheduled");
        Some(BotTicket { id })
    }

    /// 执行先前排期的电脑回合。票据已过期（重置过或已执行）时忽略。
    pub fn resolve_bot_turn(&mut self, ticket: BotTicket) -> Option<AiDecision> {
        if self.pending != Some(ticket.id) {
            tracing::debug!(ticket = ticket.id, "stale bot ticket dropped");
            return None;
        }
        self.pending = None;
        self.state.blocked = false;
        self.play_bot_turn()
    }

    pub fn has_pending_bot_turn(&self) -> bool {
        self.pending.is_some()
    }

    /// 重新开局，可同时替换配置。任何已排期的电脑落子随之作废。
    pub fn reset(&mut self, config: Option<MatchConfig>) {
        if let Some(config) = config {
            if config.seed != self.config.seed {
                self.agent = make_agent(&config);
            }
            self.config = config;
        }
        if let Some(id) = self.pending.take() {
            tracing::debug!(ticket = id, "pending bot turn cancelled by reset");
        }
        self.state = GameState::new(self.config.first_player);
        tracing::debug!(first = ?self.config.first_player, opponent = ?self.config.opponent, "match reset");
    }
}

impl Default for MatchSession {
    fn default() -> Self {
        Self::new(MatchConfig::default())
    }
}

fn make_agent(config: &MatchConfig) -> AiAgent {
    match config.seed {
        Some(seed) => AiAgent::with_seed(seed),
        None => AiAgent::new(),
    }
}
