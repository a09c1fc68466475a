//! 对局配置，由设置界面以 JSON 形式注入。

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::game::Player;

const DEFAULT_BOT_DELAY_MS: u32 = 500;

/// 对手类型：电脑或第二名人类玩家。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Opponent {
    #[default]
    Bot,
    Human,
}

impl FromStr for Opponent {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bot" | "ai" | "computer" | "cpu" => Ok(Opponent::Bot),
            "human" | "local" | "hotseat" => Ok(Opponent::Human),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct MatchConfig {
    pub first_player: Player,
    pub opponent: Opponent,
    /// 机器人回应前的停顿（毫秒），0 表示立即落子。
    pub bot_delay_ms: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl MatchConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_first_player(mut self, player: Player) -> Self {
        self.first_player = player;
        self
    }

    pub fn with_opponent(mut self, opponent: Opponent) -> Self {
        self.opponent = opponent;
        self
    }

    pub fn with_bot_delay_ms(mut self, delay_ms: u32) -> Self {
        self.bot_delay_ms = delay_ms;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn bot_enabled(&self) -> bool {
        self.opponent == Opponent::Bot
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            first_player: Player::Human,
            opponent: Opponent::Bot,
            bot_delay_ms: DEFAULT_BOT_DELAY_MS,
            seed: None,
        }
    }
}
