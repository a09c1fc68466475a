pub mod ai;
pub mod config;
pub mod game;
pub mod logger;
pub mod session;

use gloo_timers::future::TimeoutFuture;
use serde_wasm_bindgen::{from_value, to_value};
use std::cell::RefCell;
use std::rc::Rc;
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{evaluate, AiAgent, AiDecision, Score};
pub use config::{MatchConfig, Opponent};
pub use game::{
    detect_win, Board, Cell, GameState, MatchStatus, MoveResolution, Player, Position, RuleError,
    WinLocation,
};
pub use session::{BotTicket, GameSnapshot, MatchSession};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
    logger::init_logging();
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn parse_config(config_json: Option<String>) -> Result<Option<MatchConfig>, JsValue> {
    config_json
        .as_deref()
        .map(MatchConfig::from_json)
        .transpose()
        .map_err(serde_to_js_error)
}

fn snapshot_json(session: &MatchSession) -> Result<String, JsValue> {
    serde_json::to_string(&session.snapshot()).map_err(serde_to_js_error)
}

#[wasm_bindgen]
pub struct GameEngine {
    session: Rc<RefCell<MatchSession>>,
}

#[wasm_bindgen]
impl GameEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<GameEngine, JsValue> {
        let config = parse_config(config_json)?.unwrap_or_default();
        Ok(GameEngine {
            session: Rc::new(RefCell::new(MatchSession::new(config))),
        })
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        snapshot_json(&self.session.borrow())
    }

    pub fn board(&self) -> Result<JsValue, JsValue> {
        to_value(&self.session.borrow().state().board).map_err(JsValue::from)
    }

    #[wasm_bindgen(getter)]
    pub fn game_over(&self) -> bool {
        self.session.borrow().state().game_over
    }

    #[wasm_bindgen(getter)]
    pub fn blocked(&self) -> bool {
        self.session.borrow().state().blocked
    }

    #[wasm_bindgen(getter)]
    pub fn turn(&self) -> String {
        match self.session.borrow().state().turn {
            Player::Human => "human".into(),
            Player::Bot => "bot".into(),
        }
    }

    #[wasm_bindgen(getter)]
    pub fn moves(&self) -> u8 {
        self.session.borrow().state().moves
    }

    /// 直接落子，返回获胜连线或 `undefined`。非法落子静默忽略。
    pub fn apply_move(&mut self, row: usize, col: usize) -> Result<JsValue, JsValue> {
        let win = self.session.borrow_mut().apply_move(row, col);
        to_value(&win).map_err(JsValue::from)
    }

    /// 立即让电脑走一步（无延迟），返回决策详情；不是电脑回合时返回 `undefined`。
    pub fn choose_bot_move(&mut self) -> Result<JsValue, JsValue> {
        let decision = self.session.borrow_mut().play_bot_turn();
        to_value(&decision).map_err(JsValue::from)
    }

    /// 人类落子，随后按配置的延迟让电脑回应。Promise 以最新快照（JSON）完成。
    pub fn play(&mut self, row: usize, col: usize) -> Promise {
        self.session.borrow_mut().apply_move(row, col);
        self.bot_reply()
    }

    /// 重新开局，可传入新的设置；电脑先手时 Promise 在其开局落子后完成。
    pub fn reset(&mut self, config_json: Option<String>) -> Result<Promise, JsValue> {
        let config = parse_config(config_json)?;
        self.session.borrow_mut().reset(config);
        Ok(self.bot_reply())
    }
}

impl GameEngine {
    fn bot_reply(&self) -> Promise {
        let session = Rc::clone(&self.session);
        let ticket = session.borrow_mut().schedule_bot_turn();
        let delay = session.borrow().config().bot_delay_ms;

        future_to_promise(async move {
            if let Some(ticket) = ticket {
                if delay > 0 {
                    TimeoutFuture::new(delay).await;
                }
                // 等待期间若已重置，票据失效，这里不会落子。
                session.borrow_mut().resolve_bot_turn(ticket);
            }
            let json = snapshot_json(&session.borrow())?;
            Ok(JsValue::from_str(&json))
        })
    }
}

/// 检查经过 `(row, col)` 的连线是否成立。
#[wasm_bindgen(js_name = "detectWin")]
pub fn detect_win_line(board: JsValue, row: usize, col: usize) -> Result<JsValue, JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    to_value(&detect_win(&board, row, col)).map_err(JsValue::from)
}

/// 对任意局面计算电脑的最优落点，不依赖某个对局实例。
#[wasm_bindgen(js_name = "computeBotMove")]
pub fn compute_bot_move(board: JsValue, bot_mark: Option<String>) -> Result<JsValue, JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    let bot = bot_mark
        .as_deref()
        .and_then(|value| Player::from_str(value).ok())
        .unwrap_or(Player::Bot);
    let decision = AiAgent::new().decide(&board, bot);
    to_value(&decision).map_err(JsValue::from)
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}
