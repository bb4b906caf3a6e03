pub mod game;
pub mod utils;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_timers::callback::{Interval, Timeout};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;
use web_sys::js_sys::{Function, Promise};

pub use game::{
    format_time, Board, Card, CardFace, CardId, CardView, ConfigError, GameConfig, GameEvent,
    GameState, Generation, IntegrityError, NavigationError, Navigator, PerformanceTier,
    RoundPhase, RoundSnapshot, RoundStats, RoundSummary, RoundTimer, RuleEngine, RuleError,
    ScreenPhase, Session, SessionError, TierInfo,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn integrity_to_js(error: IntegrityError) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    to_value(value).map_err(JsValue::from)
}

fn parse_config(config_json: Option<String>) -> Result<GameConfig, JsValue> {
    match config_json {
        Some(json) => GameConfig::from_json(&json).map_err(serde_to_js_error),
        None => Ok(GameConfig::default()),
    }
}

/// `waitForCompletion` 返回的 Promise 的兑现/拒绝函数。
struct CompletionWaiter {
    generation: Generation,
    resolve: Function,
    reject: Function,
}

impl CompletionWaiter {
    fn settle(self, outcome: Result<JsValue, JsValue>) {
        let result = match outcome {
            Ok(value) => self.resolve.call1(&JsValue::NULL, &value),
            Err(reason) => self.reject.call1(&JsValue::NULL, &reason),
        };
        if let Err(error) = result {
            utils::warn(&format!(
                "settling completion of round {} threw: {error:?}",
                self.generation
            ));
        }
    }
}

/// 会话与其挂起的计时器。计时器句柄被丢弃即取消。
struct Runtime {
    session: Session,
    ticker: Option<Interval>,
    resolver: Option<Timeout>,
    announcer: Option<Timeout>,
    waiters: Vec<CompletionWaiter>,
    on_change: Option<Function>,
    on_round_complete: Option<Function>,
}

impl Runtime {
    fn cancel_timers(&mut self) {
        self.ticker = None;
        self.resolver = None;
        self.announcer = None;
    }

    fn take_waiters(&mut self, generation: Generation) -> Vec<CompletionWaiter> {
        let (matching, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.waiters)
            .into_iter()
            .partition(|waiter| waiter.generation == generation);
        self.waiters = rest;
        matching
    }

    fn take_stale_waiters(&mut self) -> Vec<CompletionWaiter> {
        let current = self.session.generation();
        let (stale, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.waiters)
            .into_iter()
            .partition(|waiter| waiter.generation != current);
        self.waiters = rest;
        stale
    }
}

fn reject_waiters(waiters: Vec<CompletionWaiter>) {
    for waiter in waiters {
        waiter.settle(Err(JsValue::from_str("round was reset or abandoned")));
    }
}

type SharedRuntime = Rc<RefCell<Runtime>>;

/// 根据事件挂上或撤下计时器。
fn schedule_for_events(runtime: &SharedRuntime, events: &[GameEvent]) {
    let weak = Rc::downgrade(runtime);
    let mut rt = runtime.borrow_mut();
    let mut stale = Vec::new();
    let compare_settle_ms = rt.session.config().compare_settle_ms;
    let complete_announce_ms = rt.session.config().complete_announce_ms;
    let tick_interval_ms = rt.session.config().tick_interval_ms;

    for event in events {
        match event {
            GameEvent::RoundStarted { generation, board_size } => {
                rt.cancel_timers();
                stale.extend(rt.take_stale_waiters());
                rt.ticker = Some(schedule_ticker(weak.clone(), *generation, tick_interval_ms));
                utils::log(&format!("round {generation} started with {board_size} cards"));
            }
            GameEvent::ComparisonStarted { generation, .. } => {
                rt.resolver = Some(schedule_resolution(
                    weak.clone(),
                    *generation,
                    compare_settle_ms,
                ));
            }
            GameEvent::RoundCompleted { generation, stats } => {
                rt.ticker = None;
                rt.announcer = Some(schedule_announcement(
                    weak.clone(),
                    *generation,
                    complete_announce_ms,
                ));
                utils::log(&format!(
                    "round {generation} cleared in {} attempts, {}s",
                    stats.attempts, stats.time_elapsed
                ));
            }
            GameEvent::RoundAbandoned { generation } => {
                rt.cancel_timers();
                stale.extend(rt.take_waiters(*generation));
                utils::log(&format!("round {generation} abandoned"));
            }
            _ => {}
        }
    }
    drop(rt);
    reject_waiters(stale);
}

/// 推送快照。调用 JS 时不持有借用，回调里可以再次调用本对象。
fn notify_change(runtime: &SharedRuntime) {
    let (callback, snapshot) = {
        let rt = runtime.borrow();
        (rt.on_change.clone(), rt.session.snapshot())
    };
    let Some(callback) = callback else {
        return;
    };
    match to_value(&snapshot) {
        Ok(value) => {
            if let Err(error) = callback.call1(&JsValue::NULL, &value) {
                utils::warn(&format!("onChange callback threw: {error:?}"));
            }
        }
        Err(error) => utils::warn(&format!("failed to serialize snapshot: {error}")),
    }
}

fn notify_complete(runtime: &SharedRuntime, stats: RoundStats) {
    let callback = runtime.borrow().on_round_complete.clone();
    let Some(callback) = callback else {
        return;
    };
    match to_value(&stats) {
        Ok(value) => {
            if let Err(error) = callback.call1(&JsValue::NULL, &value) {
                utils::warn(&format!("onRoundComplete callback threw: {error:?}"));
            }
        }
        Err(error) => utils::warn(&format!("failed to serialize stats: {error}")),
    }
}

fn schedule_ticker(
    runtime: Weak<RefCell<Runtime>>,
    generation: Generation,
    interval_ms: u32,
) -> Interval {
    Interval::new(interval_ms, move || {
        let Some(runtime) = runtime.upgrade() else {
            return;
        };
        let result = runtime.borrow_mut().session.tick(generation);
        match result {
            Ok(events) if !events.is_empty() => notify_change(&runtime),
            Ok(_) => {}
            Err(error) => utils::debug(&format!("tick discarded: {error}")),
        }
    })
}

fn schedule_resolution(
    runtime: Weak<RefCell<Runtime>>,
    generation: Generation,
    delay_ms: u32,
) -> Timeout {
    Timeout::new(delay_ms, move || {
        let Some(runtime) = runtime.upgrade() else {
            return;
        };
        let result = runtime.borrow_mut().session.resolve_comparison(generation);
        match result {
            Ok(events) => {
                schedule_for_events(&runtime, &events);
                notify_change(&runtime);
            }
            Err(error) => utils::debug(&format!("resolution discarded: {error}")),
        }
    })
}

fn schedule_announcement(
    runtime: Weak<RefCell<Runtime>>,
    generation: Generation,
    delay_ms: u32,
) -> Timeout {
    Timeout::new(delay_ms, move || {
        let Some(runtime) = runtime.upgrade() else {
            return;
        };
        let result = runtime.borrow_mut().session.announce(generation);
        match result {
            Ok(stats) => {
                // 等待者须在 onRoundComplete 之前兑现。
                let waiters = runtime.borrow_mut().take_waiters(generation);
                for waiter in waiters {
                    waiter.settle(to_js(&stats));
                }
                notify_complete(&runtime, stats);
                notify_change(&runtime);
            }
            Err(error) => utils::debug(&format!("announcement discarded: {error}")),
        }
    })
}

impl MemoryGame {
    fn run<F>(&self, label: &str, action: F) -> Result<JsValue, JsValue>
    where
        F: FnOnce(&mut Session) -> Result<Vec<GameEvent>, SessionError>,
    {
        let result = action(&mut self.inner.borrow_mut().session);
        match result {
            Ok(events) => self.apply(&events),
            Err(error) => utils::debug(&format!("{label} ignored: {error}")),
        }
        self.snapshot()
    }

    fn apply(&self, events: &[GameEvent]) {
        schedule_for_events(&self.inner, events);
        if !events.is_empty() {
            notify_change(&self.inner);
        }
    }
}

/// 暴露给前端的游戏对象。表现层只发送意图并读取快照，从不直接修改棋盘。
#[wasm_bindgen]
pub struct MemoryGame {
    inner: SharedRuntime,
}

#[wasm_bindgen]
impl MemoryGame {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>, seed: Option<u32>) -> Result<MemoryGame, JsValue> {
        let config = parse_config(config_json)?;
        let session = Session::new(config, seed.map(u64::from));
        let runtime = Runtime {
            session,
            ticker: None,
            resolver: None,
            announcer: None,
            waiters: Vec::new(),
            on_change: None,
            on_round_complete: None,
        };
        Ok(MemoryGame {
            inner: Rc::new(RefCell::new(runtime)),
        })
    }

    /// 当前回合编号。
    #[wasm_bindgen(getter)]
    pub fn generation(&self) -> f64 {
        self.inner.borrow().session.generation() as f64
    }

    #[wasm_bindgen(js_name = "onChange")]
    pub fn on_change(&self, callback: Option<Function>) {
        self.inner.borrow_mut().on_change = callback;
    }

    #[wasm_bindgen(js_name = "onRoundComplete")]
    pub fn on_round_complete(&self, callback: Option<Function>) {
        self.inner.borrow_mut().on_round_complete = callback;
    }

    /// 开始新的一局；对局中调用相当于重新洗牌。
    #[wasm_bindgen(js_name = "startRound")]
    pub fn start_round(&self) -> Result<JsValue, JsValue> {
        self.run("startRound", Session::start_round)
    }

    /// 以指定符号顺序开局，方便前端复现某一布局。
    #[wasm_bindgen(js_name = "startRoundWithSymbols")]
    pub fn start_round_with_symbols(&self, symbols: JsValue) -> Result<JsValue, JsValue> {
        let symbols: Vec<String> = from_value(symbols).map_err(JsValue::from)?;
        if symbols.is_empty() {
            return Err(JsValue::from_str("board must not be empty"));
        }
        let board = Board::from_symbols(symbols);
        let result = self
            .inner
            .borrow_mut()
            .session
            .start_round_with_board(board);
        match result {
            Ok(events) => self.apply(&events),
            Err(SessionError::Rule {
                error: RuleError::IntegrityViolation { error },
            }) => return Err(integrity_to_js(error)),
            Err(error) => utils::debug(&format!("startRoundWithSymbols ignored: {error}")),
        }
        self.snapshot()
    }

    /// 对局中返回首页，挂起的比对与计时全部作废。
    #[wasm_bindgen(js_name = "abandonRound")]
    pub fn abandon_round(&self) -> Result<JsValue, JsValue> {
        if self.inner.borrow().session.screen() != ScreenPhase::Playing {
            return self.snapshot();
        }
        self.run("abandonRound", Session::go_home)
    }

    #[wasm_bindgen(js_name = "playAgain")]
    pub fn play_again(&self) -> Result<JsValue, JsValue> {
        self.run("playAgain", Session::play_again)
    }

    #[wasm_bindgen(js_name = "goHome")]
    pub fn go_home(&self) -> Result<JsValue, JsValue> {
        self.run("goHome", Session::go_home)
    }

    /// 非法点击静默忽略，返回未变化的快照。
    #[wasm_bindgen(js_name = "selectCard")]
    pub fn select_card(&self, card_id: u32) -> Result<JsValue, JsValue> {
        self.run("selectCard", |session| session.select_card(card_id as CardId))
    }

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.borrow().session.snapshot())
    }

    #[wasm_bindgen(js_name = "snapshotJson")]
    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.inner.borrow().session.snapshot()).map_err(serde_to_js_error)
    }

    #[wasm_bindgen(js_name = "stateJson")]
    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.inner.borrow().session.state()).map_err(serde_to_js_error)
    }

    /// 当前回合宣布结果时兑现；回合被重开或放弃时拒绝。
    #[wasm_bindgen(js_name = "waitForCompletion")]
    pub fn wait_for_completion(&self) -> Promise {
        let runtime = Rc::clone(&self.inner);
        Promise::new(&mut |resolve, reject| {
            let mut rt = runtime.borrow_mut();
            let generation = rt.session.generation();
            let announced = rt.session.announced_stats(generation);
            let idle = rt.session.state().phase == RoundPhase::Idle;
            let waiter = CompletionWaiter {
                generation,
                resolve,
                reject,
            };
            match announced {
                Some(stats) => {
                    drop(rt);
                    waiter.settle(to_js(&stats));
                }
                None if idle => {
                    drop(rt);
                    reject_waiters(vec![waiter]);
                }
                None => rt.waiters.push(waiter),
            }
        })
    }
}

#[wasm_bindgen(js_name = "defaultConfig")]
pub fn default_config() -> Result<JsValue, JsValue> {
    to_js(&GameConfig::default())
}

#[wasm_bindgen(js_name = "performanceTier")]
pub fn performance_tier(attempts: u32) -> Result<JsValue, JsValue> {
    to_js(&TierInfo::from(PerformanceTier::from_attempts(attempts)))
}

#[wasm_bindgen(js_name = "formatTime")]
pub fn format_time_label(seconds: u32) -> String {
    format_time(seconds)
}

/// 生成一副洗好的牌，主要用于前端预览或调试。
#[wasm_bindgen(js_name = "generateBoard")]
pub fn generate_board(seed: Option<u32>, config_json: Option<String>) -> Result<JsValue, JsValue> {
    let config = parse_config(config_json)?;
    let mut rng = match seed {
        Some(seed) => SmallRng::seed_from_u64(u64::from(seed)),
        None => SmallRng::from_entropy(),
    };
    let board = Board::generate(&config.alphabet, &mut rng);
    to_js(&board.cards())
}

#[wasm_bindgen(js_name = "validateState")]
pub fn validate_state(state_json: &str) -> Result<(), JsValue> {
    let state: GameState = serde_json::from_str(state_json).map_err(serde_to_js_error)?;
    state.integrity_check().map_err(integrity_to_js)
}
