use serde::{Deserialize, Serialize};

use super::{
    board::{Board, CardId},
    config::GameConfig,
    navigator::{NavigationError, Navigator, ScreenPhase},
    rules::{RuleEngine, RuleError},
    snapshot::RoundSnapshot,
    state::{GameEvent, GameState, Generation, RoundPhase, RoundStats},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind")]
pub enum SessionError {
    Rule { error: RuleError },
    Navigation { error: NavigationError },
}

impl From<RuleError> for SessionError {
    fn from(error: RuleError) -> Self {
        SessionError::Rule { error }
    }
}

impl From<NavigationError> for SessionError {
    fn from(error: NavigationError) -> Self {
        SessionError::Navigation { error }
    }
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Rule { error } => error.fmt(f),
            SessionError::Navigation { error } => error.fmt(f),
        }
    }
}

impl std::error::Error for SessionError {}

/// 一个玩家会话：当前对局状态加上外层界面导航，由宿主独占持有。
pub struct Session {
    engine: RuleEngine,
    state: GameState,
    navigator: Navigator,
}

impl Session {
    pub fn new(config: GameConfig, seed: Option<u64>) -> Self {
        let engine = match seed {
            Some(seed) => RuleEngine::with_seed(seed),
            None => RuleEngine::new(),
        };
        Self {
            engine,
            state: GameState::new(config),
            navigator: Navigator::new(),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.state.config
    }

    pub fn screen(&self) -> ScreenPhase {
        self.navigator.screen()
    }

    pub fn generation(&self) -> Generation {
        self.state.generation
    }

    /// 首页进入对局、结算后再来一局、或对局中重新洗牌。
    pub fn start_round(&mut self) -> Result<Vec<GameEvent>, SessionError> {
        let events = self.engine.start_round(&mut self.state)?;
        self.enter_playing()?;
        Ok(events)
    }

    /// 以固定棋盘开局，其余同 [`Session::start_round`]。棋盘不成对时界面不动。
    pub fn start_round_with_board(&mut self, board: Board) -> Result<Vec<GameEvent>, SessionError> {
        let events = RuleEngine::start_round_with_board(&mut self.state, board)?;
        self.enter_playing()?;
        Ok(events)
    }

    /// 仅在结算界面有效。
    pub fn play_again(&mut self) -> Result<Vec<GameEvent>, SessionError> {
        let screen = self.navigator.screen();
        if screen != ScreenPhase::Victory {
            return Err(NavigationError::InvalidTransition {
                from: screen,
                to: ScreenPhase::Playing,
            }
            .into());
        }
        self.start_round()
    }

    fn enter_playing(&mut self) -> Result<(), NavigationError> {
        match self.navigator.screen() {
            ScreenPhase::Home => self.navigator.start_round(),
            ScreenPhase::Victory => self.navigator.play_again(),
            ScreenPhase::Playing => Ok(()),
        }
    }

    /// 放弃对局或离开结算界面，回到首页。
    pub fn go_home(&mut self) -> Result<Vec<GameEvent>, SessionError> {
        self.navigator.go_home()?;
        if self.state.phase != RoundPhase::Idle {
            return Ok(RuleEngine::abandon(&mut self.state));
        }
        Ok(Vec::new())
    }

    pub fn select_card(&mut self, card_id: CardId) -> Result<Vec<GameEvent>, SessionError> {
        Ok(self.engine.select_card(&mut self.state, card_id)?)
    }

    pub fn resolve_comparison(
        &mut self,
        generation: Generation,
    ) -> Result<Vec<GameEvent>, SessionError> {
        Ok(RuleEngine::resolve_comparison(&mut self.state, generation)?)
    }

    pub fn tick(&mut self, generation: Generation) -> Result<Vec<GameEvent>, SessionError> {
        Ok(RuleEngine::tick(&mut self.state, generation)?)
    }

    /// 交出最终统计并切到胜利界面。每局只会成功一次。
    pub fn announce(&mut self, generation: Generation) -> Result<RoundStats, SessionError> {
        let stats = RuleEngine::announce_completion(&mut self.state, generation)?;
        self.navigator.complete_round(stats)?;
        Ok(stats)
    }

    /// 本局已宣布的最终统计。
    pub fn announced_stats(&self, generation: Generation) -> Option<RoundStats> {
        if self.state.is_current(generation) && self.state.announced {
            return Some(self.state.stats());
        }
        None
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        let announced = match self.navigator.screen() {
            ScreenPhase::Victory => self.navigator.last_stats(),
            _ => None,
        };
        RoundSnapshot::capture(&self.state, self.navigator.screen(), announced)
    }
}
