//! 翻牌配对游戏的核心逻辑（发牌、状态机、计时、结算）。

pub mod board;
pub mod config;
pub mod navigator;
pub mod rules;
pub mod session;
pub mod snapshot;
pub mod state;
pub mod summary;
pub mod timer;

pub use board::{Board, Card, CardId};
pub use config::{
    ConfigError,
    GameConfig,
    ALPHABET_SIZE,
    BOARD_SIZE,
    COMPARE_SETTLE_DELAY_MS,
    COMPLETE_ANNOUNCE_DELAY_MS,
    DEFAULT_SYMBOLS,
    TICK_INTERVAL_MS,
};
pub use navigator::{NavigationError, Navigator, ScreenPhase};
pub use rules::{RuleEngine, RuleError};
pub use session::{Session, SessionError};
pub use snapshot::{CardFace, CardView, RoundSnapshot};
pub use state::{GameEvent, GameState, Generation, IntegrityError, RoundPhase, RoundStats};
pub use summary::{format_time, PerformanceTier, RoundSummary, TierInfo};
pub use timer::RoundTimer;
