use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::board::{Board, CardId};
use super::config::GameConfig;
use super::timer::RoundTimer;

/// 回合编号。每次重开或放弃都会递增，延迟回调据此丢弃过期请求。
pub type Generation = u64;

/// 一局的统计数据。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundStats {
    pub time_elapsed: u32,
    pub attempts: u32,
    pub matches: u32,
}

/// 状态机所处阶段。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RoundPhase {
    #[default]
    Idle,
    AwaitingFirstPick,
    Comparing,
    Complete,
}

/// 推送给表现层的事件流。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    RoundStarted {
        generation: Generation,
        board_size: usize,
    },
    CardFlipped {
        card_id: CardId,
    },
    ComparisonStarted {
        generation: Generation,
        first: CardId,
        second: CardId,
        attempts: u32,
    },
    PairMatched {
        first: CardId,
        second: CardId,
        matches: u32,
    },
    PairMismatched {
        first: CardId,
        second: CardId,
    },
    TimerTicked {
        time_elapsed: u32,
    },
    RoundCompleted {
        generation: Generation,
        stats: RoundStats,
    },
    RoundAnnounced {
        generation: Generation,
        stats: RoundStats,
    },
    RoundAbandoned {
        generation: Generation,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum IntegrityError {
    OddBoardSize { size: usize },
    CardIdMismatch { index: usize, card_id: CardId },
    SymbolNotPaired { symbol: String, count: usize },
    TooManyFlipped { count: usize },
    FlippedMatchedCard { card_id: CardId },
    MatchCountMismatch { matches: u32, matched_cards: usize },
    PendingPairMismatch,
}

/// 单局游戏的全部状态，由状态机独占。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub config: GameConfig,
    pub board: Board,
    pub phase: RoundPhase,
    pub generation: Generation,
    pub attempts: u32,
    pub matches: u32,
    pub timer: RoundTimer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<(CardId, CardId)>,
    #[serde(default)]
    pub announced: bool,
}

impl GameState {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            board: Board::default(),
            phase: RoundPhase::Idle,
            generation: 0,
            attempts: 0,
            matches: 0,
            timer: RoundTimer::new(),
            pending: None,
            announced: false,
        }
    }

    pub fn stats(&self) -> RoundStats {
        RoundStats {
            time_elapsed: self.timer.elapsed_secs(),
            attempts: self.attempts,
            matches: self.matches,
        }
    }

    pub fn pairs_total(&self) -> usize {
        self.board.pairs_total()
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self.phase,
            RoundPhase::AwaitingFirstPick | RoundPhase::Comparing
        )
    }

    pub fn is_finished(&self) -> bool {
        self.phase == RoundPhase::Complete
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.generation == generation
    }

    /// 所有符号都已配对时为真，与 `matches * 2 == N` 等价。
    pub fn board_cleared(&self) -> bool {
        !self.board.is_empty() && self.matches as usize * 2 == self.board.len()
    }

    /// 丢弃当前棋盘与统计，换上新棋盘。
    pub(crate) fn install_board(&mut self, board: Board) {
        self.generation = self.generation.wrapping_add(1);
        self.board = board;
        self.phase = RoundPhase::AwaitingFirstPick;
        self.attempts = 0;
        self.matches = 0;
        self.pending = None;
        self.announced = false;
        self.timer.start();
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        let size = self.board.len();
        if size % 2 != 0 {
            return Err(IntegrityError::OddBoardSize { size });
        }

        for (index, card) in self.board.cards().iter().enumerate() {
            if card.id != index {
                return Err(IntegrityError::CardIdMismatch {
                    index,
                    card_id: card.id,
                });
            }
            if card.is_flipped && card.is_matched {
                return Err(IntegrityError::FlippedMatchedCard { card_id: card.id });
            }
        }

        for (symbol, count) in self.board.symbol_counts() {
            if count != 2 {
                return Err(IntegrityError::SymbolNotPaired {
                    symbol: symbol.to_string(),
                    count,
                });
            }
        }

        let flipped = self.board.flipped_ids();
        if flipped.len() > 2 {
            return Err(IntegrityError::TooManyFlipped {
                count: flipped.len(),
            });
        }

        let matched_cards = self.board.matched_count();
        if matched_cards != self.matches as usize * 2 {
            return Err(IntegrityError::MatchCountMismatch {
                matches: self.matches,
                matched_cards,
            });
        }

        match self.pending {
            Some((first, second)) => {
                let expected: HashSet<CardId> = [first, second].into_iter().collect();
                let actual: HashSet<CardId> = flipped.into_iter().collect();
                if self.phase != RoundPhase::Comparing || expected != actual {
                    return Err(IntegrityError::PendingPairMismatch);
                }
            }
            None if self.phase == RoundPhase::Comparing => {
                return Err(IntegrityError::PendingPairMismatch);
            }
            None => {}
        }

        Ok(())
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}
