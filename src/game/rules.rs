use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::{
    board::{Board, CardId},
    state::{GameEvent, GameState, Generation, IntegrityError, RoundPhase, RoundStats},
};

/// 被拒绝的操作。状态保持不变，JS 侧按静默忽略处理。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RuleError {
    NoActiveRound,
    RoundFinished,
    ComparisonPending,
    CardNotFound { card_id: CardId },
    CardAlreadyMatched { card_id: CardId },
    CardAlreadyFlipped { card_id: CardId },
    NoPendingComparison,
    AlreadyAnnounced,
    NotComplete,
    StaleGeneration {
        expected: Generation,
        actual: Generation,
    },
    IntegrityViolation { error: IntegrityError },
}

impl std::fmt::Display for RuleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleError::NoActiveRound => write!(f, "no round in progress"),
            RuleError::RoundFinished => write!(f, "round already finished"),
            RuleError::ComparisonPending => write!(f, "two cards are already face up"),
            RuleError::CardNotFound { card_id } => write!(f, "card {card_id} does not exist"),
            RuleError::CardAlreadyMatched { card_id } => {
                write!(f, "card {card_id} is already matched")
            }
            RuleError::CardAlreadyFlipped { card_id } => {
                write!(f, "card {card_id} is already face up")
            }
            RuleError::NoPendingComparison => write!(f, "no comparison to resolve"),
            RuleError::AlreadyAnnounced => write!(f, "round result already announced"),
            RuleError::NotComplete => write!(f, "round is not complete"),
            RuleError::StaleGeneration { expected, actual } => {
                write!(f, "callback for round {actual} arrived during round {expected}")
            }
            RuleError::IntegrityViolation { error } => write!(f, "integrity violation: {error:?}"),
        }
    }
}

impl std::error::Error for RuleError {}

/// 驱动单局状态机：发牌、翻牌、比对、计时与完成判定。
pub struct RuleEngine {
    rng: SmallRng,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleEngine {
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

    fn ensure_current(state: &GameState, generation: Generation) -> Result<(), RuleError> {
        if !state.is_current(generation) {
            return Err(RuleError::StaleGeneration {
                expected: state.generation,
                actual: generation,
            });
        }
        Ok(())
    }

    fn ensure_integrity(state: &GameState) -> Result<(), RuleError> {
        state
            .integrity_check()
            .map_err(|error| RuleError::IntegrityViolation { error })
    }

    /// 任意阶段均可调用：洗一副新牌，统计清零，计时器重新开始。
    pub fn start_round(&mut self, state: &mut GameState) -> Result<Vec<GameEvent>, RuleError> {
        let board = Board::generate(&state.config.alphabet, &mut self.rng);
        Self::start_round_with_board(state, board)
    }

    /// 使用指定棋盘开局，用于回放固定布局。棋盘不成对时原状态不变。
    pub fn start_round_with_board(
        state: &mut GameState,
        board: Board,
    ) -> Result<Vec<GameEvent>, RuleError> {
        let mut next = state.clone();
        next.install_board(board);
        Self::ensure_integrity(&next)?;
        *state = next;
        Ok(vec![GameEvent::RoundStarted {
            generation: state.generation,
            board_size: state.board.len(),
        }])
    }

    /// 放弃当前回合。所有尚未触发的回调都会因编号过期而失效。
    pub fn abandon(state: &mut GameState) -> Vec<GameEvent> {
        let abandoned = state.generation;
        state.generation = state.generation.wrapping_add(1);
        state.timer.stop();
        state.phase = RoundPhase::Idle;
        state.pending = None;
        for id in state.board.flipped_ids() {
            if let Some(card) = state.board.get_mut(id) {
                card.is_flipped = false;
            }
        }
        vec![GameEvent::RoundAbandoned {
            generation: abandoned,
        }]
    }

    pub fn select_card(
        &mut self,
        state: &mut GameState,
        card_id: CardId,
    ) -> Result<Vec<GameEvent>, RuleError> {
        match state.phase {
            RoundPhase::Idle => return Err(RuleError::NoActiveRound),
            RoundPhase::Complete => return Err(RuleError::RoundFinished),
            RoundPhase::Comparing => return Err(RuleError::ComparisonPending),
            RoundPhase::AwaitingFirstPick => {}
        }

        let card = state
            .board
            .get(card_id)
            .ok_or(RuleError::CardNotFound { card_id })?;
        if card.is_matched {
            return Err(RuleError::CardAlreadyMatched { card_id });
        }
        if card.is_flipped {
            return Err(RuleError::CardAlreadyFlipped { card_id });
        }

        let already_up = state.board.flipped_ids();
        if already_up.len() >= 2 {
            return Err(RuleError::ComparisonPending);
        }

        if let Some(card) = state.board.get_mut(card_id) {
            card.is_flipped = true;
        }
        let mut events = vec![GameEvent::CardFlipped { card_id }];

        if let Some(&first) = already_up.first() {
            // 次数在开始比对时计入，而非比对结束时。
            state.attempts = state.attempts.saturating_add(1);
            state.pending = Some((first, card_id));
            state.phase = RoundPhase::Comparing;
            events.push(GameEvent::ComparisonStarted {
                generation: state.generation,
                first,
                second: card_id,
                attempts: state.attempts,
            });
        }

        Ok(events)
    }

    /// 比对延迟结束后调用，每次比对只生效一次。
    pub fn resolve_comparison(
        state: &mut GameState,
        generation: Generation,
    ) -> Result<Vec<GameEvent>, RuleError> {
        Self::ensure_current(state, generation)?;
        if state.phase != RoundPhase::Comparing {
            return Err(RuleError::NoPendingComparison);
        }
        Self::ensure_integrity(state)?;
        let (first, second) = state.pending.take().ok_or(RuleError::NoPendingComparison)?;

        let is_match = match (state.board.get(first), state.board.get(second)) {
            (Some(a), Some(b)) => a.symbol == b.symbol,
            _ => false,
        };

        let mut events = Vec::new();
        for id in [first, second] {
            if let Some(card) = state.board.get_mut(id) {
                card.is_flipped = false;
                if is_match {
                    card.is_matched = true;
                }
            }
        }

        if is_match {
            state.matches = state.matches.saturating_add(1);
            events.push(GameEvent::PairMatched {
                first,
                second,
                matches: state.matches,
            });
        } else {
            events.push(GameEvent::PairMismatched { first, second });
        }

        state.phase = RoundPhase::AwaitingFirstPick;

        if state.board_cleared() {
            state.phase = RoundPhase::Complete;
            state.timer.stop();
            events.push(GameEvent::RoundCompleted {
                generation: state.generation,
                stats: state.stats(),
            });
        }

        Ok(events)
    }

    /// 计时器每秒调用一次。
    pub fn tick(state: &mut GameState, generation: Generation) -> Result<Vec<GameEvent>, RuleError> {
        Self::ensure_current(state, generation)?;
        if !state.is_active() {
            return Err(RuleError::NoActiveRound);
        }
        if !state.timer.tick() {
            return Ok(Vec::new());
        }
        Ok(vec![GameEvent::TimerTicked {
            time_elapsed: state.timer.elapsed_secs(),
        }])
    }

    /// 交出本局最终统计，每局只成功一次。
    pub fn announce_completion(
        state: &mut GameState,
        generation: Generation,
    ) -> Result<RoundStats, RuleError> {
        Self::ensure_current(state, generation)?;
        if state.phase != RoundPhase::Complete {
            return Err(RuleError::NotComplete);
        }
        if state.announced {
            return Err(RuleError::AlreadyAnnounced);
        }
        state.announced = true;
        Ok(state.stats())
    }
}
