//! 把棋盘映射为表现层可以直接绘制的视图（2D 网格或 3D 场景均适用）。

use serde::{Deserialize, Serialize};

use super::board::{Card, CardId};
use super::navigator::ScreenPhase;
use super::state::{GameState, Generation, RoundPhase, RoundStats};
use super::summary::RoundSummary;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CardFace {
    Hidden,
    Revealed,
    Matched,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    pub id: CardId,
    /// 背面朝上时不下发符号。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    pub face: CardFace,
    pub row: usize,
    pub column: usize,
    pub is_flipped: bool,
    pub is_matched: bool,
}

impl CardView {
    pub fn from_card(card: &Card, columns: usize) -> Self {
        let face = if card.is_matched {
            CardFace::Matched
        } else if card.is_flipped {
            CardFace::Revealed
        } else {
            CardFace::Hidden
        };
        let columns = columns.max(1);
        Self {
            id: card.id,
            symbol: (face != CardFace::Hidden).then(|| card.symbol.clone()),
            face,
            row: card.id / columns,
            column: card.id % columns,
            is_flipped: card.is_flipped,
            is_matched: card.is_matched,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundSnapshot {
    pub generation: Generation,
    pub phase: RoundPhase,
    pub screen: ScreenPhase,
    pub board: Vec<CardView>,
    pub stats: RoundStats,
    pub pairs_total: usize,
    pub columns: usize,
    pub rows: usize,
    /// 输入是否被锁定（比对进行中或本局已结束）。
    pub input_locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<RoundSummary>,
}

impl RoundSnapshot {
    pub fn capture(state: &GameState, screen: ScreenPhase, announced: Option<RoundStats>) -> Self {
        let columns = state.config.grid_columns_for(state.board.len());
        let rows = state.board.len().div_ceil(columns);
        let board = state
            .board
            .cards()
            .iter()
            .map(|card| CardView::from_card(card, columns))
            .collect();
        Self {
            generation: state.generation,
            phase: state.phase,
            screen,
            board,
            stats: state.stats(),
            pairs_total: state.pairs_total(),
            columns,
            rows,
            input_locked: !matches!(state.phase, RoundPhase::AwaitingFirstPick),
            summary: announced.map(|stats| RoundSummary::new(stats, state.pairs_total())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::Board;
    use crate::game::rules::RuleEngine;
    use crate::game::summary::PerformanceTier;

    fn started() -> (RuleEngine, GameState) {
        let mut engine = RuleEngine::with_seed(9);
        let mut state = GameState::default();
        engine.start_round(&mut state).expect("deal");
        (engine, state)
    }

    #[test]
    fn hidden_cards_do_not_leak_symbols() {
        let (_, state) = started();
        let snapshot = RoundSnapshot::capture(&state, ScreenPhase::Playing, None);

        assert_eq!(snapshot.board.len(), 16);
        assert!(snapshot
            .board
            .iter()
            .all(|view| view.face == CardFace::Hidden && view.symbol.is_none()));
        assert!(!snapshot.input_locked);
    }

    #[test]
    fn default_board_lays_out_as_four_by_four() {
        let (_, state) = started();
        let snapshot = RoundSnapshot::capture(&state, ScreenPhase::Playing, None);

        assert_eq!(snapshot.columns, 4);
        assert_eq!(snapshot.rows, 4);
        let last = snapshot.board.last().expect("board is not empty");
        assert_eq!((last.row, last.column), (3, 3));
    }

    #[test]
    fn flipped_and_matched_cards_show_their_symbol() {
        let mut engine = RuleEngine::with_seed(2);
        let mut state = GameState::default();
        RuleEngine::start_round_with_board(&mut state, Board::from_symbols(["A", "A", "B", "B"]))
            .expect("paired board");
        let generation = state.generation;

        engine.select_card(&mut state, 0).expect("pick");
        engine.select_card(&mut state, 1).expect("pick");
        let comparing = RoundSnapshot::capture(&state, ScreenPhase::Playing, None);
        assert!(comparing.input_locked);
        assert_eq!(comparing.board[0].face, CardFace::Revealed);
        assert_eq!(comparing.board[0].symbol.as_deref(), Some("A"));

        RuleEngine::resolve_comparison(&mut state, generation).expect("resolve");
        let resolved = RoundSnapshot::capture(&state, ScreenPhase::Playing, None);
        assert_eq!(resolved.board[1].face, CardFace::Matched);
        assert_eq!(resolved.board[2].face, CardFace::Hidden);
    }

    #[test]
    fn announced_round_carries_summary() {
        let (_, state) = started();
        let stats = RoundStats {
            time_elapsed: 40,
            attempts: 12,
            matches: 8,
        };
        let snapshot = RoundSnapshot::capture(&state, ScreenPhase::Victory, Some(stats));
        let summary = snapshot.summary.expect("summary present");
        assert_eq!(summary.tier, PerformanceTier::Perfect);
        assert_eq!(summary.pairs_total, 8);

        let json = serde_json::to_value(&snapshot.board[0]).expect("view should serialize");
        assert_eq!(json["isFlipped"], false);
        assert_eq!(json["face"], "hidden");
        assert!(json.get("symbol").is_none());
    }
}
