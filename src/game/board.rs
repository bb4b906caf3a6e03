use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// 卡牌在棋盘上的位置编号，同时也是它的唯一标识。
pub type CardId = usize;

/// 棋盘上的一张卡牌。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub symbol: String,
    #[serde(default)]
    pub is_flipped: bool,
    #[serde(default)]
    pub is_matched: bool,
}

impl Card {
    pub fn new(id: CardId, symbol: impl Into<String>) -> Self {
        Self {
            id,
            symbol: symbol.into(),
            is_flipped: false,
            is_matched: false,
        }
    }

    /// 已配对或正处于翻开状态的卡牌不可再被选择。
    pub fn is_selectable(&self) -> bool {
        !self.is_matched && !self.is_flipped
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Board {
    cards: Vec<Card>,
}

impl Board {
    /// 每个符号放入两张，洗牌后按最终位置编号。
    pub fn generate<R, S>(alphabet: &[S], rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
        S: AsRef<str>,
    {
        let mut symbols: Vec<&str> = alphabet
            .iter()
            .flat_map(|symbol| [symbol.as_ref(), symbol.as_ref()])
            .collect();
        symbols.shuffle(rng);
        Self::from_symbols(symbols)
    }

    /// 按给定顺序摆放，不洗牌。
    pub fn from_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cards = symbols
            .into_iter()
            .enumerate()
            .map(|(id, symbol)| Card::new(id, symbol))
            .collect();
        Self { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn pairs_total(&self) -> usize {
        self.cards.len() / 2
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn get(&self, id: CardId) -> Option<&Card> {
        self.cards.get(id)
    }

    pub fn get_mut(&mut self, id: CardId) -> Option<&mut Card> {
        self.cards.get_mut(id)
    }

    pub fn flipped_ids(&self) -> Vec<CardId> {
        self.cards
            .iter()
            .filter(|card| card.is_flipped)
            .map(|card| card.id)
            .collect()
    }

    pub fn flipped_count(&self) -> usize {
        self.cards.iter().filter(|card| card.is_flipped).count()
    }

    pub fn matched_count(&self) -> usize {
        self.cards.iter().filter(|card| card.is_matched).count()
    }

    pub fn all_matched(&self) -> bool {
        !self.cards.is_empty() && self.cards.iter().all(|card| card.is_matched)
    }

    pub fn symbol_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for card in &self.cards {
            *counts.entry(card.symbol.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::DEFAULT_SYMBOLS;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn generated_board_holds_every_symbol_twice() {
        for seed in 0..64 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let board = Board::generate(&DEFAULT_SYMBOLS, &mut rng);

            assert_eq!(board.len(), 16);
            let counts = board.symbol_counts();
            assert_eq!(counts.len(), DEFAULT_SYMBOLS.len());
            assert!(counts.values().all(|&count| count == 2), "seed {seed}");
        }
    }

    #[test]
    fn generated_cards_start_face_down_with_positional_ids() {
        let mut rng = SmallRng::seed_from_u64(7);
        let board = Board::generate(&DEFAULT_SYMBOLS, &mut rng);

        for (index, card) in board.cards().iter().enumerate() {
            assert_eq!(card.id, index);
            assert!(!card.is_flipped);
            assert!(!card.is_matched);
        }
    }

    #[test]
    fn same_seed_produces_same_layout() {
        let first = Board::generate(&DEFAULT_SYMBOLS, &mut SmallRng::seed_from_u64(42));
        let second = Board::generate(&DEFAULT_SYMBOLS, &mut SmallRng::seed_from_u64(42));
        assert_eq!(first, second);
    }

    #[test]
    fn shuffling_actually_moves_cards() {
        let layouts: std::collections::HashSet<Vec<String>> = (0..16)
            .map(|seed| {
                Board::generate(&DEFAULT_SYMBOLS, &mut SmallRng::seed_from_u64(seed))
                    .cards()
                    .iter()
                    .map(|card| card.symbol.clone())
                    .collect()
            })
            .collect();
        assert!(layouts.len() > 1, "different seeds should yield different boards");
    }

    #[test]
    fn fixed_board_keeps_given_order() {
        let board = Board::from_symbols(["A", "A", "B", "B"]);
        assert_eq!(board.pairs_total(), 2);
        assert_eq!(board.get(2).map(|card| card.symbol.as_str()), Some("B"));
        assert!(board.get(4).is_none());
    }
}
