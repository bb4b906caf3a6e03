use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// 原版棋盘：8 种符号，每种两张，共 16 张。
pub const ALPHABET_SIZE: usize = 8;
pub const BOARD_SIZE: usize = ALPHABET_SIZE * 2;

pub const COMPARE_SETTLE_DELAY_MS: u32 = 1_000;
pub const COMPLETE_ANNOUNCE_DELAY_MS: u32 = 500;
pub const TICK_INTERVAL_MS: u32 = 1_000;

pub const DEFAULT_SYMBOLS: [&str; ALPHABET_SIZE] =
    ["⚡", "🌟", "💎", "🔥", "❄️", "🌙", "⭐", "💫"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ConfigError {
    EmptyAlphabet,
    BlankSymbol { index: usize },
    DuplicateSymbol { symbol: String },
    ZeroTickInterval,
    ZeroColumns,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::EmptyAlphabet => write!(f, "alphabet must contain at least one symbol"),
            ConfigError::BlankSymbol { index } => write!(f, "symbol #{index} is blank"),
            ConfigError::DuplicateSymbol { symbol } => {
                write!(f, "symbol {symbol:?} appears more than once")
            }
            ConfigError::ZeroTickInterval => write!(f, "tick interval must be positive"),
            ConfigError::ZeroColumns => write!(f, "grid must have at least one column"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// 一局游戏的可调参数。棋盘大小始终为 `alphabet.len() * 2`。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    #[serde(default = "default_alphabet")]
    pub alphabet: Vec<String>,
    #[serde(default = "default_compare_settle")]
    pub compare_settle_ms: u32,
    #[serde(default = "default_complete_announce")]
    pub complete_announce_ms: u32,
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<usize>,
}

fn default_alphabet() -> Vec<String> {
    DEFAULT_SYMBOLS.iter().map(|symbol| symbol.to_string()).collect()
}

fn default_compare_settle() -> u32 {
    COMPARE_SETTLE_DELAY_MS
}

fn default_complete_announce() -> u32 {
    COMPLETE_ANNOUNCE_DELAY_MS
}

fn default_tick_interval() -> u32 {
    TICK_INTERVAL_MS
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            alphabet: default_alphabet(),
            compare_settle_ms: COMPARE_SETTLE_DELAY_MS,
            complete_announce_ms: COMPLETE_ANNOUNCE_DELAY_MS,
            tick_interval_ms: TICK_INTERVAL_MS,
            columns: None,
        }
    }
}

impl GameConfig {
    pub fn with_alphabet<I, S>(mut self, alphabet: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alphabet = alphabet.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_columns(mut self, columns: usize) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, String> {
        let config: GameConfig = serde_json::from_str(json).map_err(|err| err.to_string())?;
        config.validate().map_err(|err| err.to_string())?;
        Ok(config)
    }

    pub fn board_size(&self) -> usize {
        self.alphabet.len() * 2
    }

    pub fn pairs_total(&self) -> usize {
        self.alphabet.len()
    }

    pub fn grid_columns(&self) -> usize {
        self.grid_columns_for(self.board_size())
    }

    /// 未指定列数时取最接近正方形的排布（16 张 → 4 列）。
    pub fn grid_columns_for(&self, size: usize) -> usize {
        if let Some(columns) = self.columns {
            return columns.max(1);
        }
        let mut columns = 1;
        while columns * columns < size {
            columns += 1;
        }
        columns
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.alphabet.is_empty() {
            return Err(ConfigError::EmptyAlphabet);
        }
        let mut seen = HashSet::new();
        for (index, symbol) in self.alphabet.iter().enumerate() {
            if symbol.trim().is_empty() {
                return Err(ConfigError::BlankSymbol { index });
            }
            if !seen.insert(symbol.as_str()) {
                return Err(ConfigError::DuplicateSymbol {
                    symbol: symbol.clone(),
                });
            }
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        if self.columns == Some(0) {
            return Err(ConfigError::ZeroColumns);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_original_board() {
        let config = GameConfig::default();
        assert_eq!(config.board_size(), BOARD_SIZE);
        assert_eq!(config.pairs_total(), ALPHABET_SIZE);
        assert_eq!(config.grid_columns(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = GameConfig::from_json(r#"{ "compareSettleMs": 800 }"#)
            .expect("partial config should parse");
        assert_eq!(config.compare_settle_ms, 800);
        assert_eq!(config.complete_announce_ms, COMPLETE_ANNOUNCE_DELAY_MS);
        assert_eq!(config.alphabet.len(), ALPHABET_SIZE);
    }

    #[test]
    fn duplicate_symbols_are_rejected() {
        let config = GameConfig::default().with_alphabet(["A", "B", "A"]);
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateSymbol {
                symbol: "A".into()
            })
        );
    }

    #[test]
    fn blank_and_empty_alphabets_are_rejected() {
        let empty = GameConfig::default().with_alphabet(Vec::<String>::new());
        assert_eq!(empty.validate(), Err(ConfigError::EmptyAlphabet));

        let blank = GameConfig::default().with_alphabet(["A", "  "]);
        assert_eq!(blank.validate(), Err(ConfigError::BlankSymbol { index: 1 }));
    }

    #[test]
    fn explicit_columns_override_square_layout() {
        let config = GameConfig::default().with_alphabet(["A", "B", "C"]);
        assert_eq!(config.grid_columns(), 3);
        assert_eq!(config.with_columns(2).grid_columns(), 2);
    }
}
