use serde::{Deserialize, Serialize};

use super::state::RoundStats;

/// 外层界面：首页、对局、胜利结算。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScreenPhase {
    #[default]
    Home,
    Playing,
    Victory,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum NavigationError {
    InvalidTransition {
        from: ScreenPhase,
        to: ScreenPhase,
    },
}

impl std::fmt::Display for NavigationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NavigationError::InvalidTransition { from, to } => {
                write!(f, "cannot navigate from {from:?} to {to:?}")
            }
        }
    }
}

impl std::error::Error for NavigationError {}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Navigator {
    screen: ScreenPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_stats: Option<RoundStats>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn screen(&self) -> ScreenPhase {
        self.screen
    }

    /// 最近一局的冻结统计，仅在胜利界面有意义。
    pub fn last_stats(&self) -> Option<RoundStats> {
        self.last_stats
    }

    fn transition(&mut self, to: ScreenPhase, allowed: &[ScreenPhase]) -> Result<(), NavigationError> {
        if !allowed.contains(&self.screen) {
            return Err(NavigationError::InvalidTransition {
                from: self.screen,
                to,
            });
        }
        self.screen = to;
        Ok(())
    }

    pub fn start_round(&mut self) -> Result<(), NavigationError> {
        self.transition(ScreenPhase::Playing, &[ScreenPhase::Home])?;
        self.last_stats = None;
        Ok(())
    }

    pub fn complete_round(&mut self, stats: RoundStats) -> Result<(), NavigationError> {
        self.transition(ScreenPhase::Victory, &[ScreenPhase::Playing])?;
        self.last_stats = Some(stats);
        Ok(())
    }

    pub fn play_again(&mut self) -> Result<(), NavigationError> {
        self.transition(ScreenPhase::Playing, &[ScreenPhase::Victory])?;
        self.last_stats = None;
        Ok(())
    }

    /// 从对局或结算返回首页。
    pub fn go_home(&mut self) -> Result<(), NavigationError> {
        self.transition(
            ScreenPhase::Home,
            &[ScreenPhase::Playing, ScreenPhase::Victory],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> RoundStats {
        RoundStats {
            time_elapsed: 30,
            attempts: 10,
            matches: 8,
        }
    }

    #[test]
    fn full_loop_through_every_screen() {
        let mut nav = Navigator::new();
        assert_eq!(nav.screen(), ScreenPhase::Home);

        nav.start_round().expect("home -> playing");
        nav.complete_round(stats()).expect("playing -> victory");
        assert_eq!(nav.screen(), ScreenPhase::Victory);
        assert_eq!(nav.last_stats(), Some(stats()));

        nav.play_again().expect("victory -> playing");
        assert_eq!(nav.screen(), ScreenPhase::Playing);
        assert_eq!(nav.last_stats(), None);

        nav.go_home().expect("playing -> home");
        assert_eq!(nav.screen(), ScreenPhase::Home);
    }

    #[test]
    fn victory_can_return_home() {
        let mut nav = Navigator::new();
        nav.start_round().expect("start");
        nav.complete_round(stats()).expect("complete");
        nav.go_home().expect("victory -> home");
        assert_eq!(nav.screen(), ScreenPhase::Home);
    }

    #[test]
    fn invalid_transitions_leave_screen_unchanged() {
        let mut nav = Navigator::new();
        assert_eq!(
            nav.play_again(),
            Err(NavigationError::InvalidTransition {
                from: ScreenPhase::Home,
                to: ScreenPhase::Playing,
            })
        );
        assert!(nav.complete_round(stats()).is_err());
        assert!(nav.go_home().is_err());
        assert_eq!(nav.screen(), ScreenPhase::Home);

        nav.start_round().expect("start");
        assert!(nav.start_round().is_err());
        assert_eq!(nav.screen(), ScreenPhase::Playing);
    }
}
