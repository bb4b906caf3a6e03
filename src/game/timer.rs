use serde::{Deserialize, Serialize};

/// 每局的计时器：只计整秒，停止后保留读数。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundTimer {
    elapsed_secs: u32,
    running: bool,
}

impl RoundTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 归零并开始计时。
    pub fn start(&mut self) {
        self.elapsed_secs = 0;
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    /// 返回计时是否前进了一秒。
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.elapsed_secs = self.elapsed_secs.saturating_add(1);
        true
    }
}
