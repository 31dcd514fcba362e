//! Two over-segmentation conventions feed different markets. `Phase` splits
//! at 6/15; `OverWindow` splits at 6/13 and stops after the 20th over.

use serde::{Deserialize, Serialize};

/// Powerplay / middle / death: `over < 6`, `6 <= over < 15`, `over >= 15`
/// (0-indexed over numbers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Powerplay,
    Middle,
    Death,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Powerplay, Phase::Middle, Phase::Death];

    pub fn of_over(over: u32) -> Self {
        if over < 6 {
            Phase::Powerplay
        } else if over < 15 {
            Phase::Middle
        } else {
            Phase::Death
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Powerplay => "powerplay",
            Phase::Middle => "middle",
            Phase::Death => "death",
        }
    }
}

/// Overs 1-6, 7-13, 14-20 as printed on a scorecard (0-indexed 0..=5,
/// 6..=12, 13..=19). Overs past the 20th belong to no window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverWindow {
    Overs1To6,
    Overs7To13,
    Overs14To20,
}

impl OverWindow {
    pub fn of_over(over: u32) -> Option<Self> {
        match over {
            0..=5 => Some(OverWindow::Overs1To6),
            6..=12 => Some(OverWindow::Overs7To13),
            13..=19 => Some(OverWindow::Overs14To20),
            _ => None,
        }
    }
}

/// Runs split by [`Phase`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseRuns {
    pub powerplay: u32,
    pub middle: u32,
    pub death: u32,
}

impl PhaseRuns {
    pub fn add(&mut self, over: u32, runs: u32) {
        match Phase::of_over(over) {
            Phase::Powerplay => self.powerplay += runs,
            Phase::Middle => self.middle += runs,
            Phase::Death => self.death += runs,
        }
    }

    pub fn get(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Powerplay => self.powerplay,
            Phase::Middle => self.middle,
            Phase::Death => self.death,
        }
    }
}

/// Runs split by [`OverWindow`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRuns {
    pub overs_1_6: u32,
    pub overs_7_13: u32,
    pub overs_14_20: u32,
}

impl WindowRuns {
    pub fn add(&mut self, over: u32, runs: u32) {
        match OverWindow::of_over(over) {
            Some(OverWindow::Overs1To6) => self.overs_1_6 += runs,
            Some(OverWindow::Overs7To13) => self.overs_7_13 += runs,
            Some(OverWindow::Overs14To20) => self.overs_14_20 += runs,
            None => {}
        }
    }
}
