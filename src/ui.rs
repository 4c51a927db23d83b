//! Presentation boundary
//!
//! The simulation pushes everything the screen needs through one
//! [`PresentationSink`]; it never reads presentation state back.

use serde::Serialize;

use crate::sim::{GameMode, GamePhase, Obstacle, Vehicle};

/// Label shown instead of a level name in free play
pub const ENDLESS_LABEL: &str = "Endless";

/// Audio events emitted by the core (fire-and-forget)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SoundCue {
    /// Run started or resumed
    EngineStart,
    /// Run paused
    EngineStop,
    /// Boost engaged
    Nitro,
    /// Run ended in a crash
    Crash,
    /// Best score beaten at the end of a run
    HighScore,
}

/// HUD values for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hud {
    pub score: u64,
    pub high_score: u64,
    /// "Level N: Name" or [`ENDLESS_LABEL`]
    pub level_label: String,
    pub nitro_percent: u8,
    pub boost_active: bool,
    /// Progress toward the selected mission target (mission runs only)
    pub mission_percent: Option<u8>,
}

/// Read-only view of the game handed to the presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot<'a> {
    pub phase: GamePhase,
    pub mode: GameMode,
    pub vehicle: &'a Vehicle,
    pub obstacles: &'a [Obstacle],
    pub hud: Hud,
}

/// How a run ended, for the game-over overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TerminalMessage {
    /// Free play crash
    FreePlaySummary,
    /// Mission target met
    LevelComplete { level: u32 },
    /// Final mission target met
    AllLevelsComplete,
    /// Mission target missed
    GameOver { level: u32 },
}

/// Result of a finished run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub mode: GameMode,
    pub score: u64,
    pub high_score: u64,
    pub new_high_score: bool,
    /// Frontier after this run, if it moved
    pub unlocked_level: Option<u32>,
    pub message: TerminalMessage,
}

impl RunSummary {
    /// Overlay headline
    pub fn headline(&self) -> String {
        match self.message {
            TerminalMessage::FreePlaySummary => format!("Game Over! Score: {}", self.score),
            TerminalMessage::LevelComplete { level } => {
                format!("Level {level} Complete! Score: {}", self.score)
            }
            TerminalMessage::AllLevelsComplete => {
                format!("All Missions Complete! Final Score: {}", self.score)
            }
            TerminalMessage::GameOver { level } => {
                format!("Level {level} Failed. Score: {}", self.score)
            }
        }
    }
}

/// Everything the core tells the outside world
pub trait PresentationSink {
    /// Called after every simulated frame and on start/pause/resume
    fn on_frame_rendered(&mut self, snapshot: &Snapshot<'_>);

    /// Called once when a run ends
    fn on_run_ended(&mut self, summary: &RunSummary);

    /// Audio hook; failures must be swallowed by the implementation
    fn on_cue(&mut self, _cue: SoundCue) {}
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl PresentationSink for NullSink {
    fn on_frame_rendered(&mut self, _snapshot: &Snapshot<'_>) {}
    fn on_run_ended(&mut self, _summary: &RunSummary) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(message: TerminalMessage) -> RunSummary {
        RunSummary {
            mode: GameMode::Free,
            score: 1234,
            high_score: 1234,
            new_high_score: true,
            unlocked_level: None,
            message,
        }
    }

    #[test]
    fn test_headlines() {
        assert_eq!(
            summary(TerminalMessage::FreePlaySummary).headline(),
            "Game Over! Score: 1234"
        );
        assert_eq!(
            summary(TerminalMessage::LevelComplete { level: 3 }).headline(),
            "Level 3 Complete! Score: 1234"
        );
        assert_eq!(
            summary(TerminalMessage::AllLevelsComplete).headline(),
            "All Missions Complete! Final Score: 1234"
        );
        assert_eq!(
            summary(TerminalMessage::GameOver { level: 7 }).headline(),
            "Level 7 Failed. Score: 1234"
        );
    }
}
