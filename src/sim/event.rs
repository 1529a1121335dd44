/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and the score screens.

pub use crate::domain::context::Sfx;

#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(dead_code)]
pub enum GameEvent {
    Sound(Sfx),
    PlayerKilled,
    LevelCleared { level: usize },
    LevelLoaded { level: usize },
    /// The death sequence finished; the caller records the score.
    RunEnded { score: u32, level: u32 },
    GameComplete { score: u32 },
}
