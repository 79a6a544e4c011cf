/// Events emitted during a simulation step.
/// The presentation layer consumes these for messages and sound.

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    IncursionStarted,
    /// The incursion was dropped without capturing anything.
    IncursionDiscarded,
    RegionCaptured { area: i64, percent: u32 },
    PlayerHit { lives: u32 },
    GameOver,
    LevelCleared,
}
