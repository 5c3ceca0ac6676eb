/// Signals emitted during a simulation step.
/// Fire-and-forget: the presentation layer consumes these for sound and
/// effects, and nothing it does feeds back into the world.

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    /// Footstep while sliding (every 15th tick).
    Step,
    GrassCleared { x: i32, y: i32 },
    DoorOpened { x: i32, y: i32 },
    KeyPickup,
    PlutoniumPickup { count: u32 },
    Deposit { count: u32 },
    BlockadePlaced { x: i32, y: i32 },
    BlockadeRecovered { x: i32, y: i32 },
    BlockadeRefilled,
    Death { cause: DeathCause },
    LevelStart { index: usize },
    LevelComplete,
    /// Decorative trail puff at a pixel position (every 5th tick while sliding).
    TrailEmitted { x: f32, y: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeathCause {
    Radiation,
    Laser,
    Enemy,
}
