use std::fmt;

/// A direction the whole board can be slid in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameAction {
    Left,
    Right,
    Up,
    Down,
}

impl GameAction {
    /// Number of distinct actions, also the size of every action slot table.
    pub const COUNT: usize = 4;

    /// All actions ordered by id.
    pub const ALL: [GameAction; GameAction::COUNT] = [
        GameAction::Left,
        GameAction::Right,
        GameAction::Up,
        GameAction::Down,
    ];

    /// Stable index of the action, used to address fixed-size slot arrays.
    pub fn id(self) -> usize {
        match self {
            GameAction::Left => 0,
            GameAction::Right => 1,
            GameAction::Up => 2,
            GameAction::Down => 3,
        }
    }

    pub fn from_id(id: usize) -> Option<Self> {
        Self::ALL.get(id).copied()
    }
}

impl fmt::Display for GameAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameAction::Left => "LEFT",
            GameAction::Right => "RIGHT",
            GameAction::Up => "UP",
            GameAction::Down => "DOWN",
        };
        f.write_str(name)
    }
}
