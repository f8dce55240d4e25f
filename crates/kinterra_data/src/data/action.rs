use serde::{Deserialize, Serialize};

/// Cardinal facing on the torus, in clockwise order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Row/column step for one tile of movement in this direction.
    #[must_use]
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Right => (0, 1),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
        }
    }

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Right => 1,
            Direction::Down => 2,
            Direction::Left => 3,
        }
    }

    #[must_use]
    pub fn from_index(i: usize) -> Direction {
        Direction::ALL[i % 4]
    }

    /// Rotate clockwise by the given number of quarter turns.
    #[must_use]
    pub fn rotate_cw(self, quarter_turns: usize) -> Direction {
        Direction::from_index(self.index() + quarter_turns)
    }
}

/// The 11-symbol discrete action alphabet consumed from the host's action
/// buffer. Codes outside the alphabet degrade to `Noop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    MoveUp,
    MoveRight,
    MoveDown,
    MoveLeft,
    Noop,
    Pickup,
    Mine,
    Package,
    BuildWall,
    Attack,
    Reproduce,
}

impl Action {
    #[must_use]
    pub fn from_code(code: i32) -> Action {
        match code {
            0 => Action::MoveUp,
            1 => Action::MoveRight,
            2 => Action::MoveDown,
            3 => Action::MoveLeft,
            5 => Action::Pickup,
            6 => Action::Mine,
            7 => Action::Package,
            8 => Action::BuildWall,
            9 => Action::Attack,
            10 => Action::Reproduce,
            _ => Action::Noop,
        }
    }

    /// The facing a movement action points at, `None` for non-movement.
    #[must_use]
    pub fn move_direction(self) -> Option<Direction> {
        match self {
            Action::MoveUp => Some(Direction::Up),
            Action::MoveRight => Some(Direction::Right),
            Action::MoveDown => Some(Direction::Down),
            Action::MoveLeft => Some(Direction::Left),
            _ => None,
        }
    }
}
