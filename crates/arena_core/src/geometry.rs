//! Grid geometry and the fixed-point ratio type.
//!
//! Positions are integer grid cells and every distance is exact integer
//! arithmetic, saturating rather than overflowing at the edges of `i32`.
//! Decisions never compare fixed-point values: [`Fixed`] only renders ratios
//! for logs.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for reported ratios.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// A cell on the square arena grid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Position {
    /// Column.
    pub x: i32,
    /// Row. Larger `y` is "up".
    pub y: i32,
}

impl Position {
    /// Create a new position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to `other`.
    #[must_use]
    pub const fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).saturating_add(self.y.abs_diff(other.y))
    }

    /// Chebyshev distance to `other`.
    #[must_use]
    pub const fn chebyshev(self, other: Self) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        if dx > dy {
            dx
        } else {
            dy
        }
    }

    /// True when both cells share a row or a column.
    #[must_use]
    pub const fn is_aligned_with(self, other: Self) -> bool {
        self.x == other.x || self.y == other.y
    }

    /// The cell one step away in `direction`.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        self.offset(direction, 1)
    }

    /// The cell `distance` steps away in `direction`.
    #[must_use]
    pub const fn offset(self, direction: Direction, distance: i32) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(
            self.x.saturating_add(dx.saturating_mul(distance)),
            self.y.saturating_add(dy.saturating_mul(distance)),
        )
    }

    /// The four orthogonal neighbours, in [`Direction::ALL`] order.
    #[must_use]
    pub const fn neighbors(self) -> [Self; 4] {
        [
            self.step(Direction::ALL[0]),
            self.step(Direction::ALL[1]),
            self.step(Direction::ALL[2]),
            self.step(Direction::ALL[3]),
        ]
    }

    /// Direction to face when acting on `target`.
    ///
    /// The dominant axis wins; ties go to the vertical axis. Returns `None`
    /// when `target` is this cell.
    #[must_use]
    pub fn direction_to(self, target: Self) -> Option<Direction> {
        let dx = i64::from(target.x) - i64::from(self.x);
        let dy = i64::from(target.y) - i64::from(self.y);
        if dx == 0 && dy == 0 {
            return None;
        }
        let direction = if dx.abs() > dy.abs() {
            if dx > 0 {
                Direction::Right
            } else {
                Direction::Left
            }
        } else if dy > 0 {
            Direction::Up
        } else {
            Direction::Down
        };
        Some(direction)
    }

    /// Cells strictly between `self` and `other` on a shared row or column.
    ///
    /// Returns `None` when the two cells are not orthogonally aligned.
    #[must_use]
    pub fn cells_between(self, other: Self) -> Option<Vec<Self>> {
        if self.x == other.x {
            let (lo, hi) = (self.y.min(other.y), self.y.max(other.y));
            Some((lo.saturating_add(1)..hi).map(|y| Self::new(self.x, y)).collect())
        } else if self.y == other.y {
            let (lo, hi) = (self.x.min(other.x), self.x.max(other.x));
            Some((lo.saturating_add(1)..hi).map(|x| Self::new(x, self.y)).collect())
        } else {
            None
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cardinal direction for movement and directional actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// +y.
    #[serde(rename = "u")]
    Up,
    /// -y.
    #[serde(rename = "d")]
    Down,
    /// -x.
    #[serde(rename = "l")]
    Left,
    /// +x.
    #[serde(rename = "r")]
    Right,
}

impl Direction {
    /// All directions in canonical order.
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// Grid delta for one step.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, 1),
            Self::Down => (0, -1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// Wire character used by the game protocol.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Up => 'u',
            Self::Down => 'd',
            Self::Left => 'l',
            Self::Right => 'r',
        }
    }

    /// Parse a wire character.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'u' => Some(Self::Up),
            'd' => Some(Self::Down),
            'l' => Some(Self::Left),
            'r' => Some(Self::Right),
            _ => None,
        }
    }
}

/// Fixed-point value of `numerator / denominator`, with a zero denominator
/// treated as one.
#[must_use]
pub fn ratio(numerator: Fixed, denominator: u32) -> Fixed {
    numerator / Fixed::from_num(denominator.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manhattan_and_chebyshev() {
        let a = Position::new(0, 0);
        let b = Position::new(3, -4);
        assert_eq!(a.manhattan(b), 7);
        assert_eq!(a.chebyshev(b), 4);
        assert_eq!(b.manhattan(a), 7);
    }

    #[test]
    fn test_distances_saturate_at_extremes() {
        let low = Position::new(i32::MIN, i32::MIN);
        let high = Position::new(i32::MAX, i32::MAX);
        assert_eq!(low.manhattan(high), u32::MAX);
        assert_eq!(low.chebyshev(high), u32::MAX);
        assert_eq!(low.direction_to(high), Some(Direction::Up));
        assert_eq!(high.step(Direction::Right), high);
        assert_eq!(
            Position::new(i32::MAX, 0).cells_between(Position::new(i32::MAX, 0)),
            Some(Vec::new())
        );
    }

    #[test]
    fn test_direction_to_prefers_dominant_axis() {
        let origin = Position::new(5, 5);
        assert_eq!(origin.direction_to(Position::new(9, 6)), Some(Direction::Right));
        assert_eq!(origin.direction_to(Position::new(1, 5)), Some(Direction::Left));
        assert_eq!(origin.direction_to(Position::new(5, 8)), Some(Direction::Up));
        assert_eq!(origin.direction_to(Position::new(4, 1)), Some(Direction::Down));
        // Equal magnitudes resolve vertically.
        assert_eq!(origin.direction_to(Position::new(7, 7)), Some(Direction::Up));
        assert_eq!(origin.direction_to(origin), None);
    }

    #[test]
    fn test_cells_between_orthogonal_only() {
        let a = Position::new(2, 2);
        assert_eq!(
            a.cells_between(Position::new(2, 5)),
            Some(vec![Position::new(2, 3), Position::new(2, 4)])
        );
        assert_eq!(
            a.cells_between(Position::new(0, 2)),
            Some(vec![Position::new(1, 2)])
        );
        assert_eq!(a.cells_between(Position::new(3, 2)), Some(vec![]));
        assert_eq!(a.cells_between(Position::new(3, 3)), None);
    }

    #[test]
    fn test_step_and_offset() {
        let p = Position::new(1, 1);
        assert_eq!(p.step(Direction::Up), Position::new(1, 2));
        assert_eq!(p.offset(Direction::Left, 3), Position::new(-2, 1));
        assert_eq!(
            p.neighbors(),
            [
                Position::new(1, 2),
                Position::new(1, 0),
                Position::new(0, 1),
                Position::new(2, 1),
            ]
        );
    }

    #[test]
    fn test_direction_char_roundtrip_table() {
        for direction in Direction::ALL {
            assert_eq!(Direction::from_char(direction.as_char()), Some(direction));
        }
        assert_eq!(Direction::from_char('x'), None);
    }

    #[test]
    fn test_ratio_guards_zero_denominator() {
        assert_eq!(ratio(Fixed::from_num(10), 0), Fixed::from_num(10));
        assert_eq!(ratio(Fixed::from_num(10), 4), Fixed::from_num(2.5));
    }
}
