//! 2D coordinates and movement directions.
//!
//! A [`Vector`] component may be absent, which is how the stage encodes
//! "no value" (for example the position of a node that was never placed).
//! Arithmetic treats an absent component as 0, but equality and
//! [`Vector::is_empty`] still tell an unset vector apart from `(0, 0)`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Immutable 2D vector with optional components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl Vector {
    /// Both components absent.
    pub const NULL: Self = Self { x: None, y: None };
    pub const ZERO: Self = Self { x: Some(0.0), y: Some(0.0) };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x: Some(x), y: Some(y) }
    }

    /// Random integer vector with `x` in `[min_x, max_x)` and `y` in `[min_y, max_y)`.
    ///
    /// An empty range collapses to its lower bound.
    pub fn range_random(rng: &mut impl Rng, min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        let x = (rng.gen::<f64>() * (max_x - min_x) + min_x).floor();
        let y = (rng.gen::<f64>() * (max_y - min_y) + min_y).floor();
        Self::new(x.max(min_x), y.max(min_y))
    }

    /// True when either component is unset.
    pub fn is_empty(&self) -> bool {
        self.x.is_none() || self.y.is_none()
    }

    /// Components with absent values read as 0.
    pub fn extract(&self) -> (f64, f64) {
        (self.x.unwrap_or(0.0), self.y.unwrap_or(0.0))
    }

    /// Clamp both axes independently into `[min, max]`.
    pub fn clamp(&self, max: Vector, min: Vector) -> Self {
        let (x, y) = self.extract();
        let (max_x, max_y) = max.extract();
        let (min_x, min_y) = min.extract();
        Self::new(x.max(min_x).min(max_x), y.max(min_y).min(max_y))
    }

    /// [`clamp`](Self::clamp) with the lower bound at the origin.
    pub fn clamp_to(&self, max: Vector) -> Self {
        self.clamp(max, Vector::ZERO)
    }

    /// Round both axes toward negative infinity, mapping a continuous
    /// position onto its grid cell.
    pub fn floor(&self) -> Self {
        let (x, y) = self.extract();
        Self::new(x.floor(), y.floor())
    }

    pub fn add(&self, v: Vector) -> Self {
        let (x, y) = self.extract();
        let (vx, vy) = v.extract();
        Self::new(x + vx, y + vy)
    }

    pub fn subtract(&self, v: Vector) -> Self {
        let (x, y) = self.extract();
        let (vx, vy) = v.extract();
        Self::new(x - vx, y - vy)
    }

    pub fn multiply(&self, c: f64) -> Self {
        let (x, y) = self.extract();
        Self::new(x * c, y * c)
    }

    pub fn divide(&self, c: f64) -> Self {
        let (x, y) = self.extract();
        Self::new(x / c, y / c)
    }

    /// Grid cell indices, or `None` if the floored cell has a negative axis.
    pub fn cell(&self) -> Option<(usize, usize)> {
        let (x, y) = self.floor().extract();
        if x < 0.0 || y < 0.0 {
            None
        } else {
            Some((x as usize, y as usize))
        }
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y) = self.extract();
        write!(f, "({}, {})", x, y)
    }
}

impl std::ops::Add for Vector {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Vector::add(&self, other)
    }
}

impl std::ops::Sub for Vector {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        self.subtract(other)
    }
}

impl std::ops::Mul<f64> for Vector {
    type Output = Self;
    fn mul(self, scalar: f64) -> Self {
        self.multiply(scalar)
    }
}

impl std::ops::Div<f64> for Vector {
    type Output = Self;
    fn div(self, scalar: f64) -> Self {
        self.divide(scalar)
    }
}

/// Unit moves on the tile grid.
///
/// ```text
/// [UpLeft]    [Up]    [UpRight]
/// [Left]    [Center]    [Right]
/// [DownLeft] [Down]  [DownRight]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    UpLeft,
    Up,
    UpRight,
    Left,
    Center,
    Right,
    DownLeft,
    Down,
    DownRight,
}

impl Direction {
    /// Four-way moves in search expansion order. The order is the BFS
    /// tie-break between equally distant targets.
    pub const CARDINAL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Eight-way moves (cardinal first, then diagonals).
    pub const ALL: [Direction; 8] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
        Direction::UpLeft,
        Direction::UpRight,
        Direction::DownLeft,
        Direction::DownRight,
    ];

    pub const fn vector(self) -> Vector {
        match self {
            Direction::UpLeft => Vector::new(-1.0, -1.0),
            Direction::Up => Vector::new(0.0, -1.0),
            Direction::UpRight => Vector::new(1.0, -1.0),
            Direction::Left => Vector::new(-1.0, 0.0),
            Direction::Center => Vector::new(0.0, 0.0),
            Direction::Right => Vector::new(1.0, 0.0),
            Direction::DownLeft => Vector::new(-1.0, 1.0),
            Direction::Down => Vector::new(0.0, 1.0),
            Direction::DownRight => Vector::new(1.0, 1.0),
        }
    }

    pub fn is_diagonal(self) -> bool {
        matches!(
            self,
            Direction::UpLeft | Direction::UpRight | Direction::DownLeft | Direction::DownRight
        )
    }

    /// Direction whose unit vector equals `v`, if any.
    pub fn from_vector(v: Vector) -> Option<Direction> {
        [Direction::Center]
            .into_iter()
            .chain(Direction::ALL)
            .find(|d| d.vector() == v)
    }
}

impl From<Direction> for Vector {
    fn from(d: Direction) -> Self {
        d.vector()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn absent_components_are_zero_in_arithmetic() {
        let unset = Vector::NULL;
        assert_eq!(unset + Vector::new(2.0, 3.0), Vector::new(2.0, 3.0));
        assert_eq!(unset.multiply(4.0), Vector::ZERO);
        assert_eq!(Vector { x: Some(1.0), y: None }.extract(), (1.0, 0.0));
    }

    #[test]
    fn empty_is_distinct_from_zero() {
        assert!(Vector::NULL.is_empty());
        assert!(Vector { x: Some(0.0), y: None }.is_empty());
        assert!(!Vector::ZERO.is_empty());
        assert_ne!(Vector::NULL, Vector::ZERO);
    }

    #[test]
    fn floor_rounds_toward_negative_infinity() {
        assert_eq!(Vector::new(1.7, -0.5).floor(), Vector::new(1.0, -1.0));
        assert_eq!(Vector::new(-2.0, 3.999).floor(), Vector::new(-2.0, 3.0));
    }

    #[test]
    fn clamp_each_axis_independently() {
        let max = Vector::new(4.0, 2.0);
        assert_eq!(Vector::new(9.0, -3.0).clamp_to(max), Vector::new(4.0, 0.0));
        assert_eq!(
            Vector::new(0.0, 5.0).clamp(max, Vector::new(1.0, 1.0)),
            Vector::new(1.0, 2.0)
        );
    }

    #[test]
    fn arithmetic_returns_new_values() {
        let a = Vector::new(1.0, 2.0);
        let b = a.add(Direction::Right.vector());
        assert_eq!(a, Vector::new(1.0, 2.0));
        assert_eq!(b, Vector::new(2.0, 2.0));
        assert_eq!(b.subtract(a), Vector::new(1.0, 0.0));
        assert_eq!(Vector::new(3.0, 6.0) / 3.0, Vector::new(1.0, 2.0));
    }

    #[test]
    fn cardinal_set_has_no_diagonals() {
        assert!(Direction::CARDINAL.iter().all(|d| !d.is_diagonal()));
        assert_eq!(Direction::ALL.iter().filter(|d| d.is_diagonal()).count(), 4);
        assert_eq!(
            Direction::from_vector(Vector::new(0.0, -1.0)),
            Some(Direction::Up)
        );
    }

    #[test]
    fn range_random_stays_in_bounds() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let v = Vector::range_random(&mut rng, 0.0, 8.0, 0.0, 5.0);
            let (x, y) = v.extract();
            assert!((0.0..8.0).contains(&x));
            assert!((0.0..5.0).contains(&y));
            assert_eq!(v, v.floor());
        }
    }

    #[test]
    fn display_uses_zero_for_absent() {
        assert_eq!(Vector::NULL.to_string(), "(0, 0)");
        assert_eq!(Vector::new(1.5, 2.0).to_string(), "(1.5, 2)");
    }
}
