use std::ops;

use serde::{Deserialize, Serialize};

/// A point on the display plane.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

impl<T> Point<T> {
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }

    pub fn map<U>(self, f: fn(T) -> U) -> Point<U> {
        Point::<U> {
            x: f(self.x),
            y: f(self.y),
        }
    }
}

impl<T> From<(T, T)> for Point<T> {
    fn from((x, y): (T, T)) -> Self {
        Self { x, y }
    }
}

impl<T> From<Point<T>> for (T, T) {
    fn from(point: Point<T>) -> Self {
        (point.x, point.y)
    }
}

impl<T> ops::Sub<Self> for Point<T>
where
    T: ops::Sub<Output = T>,
{
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Point;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_point() {
        let p = Point { x: 10_i16, y: 10 };

        assert_eq!(p - Point { x: 12, y: 1 }, Point { x: -2_i16, y: 9 });
        assert_eq!(p.map(i32::from), Point { x: 10_i32, y: 10 });
        assert_eq!(<(i16, i16)>::from(p), (10, 10));
    }

    #[test]
    fn widened_subtraction_does_not_wrap() {
        let global = Point::new(i16::MIN, i16::MAX).map(i32::from);
        let origin = Point::new(i16::MAX, i16::MIN).map(i32::from);

        assert_eq!(global - origin, Point::new(-65535, 65535));
    }
}
