use serde::{Deserialize, Serialize};

/// Normalized display-space point. Both axes are in `[0, 1]` for anything
/// on screen, though nothing here enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Point {
        Point { x, y }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        Point {
            x: (self.x + other.x) / 2.,
            y: (self.y + other.y) / 2.,
        }
    }

    /// Mean of a non-empty set of points. Returns the origin for an empty
    /// slice.
    pub fn mean(points: &[Point]) -> Point {
        if points.is_empty() {
            return Point::default();
        }

        let n = points.len() as f32;
        let sum = points.iter().fold(Point::default(), |acc, p| acc + *p);
        Point::new(sum.x / n, sum.y / n)
    }

    /// Scale normalized coordinates up to a pixel grid.
    pub fn to_pixels(&self, width: u32, height: u32) -> Point {
        Point {
            x: self.x * width as f32,
            y: self.y * height as f32,
        }
    }
}

impl std::ops::Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Point {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Point {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl std::ops::Mul<f32> for Point {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self::Output {
        Point {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}
