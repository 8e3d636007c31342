use super::point::Point;
use serde::{Deserialize, Serialize};

/// Normalized rectangle stored by edges.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Rect {
        Rect {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Bounding box of a set of points, `None` when the set is empty.
    pub fn from_points(points: &[Point]) -> Option<Rect> {
        let first = points.first()?;
        let init = Rect::new(first.x, first.y, first.x, first.y);

        Some(points.iter().fold(init, |r, p| Rect {
            left: r.left.min(p.x),
            top: r.top.min(p.y),
            right: r.right.max(p.x),
            bottom: r.bottom.max(p.y),
        }))
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.left + self.width() / 2.,
            self.top + self.height() / 2.,
        )
    }

    /// Grow each side by `margin`, keeping the result within the unit square.
    pub fn pad(&mut self, margin: f32) -> Rect {
        self.left = (self.left - margin).clamp(0., 1.);
        self.top = (self.top - margin).clamp(0., 1.);
        self.right = (self.right + margin).clamp(0., 1.);
        self.bottom = (self.bottom + margin).clamp(0., 1.);

        *self
    }

    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points() {
        let r = Rect::from_points(&[
            Point::new(0.3, 0.6),
            Point::new(0.1, 0.2),
            Point::new(0.5, 0.4),
        ])
        .unwrap();
        assert_eq!(r, Rect::new(0.1, 0.2, 0.5, 0.6));
        assert!(Rect::from_points(&[]).is_none());
    }

    #[test]
    fn test_pad_clamps() {
        let mut r = Rect::new(0.05, 0.3, 0.5, 0.95);
        r.pad(0.1);
        assert_eq!(r.left, 0.);
        assert!((r.top - 0.2).abs() < 1e-6);
        assert!((r.right - 0.6).abs() < 1e-6);
        assert_eq!(r.bottom, 1.);
    }

    #[test]
    fn test_contains_edges() {
        let r = Rect::new(0.2, 0.2, 0.4, 0.4);
        assert!(r.contains(&Point::new(0.2, 0.4)));
        assert!(r.contains(&r.center()));
        assert!(!r.contains(&Point::new(0.41, 0.3)));
    }
}
