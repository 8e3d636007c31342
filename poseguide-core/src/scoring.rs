//! Piecewise scoring curves shared by the pose and face comparators.
//!
//! Differences are absolute axis distances in normalized display units.
//! Every score lands in `[0, 100]`.

use crate::shapes::point::Point;
use serde::{Deserialize, Serialize};

/// Horizontal placement is judged more leniently than vertical.
pub fn x_score(diff: f32) -> f32 {
    match diff.abs() {
        d if d < 0.05 => 100.,
        d if d < 0.1 => 80.,
        d if d < 0.15 => 60.,
        d if d < 0.2 => 40.,
        _ => 20.,
    }
}

pub fn y_score(diff: f32) -> f32 {
    match diff.abs() {
        d if d >= 0.1 => 0.,
        d if d < 0.02 => 100.,
        d if d < 0.04 => 90.,
        d if d < 0.06 => 70.,
        d if d < 0.08 => 50.,
        _ => 30.,
    }
}

pub fn part_score(x: f32, y: f32) -> f32 {
    if x >= 80. && y >= 80. {
        return 100.;
    }

    if x <= 40. || y <= 40. {
        return (x + y) / 4.;
    }

    // x:y = 6:4
    let base = x * 0.6 + y * 0.4;

    let adjusted = match base {
        b if b >= 70. => b * 1.2,
        b if b >= 50. => b * 1.1,
        b if b >= 30. => b * 0.9,
        b => b * 0.8,
    };

    adjusted.clamp(0., 100.)
}

pub fn axis_part_score(current: &Point, reference: &Point) -> f32 {
    part_score(
        x_score(current.x - reference.x),
        y_score(current.y - reference.y),
    )
}

/// Smaller distances score higher; anything a full frame away scores 0.
pub fn delta_score(distance: f32) -> f32 {
    (1. - distance.min(1.)) * 100.
}

/// `(value, weight)` pairs. Zero total weight yields 0.
pub fn weighted_mean(pairs: &[(f32, f32)]) -> f32 {
    let (sum, total) = pairs
        .iter()
        .fold((0., 0.), |(s, t), (v, w)| (s + v * w, t + w));

    if total > 0. { sum / total } else { 0. }
}

pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTier {
    Good,
    Fair,
    Poor,
}

impl ScoreTier {
    pub fn of(score: f32) -> ScoreTier {
        if score >= 90. {
            ScoreTier::Good
        } else if score >= 70. {
            ScoreTier::Fair
        } else {
            ScoreTier::Poor
        }
    }
}
