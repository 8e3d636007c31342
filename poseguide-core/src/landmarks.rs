use crate::error::{Error, Result};
use crate::shapes::point::Point;
use serde::{Deserialize, Serialize};

/// A single detector output point, normalized to the sensor frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Landmark {
        Landmark {
            x,
            y,
            ..Default::default()
        }
    }
}

/// How sensor coordinates map onto the preview the user is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Upright,
    /// Landscape sensor shown in a portrait preview.
    #[default]
    Rotated90,
}

impl Orientation {
    pub fn to_display(&self, lm: &Landmark) -> Point {
        match self {
            Orientation::Upright => Point::new(lm.x, lm.y),
            Orientation::Rotated90 => Point::new(1. - lm.y, lm.x),
        }
    }

    /// Inverse of `to_display`.
    pub fn to_sensor(&self, p: &Point) -> Landmark {
        match self {
            Orientation::Upright => Landmark::new(p.x, p.y),
            Orientation::Rotated90 => Landmark::new(p.y, 1. - p.x),
        }
    }
}

// Pose model indices (33 total)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum BodyLandmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl BodyLandmark {
    pub const COUNT: usize = 33;

    pub fn index(self) -> usize {
        self as usize
    }
}

// Face mesh indices for the features that get scored. The mesh itself has 468.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum FaceLandmark {
    Forehead = 10,
    NoseTip = 1,
    MouthCenter = 13,
    LeftEye = 33,
    Chin = 152,
    LeftEar = 234,
    RightEye = 263,
    RightEar = 454,
}

impl FaceLandmark {
    pub const MESH_SIZE: usize = 468;

    pub fn index(self) -> usize {
        self as usize
    }
}

/// All landmarks reported for one detected subject, in detector order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet {
    pub landmarks: Vec<Landmark>,
}

impl LandmarkSet {
    pub fn new(landmarks: Vec<Landmark>) -> LandmarkSet {
        LandmarkSet { landmarks }
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&Landmark> {
        self.landmarks.get(index).ok_or(Error::MissingLandmark {
            index,
            len: self.landmarks.len(),
        })
    }

    pub fn display(&self, index: usize, orientation: Orientation) -> Result<Point> {
        Ok(orientation.to_display(self.get(index)?))
    }

    pub fn body(&self, lm: BodyLandmark, orientation: Orientation) -> Result<Point> {
        self.display(lm.index(), orientation)
    }

    pub fn face(&self, lm: FaceLandmark, orientation: Orientation) -> Result<Point> {
        self.display(lm.index(), orientation)
    }

    pub fn display_points(&self, orientation: Orientation) -> Vec<Point> {
        self.landmarks
            .iter()
            .map(|lm| orientation.to_display(lm))
            .collect()
    }
}

impl From<Vec<Landmark>> for LandmarkSet {
    fn from(landmarks: Vec<Landmark>) -> Self {
        LandmarkSet { landmarks }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotated_display() {
        let lm = Landmark::new(0.25, 0.1);
        let p = Orientation::Rotated90.to_display(&lm);
        assert!((p.x - 0.9).abs() < 1e-6);
        assert!((p.y - 0.25).abs() < 1e-6);

        let back = Orientation::Rotated90.to_sensor(&p);
        assert!((back.x - lm.x).abs() < 1e-6);
        assert!((back.y - lm.y).abs() < 1e-6);
    }

    #[test]
    fn test_short_set_errors() {
        let set = LandmarkSet::new(vec![Landmark::new(0.5, 0.5); 12]);
        assert!(set.body(BodyLandmark::Nose, Orientation::Upright).is_ok());
        match set.body(BodyLandmark::LeftHip, Orientation::Upright) {
            Err(Error::MissingLandmark { index, len }) => {
                assert_eq!(index, 23);
                assert_eq!(len, 12);
            }
            other => panic!("expected missing landmark, got {other:?}"),
        }
    }

    #[test]
    fn test_landmark_defaults_deserialize() {
        let set: LandmarkSet = serde_json::from_str(r#"[{"x": 0.1, "y": 0.2}]"#).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.landmarks[0].z, 0.);
        assert_eq!(set.landmarks[0].visibility, None);
    }
}
