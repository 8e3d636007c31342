//! Precomputed "ideal" landmark positions used as the comparison baseline.
//!
//! Pose offsets are stored relative to the reference centre of mass, face
//! offsets relative to the reference face centre. Both are immutable once
//! loaded.

use crate::error::{Error, Result};
use crate::shapes::point::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

const BUNDLED_POSE: &str = include_str!("../assets/half_average_posture.json");
const BUNDLED_COM: &str = include_str!("../assets/half_average_com.json");
const BUNDLED_FACE: &str = include_str!("../assets/face_average.json");

pub const NOSE: &str = "NOSE";
pub const LEFT_SHOULDER: &str = "LEFT_SHOULDER";
pub const RIGHT_SHOULDER: &str = "RIGHT_SHOULDER";
pub const LEFT_HIP: &str = "LEFT_HIP";
pub const RIGHT_HIP: &str = "RIGHT_HIP";

const SCORED_POSE_LABELS: [&str; 5] = [NOSE, LEFT_SHOULDER, RIGHT_SHOULDER, LEFT_HIP, RIGHT_HIP];

pub const LEFT_EYE: &str = "left_eye";
pub const RIGHT_EYE: &str = "right_eye";
pub const LEFT_EAR: &str = "left_ear";
pub const RIGHT_EAR: &str = "right_ear";
pub const MOUTH_CENTER: &str = "mouth_center";
pub const CHIN: &str = "chin";
pub const FOREHEAD: &str = "forehead";

const SCORED_FACE_LABELS: [&str; 7] = [
    LEFT_EYE,
    RIGHT_EYE,
    LEFT_EAR,
    RIGHT_EAR,
    MOUTH_CENTER,
    CHIN,
    FOREHEAD,
];

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReferencePoints {
    #[serde(default)]
    pub average_pose: BTreeMap<String, Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_com: Option<Point>,
}

impl ReferencePoints {
    pub fn from_json(json: &str) -> Result<ReferencePoints> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<ReferencePoints> {
        let path = path.as_ref();
        debug!("Loading pose reference from {path:?}");
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// The posture and centre-of-mass assets compiled into the crate.
    pub fn bundled() -> Result<ReferencePoints> {
        let pose = Self::from_json(BUNDLED_POSE)?;
        let com = Self::from_json(BUNDLED_COM)?;
        Ok(pose.merge(com))
    }

    /// Combine a posture file with a centre-of-mass file. Values already
    /// present in `self` win.
    pub fn merge(mut self, other: ReferencePoints) -> ReferencePoints {
        for (label, p) in other.average_pose {
            self.average_pose.entry(label).or_insert(p);
        }
        self.average_com = self.average_com.or(other.average_com);
        self
    }

    pub fn com(&self) -> Result<Point> {
        self.average_com
            .ok_or_else(|| Error::MissingReference("average_com".to_string()))
    }

    /// Position of `label` relative to the centre of mass.
    pub fn offset(&self, label: &str) -> Result<Point> {
        self.average_pose
            .get(label)
            .copied()
            .ok_or_else(|| Error::MissingReference(format!("average_pose.{label}")))
    }

    /// Position of `label` in display space.
    pub fn absolute(&self, label: &str) -> Result<Point> {
        Ok(self.offset(label)? + self.com()?)
    }

    pub fn validate(&self) -> Result<()> {
        self.com()?;
        for label in SCORED_POSE_LABELS {
            self.offset(label)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceFace {
    pub average_center: Point,
    #[serde(default)]
    pub average_distances: BTreeMap<String, Point>,
}

impl ReferenceFace {
    pub fn from_json(json: &str) -> Result<ReferenceFace> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<ReferenceFace> {
        let path = path.as_ref();
        debug!("Loading face reference from {path:?}");
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn bundled() -> Result<ReferenceFace> {
        Self::from_json(BUNDLED_FACE)
    }

    pub fn center(&self) -> Point {
        self.average_center
    }

    pub fn offset(&self, label: &str) -> Result<Point> {
        self.average_distances
            .get(label)
            .copied()
            .ok_or_else(|| Error::MissingReference(format!("average_distances.{label}")))
    }

    pub fn absolute(&self, label: &str) -> Result<Point> {
        Ok(self.center() + self.offset(label)?)
    }

    pub fn validate(&self) -> Result<()> {
        for label in SCORED_FACE_LABELS {
            self.offset(label)?;
        }
        Ok(())
    }
}
