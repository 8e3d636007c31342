use crate::error::{Error, Result};
use crate::landmarks::Orientation;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoseWeights {
    pub nose: f32,
    pub shoulders: f32,
    pub hips: f32,
}

impl Default for PoseWeights {
    fn default() -> Self {
        // face position matters most
        PoseWeights {
            nose: 0.4,
            shoulders: 0.3,
            hips: 0.3,
        }
    }
}

/// Thresholds and weights for both comparators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComparatorConfig {
    /// Part delta above which a suggestion is raised.
    pub position_threshold: f32,
    /// Nose / face-centre delta above which a suggestion is raised.
    pub critical_threshold: f32,
    /// Composition score below which the rule-of-thirds suggestion is raised.
    pub composition_floor: f32,
    /// Heaviness threshold as a fraction of the image width, applied in
    /// pixels on both axes.
    pub balance_fraction: f32,
    /// Band around the reference nose-to-COM distance that counts as framed.
    /// Zero accepts only a match.
    pub zoom_tolerance: f32,
    pub pose_weights: PoseWeights,
    /// Share of the overall pose score taken by the position score; the
    /// remainder comes from composition.
    pub position_weight: f32,
    pub orientation: Orientation,
}

impl Default for ComparatorConfig {
    fn default() -> Self {
        ComparatorConfig {
            position_threshold: 0.1,
            critical_threshold: 0.15,
            composition_floor: 70.,
            balance_fraction: 0.05,
            zoom_tolerance: 0.,
            pose_weights: PoseWeights::default(),
            position_weight: 0.7,
            orientation: Orientation::default(),
        }
    }
}

impl ComparatorConfig {
    pub fn from_json(json: &str) -> Result<ComparatorConfig> {
        let config: ComparatorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<ComparatorConfig> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0. ..=1.).contains(&self.position_weight) {
            return Err(Error::InvalidConfig(format!(
                "position_weight must be within [0, 1], got {}",
                self.position_weight
            )));
        }

        let w = self.pose_weights;
        if [w.nose, w.shoulders, w.hips]
            .iter()
            .any(|v| *v < 0. || !v.is_finite())
        {
            return Err(Error::InvalidConfig(
                "pose_weights must be finite and not negative".to_string(),
            ));
        }

        if !(0. ..=100.).contains(&self.composition_floor) {
            return Err(Error::InvalidConfig(format!(
                "composition_floor must be within [0, 100], got {}",
                self.composition_floor
            )));
        }

        for (name, v) in [
            ("position_threshold", self.position_threshold),
            ("critical_threshold", self.critical_threshold),
            ("balance_fraction", self.balance_fraction),
            ("zoom_tolerance", self.zoom_tolerance),
        ] {
            if v < 0. || !v.is_finite() {
                return Err(Error::InvalidConfig(format!("{name} must be >= 0, got {v}")));
            }
        }

        Ok(())
    }
}
