use crate::config::ComparatorConfig;
use crate::error::{Error, Result};
use crate::guidance::{Balance, Suggestion, Zoom};
use crate::landmarks::{BodyLandmark, LandmarkSet};
use crate::reference::{self, ReferencePoints};
use crate::scoring::{axis_part_score, delta_score, mean, weighted_mean};
use crate::shapes::point::Point;
use serde::{Deserialize, Serialize};
use tracing::{Level, debug, span, trace};

/// Distances between the detected and the reference body parts.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct PoseDeltas {
    pub nose: f32,
    pub shoulders: f32,
    pub hips: f32,
}

impl PoseDeltas {
    pub fn mean(&self) -> f32 {
        mean(&[self.nose, self.shoulders, self.hips])
    }
}

/// Per-part composition scores, 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct PoseParts {
    pub nose: f32,
    pub shoulders: f32,
    pub hips: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseComparison {
    pub overall_score: f32,
    pub position_score: f32,
    /// Composition against the reference framing.
    pub center_score: f32,
    pub suggestions: Vec<Suggestion>,
    pub deltas: PoseDeltas,
    pub parts: PoseParts,
    pub balance: Balance,
    pub zoom: Zoom,
    pub current_com: Point,
    pub target_com: Point,
}

// Reference positions in display space, resolved once at construction.
#[derive(Debug, Clone)]
struct PoseTargets {
    nose: Point,
    left_shoulder: Point,
    right_shoulder: Point,
    left_hip: Point,
    right_hip: Point,
    com: Point,
}

impl PoseTargets {
    fn resolve(r: &ReferencePoints) -> Result<PoseTargets> {
        Ok(PoseTargets {
            nose: r.absolute(reference::NOSE)?,
            left_shoulder: r.absolute(reference::LEFT_SHOULDER)?,
            right_shoulder: r.absolute(reference::RIGHT_SHOULDER)?,
            left_hip: r.absolute(reference::LEFT_HIP)?,
            right_hip: r.absolute(reference::RIGHT_HIP)?,
            com: r.com()?,
        })
    }

    fn shoulders(&self) -> Point {
        self.left_shoulder.midpoint(&self.right_shoulder)
    }

    fn hips(&self) -> Point {
        self.left_hip.midpoint(&self.right_hip)
    }
}

#[derive(Debug, Clone)]
pub struct PoseComparator {
    reference: ReferencePoints,
    config: ComparatorConfig,
    targets: PoseTargets,
}

impl PoseComparator {
    pub fn new(reference: ReferencePoints, config: ComparatorConfig) -> Result<PoseComparator> {
        reference.validate()?;
        config.validate()?;
        let targets = PoseTargets::resolve(&reference)?;

        Ok(PoseComparator {
            reference,
            config,
            targets,
        })
    }

    pub fn reference(&self) -> &ReferencePoints {
        &self.reference
    }

    pub fn config(&self) -> &ComparatorConfig {
        &self.config
    }

    pub fn compare(
        &self,
        landmarks: &LandmarkSet,
        image_width: u32,
        image_height: u32,
    ) -> Result<PoseComparison> {
        let span = span!(Level::DEBUG, "pose_compare");
        let _guard = span.enter();

        if image_width == 0 || image_height == 0 {
            return Err(Error::InvalidDimensions {
                width: image_width,
                height: image_height,
            });
        }

        let o = self.config.orientation;
        let t = &self.targets;

        let nose = landmarks.body(BodyLandmark::Nose, o)?;
        let l_shoulder = landmarks.body(BodyLandmark::LeftShoulder, o)?;
        let r_shoulder = landmarks.body(BodyLandmark::RightShoulder, o)?;
        let l_hip = landmarks.body(BodyLandmark::LeftHip, o)?;
        let r_hip = landmarks.body(BodyLandmark::RightHip, o)?;

        let deltas = PoseDeltas {
            nose: nose.distance(&t.nose),
            shoulders: (l_shoulder.distance(&t.left_shoulder)
                + r_shoulder.distance(&t.right_shoulder))
                / 2.,
            hips: (l_hip.distance(&t.left_hip) + r_hip.distance(&t.right_hip)) / 2.,
        };
        trace!("Pose deltas: {deltas:?}");

        let shoulders = l_shoulder.midpoint(&r_shoulder);
        let hips = l_hip.midpoint(&r_hip);

        let parts = PoseParts {
            nose: axis_part_score(&nose, &t.nose),
            shoulders: axis_part_score(&shoulders, &t.shoulders()),
            hips: axis_part_score(&hips, &t.hips()),
        };
        trace!("Pose part scores: {parts:?}");
        let center_score = mean(&[parts.nose, parts.shoulders, parts.hips]);

        let current_com = Point::mean(&[nose, shoulders, hips]);
        let threshold = self.config.balance_fraction * image_width as f32;
        let balance = Balance::classify(
            &current_com.to_pixels(image_width, image_height),
            &t.com.to_pixels(image_width, image_height),
            threshold,
        );

        let reference_distance = t.nose.distance(&t.com);
        let current_distance = nose.distance(&current_com);
        debug!("Current COM: {current_com:?}, target COM: {:?}", t.com);
        debug!("Nose to COM distance {current_distance} (reference {reference_distance})");
        let zoom = Zoom::classify(
            current_distance,
            reference_distance,
            self.config.zoom_tolerance,
        );

        let w = self.config.pose_weights;
        let position_score = weighted_mean(&[
            (delta_score(deltas.nose), w.nose),
            (delta_score(deltas.shoulders), w.shoulders),
            (delta_score(deltas.hips), w.hips),
        ]);

        let pw = self.config.position_weight;
        let overall_score = position_score * pw + center_score * (1. - pw);

        Ok(PoseComparison {
            overall_score,
            position_score,
            center_score,
            suggestions: self.suggestions(&deltas, center_score),
            deltas,
            parts,
            balance,
            zoom,
            current_com,
            target_com: t.com,
        })
    }

    fn suggestions(&self, deltas: &PoseDeltas, center_score: f32) -> Vec<Suggestion> {
        let c = &self.config;
        let mut suggestions = Vec::new();

        if deltas.nose > c.critical_threshold {
            suggestions.push(Suggestion::AdjustFace);
        }
        if deltas.shoulders > c.position_threshold {
            suggestions.push(Suggestion::AlignShoulders);
        }
        if deltas.hips > c.position_threshold {
            suggestions.push(Suggestion::AdjustHips);
        }
        if center_score < c.composition_floor {
            suggestions.push(Suggestion::FollowThirds);
        }

        if suggestions.is_empty() && deltas.mean() > c.position_threshold {
            suggestions.push(Suggestion::MatchOverallPose);
        }

        suggestions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{Landmark, Orientation};

    fn comparator() -> PoseComparator {
        PoseComparator::new(
            ReferencePoints::bundled().unwrap(),
            ComparatorConfig::default(),
        )
        .unwrap()
    }

    // Sensor-space landmarks placing each scored part at `f(part, display)`.
    fn posed_with(c: &PoseComparator, f: impl Fn(BodyLandmark, Point) -> Point) -> LandmarkSet {
        let o = c.config().orientation;
        let r = c.reference();
        let mut set = vec![Landmark::new(0.5, 0.5); BodyLandmark::COUNT];
        for (lm, label) in [
            (BodyLandmark::Nose, reference::NOSE),
            (BodyLandmark::LeftShoulder, reference::LEFT_SHOULDER),
            (BodyLandmark::RightShoulder, reference::RIGHT_SHOULDER),
            (BodyLandmark::LeftHip, reference::LEFT_HIP),
            (BodyLandmark::RightHip, reference::RIGHT_HIP),
        ] {
            set[lm.index()] = o.to_sensor(&f(lm, r.absolute(label).unwrap()));
        }
        LandmarkSet::new(set)
    }

    fn posed(c: &PoseComparator, f: impl Fn(Point) -> Point) -> LandmarkSet {
        posed_with(c, |_, p| f(p))
    }

    #[test]
    fn test_reference_pose_is_perfect() {
        let c = comparator();
        let res = c.compare(&posed(&c, |p| p), 720, 1280).unwrap();

        assert!(res.overall_score > 99.9, "{res:?}");
        assert_eq!(res.center_score, 100.);
        assert!(res.suggestions.is_empty());
        assert!(res.balance.is_centered());
        assert_eq!(res.zoom, Zoom::Perfect);
        assert!(res.current_com.distance(&res.target_com) < 1e-5);
    }

    #[test]
    fn test_shift_left_is_left_heavy() {
        let c = comparator();
        let shifted = posed(&c, |p| Point::new(p.x - 0.25, p.y));
        let res = c.compare(&shifted, 720, 1280).unwrap();

        assert!(res.balance.left);
        assert!(!res.balance.right && !res.balance.top && !res.balance.bottom);
        assert!((res.deltas.nose - 0.25).abs() < 1e-4);
        assert_eq!(
            res.suggestions,
            vec![
                Suggestion::AdjustFace,
                Suggestion::AlignShoulders,
                Suggestion::AdjustHips,
                Suggestion::FollowThirds,
            ]
        );
        // x diff 0.25 scores 20 on x, y is exact -> (20 + 100) / 4
        assert!((res.center_score - 30.).abs() < 1e-4);
        assert!(res.overall_score < 80.);
    }

    #[test]
    fn test_spread_out_means_zoom_out() {
        let c = comparator();
        let com = c.reference().com().unwrap();
        let bigger = posed(&c, |p| com + (p - com) * 1.3);
        assert_eq!(c.compare(&bigger, 720, 1280).unwrap().zoom, Zoom::ZoomOut);

        let smaller = posed(&c, |p| com + (p - com) * 0.7);
        assert_eq!(c.compare(&smaller, 720, 1280).unwrap().zoom, Zoom::ZoomIn);
    }

    #[test]
    fn test_slightly_wider_spread_zooms_out() {
        let c = comparator();
        let com = c.reference().com().unwrap();
        let wider = posed(&c, |p| com + (p - com) * 1.03);
        assert_eq!(c.compare(&wider, 720, 1280).unwrap().zoom, Zoom::ZoomOut);

        let narrower = posed(&c, |p| com + (p - com) * 0.97);
        assert_eq!(c.compare(&narrower, 720, 1280).unwrap().zoom, Zoom::ZoomIn);
    }

    #[test]
    fn test_moderate_drift_everywhere_gets_general_hint() {
        let c = comparator();
        let drifted = posed_with(&c, |lm, p| {
            let dx = if lm == BodyLandmark::Nose { 0.14 } else { 0.09 };
            Point::new(p.x + dx, p.y)
        });
        let res = c.compare(&drifted, 720, 1280).unwrap();

        // no single part crosses its threshold, but the mean delta does
        assert!(res.deltas.nose < c.config().critical_threshold);
        assert!(res.deltas.shoulders < c.config().position_threshold);
        assert!(res.deltas.hips < c.config().position_threshold);
        assert!(res.center_score >= c.config().composition_floor);
        assert_eq!(res.suggestions, vec![Suggestion::MatchOverallPose]);
    }

    #[test]
    fn test_small_vertical_offset_only_costs_composition() {
        let c = comparator();
        let lowered = posed(&c, |p| Point::new(p.x, p.y + 0.05));
        let res = c.compare(&lowered, 720, 1280).unwrap();

        // y diff 0.05 -> 70, x exact -> 100; 0.6*100 + 0.4*70 = 88 -> * 1.2, clamped
        assert_eq!(res.center_score, 100.);
        assert!(res.suggestions.is_empty());
        assert!(res.balance.bottom);
    }

    #[test]
    fn test_short_landmark_set_errors() {
        let c = comparator();
        let set = LandmarkSet::new(vec![Landmark::new(0.5, 0.5); 20]);
        assert!(matches!(
            c.compare(&set, 720, 1280),
            Err(Error::MissingLandmark { index: 23, len: 20 })
        ));
    }

    #[test]
    fn test_zero_dimensions_error() {
        let c = comparator();
        let set = posed(&c, |p| p);
        assert!(matches!(
            c.compare(&set, 0, 1280),
            Err(Error::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_upright_orientation() {
        let config = ComparatorConfig {
            orientation: Orientation::Upright,
            ..Default::default()
        };
        let c = PoseComparator::new(ReferencePoints::bundled().unwrap(), config).unwrap();
        let res = c.compare(&posed(&c, |p| p), 1080, 1920).unwrap();
        assert!(res.overall_score > 99.9);
    }
}
