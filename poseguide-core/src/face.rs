use crate::config::ComparatorConfig;
use crate::error::{Error, Result};
use crate::guidance::{Balance, Suggestion};
use crate::landmarks::{FaceLandmark, LandmarkSet};
use crate::reference::{self, ReferenceFace};
use crate::scoring::{axis_part_score, mean};
use crate::shapes::point::Point;
use serde::{Deserialize, Serialize};
use tracing::{Level, debug, span, trace};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct FaceDeltas {
    pub nose: f32,
    pub eyes: f32,
    pub ears: f32,
    pub mouth_and_chin: f32,
    pub forehead: f32,
}

impl FaceDeltas {
    pub fn mean(&self) -> f32 {
        mean(&[
            self.nose,
            self.eyes,
            self.ears,
            self.mouth_and_chin,
            self.forehead,
        ])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FaceParts {
    pub left_eye: f32,
    pub right_eye: f32,
    pub left_ear: f32,
    pub right_ear: f32,
    pub mouth_center: f32,
    pub chin: f32,
    pub forehead: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceComparison {
    pub overall_score: f32,
    pub suggestions: Vec<Suggestion>,
    pub deltas: FaceDeltas,
    pub parts: FaceParts,
    pub balance: Balance,
    pub current_center: Point,
    pub target_center: Point,
}

#[derive(Debug, Clone)]
struct FaceTargets {
    center: Point,
    left_eye: Point,
    right_eye: Point,
    left_ear: Point,
    right_ear: Point,
    mouth_center: Point,
    chin: Point,
    forehead: Point,
}

impl FaceTargets {
    fn resolve(r: &ReferenceFace) -> Result<FaceTargets> {
        Ok(FaceTargets {
            center: r.center(),
            left_eye: r.absolute(reference::LEFT_EYE)?,
            right_eye: r.absolute(reference::RIGHT_EYE)?,
            left_ear: r.absolute(reference::LEFT_EAR)?,
            right_ear: r.absolute(reference::RIGHT_EAR)?,
            mouth_center: r.absolute(reference::MOUTH_CENTER)?,
            chin: r.absolute(reference::CHIN)?,
            forehead: r.absolute(reference::FOREHEAD)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct FaceComparator {
    reference: ReferenceFace,
    config: ComparatorConfig,
    targets: FaceTargets,
}

impl FaceComparator {
    pub fn new(reference: ReferenceFace, config: ComparatorConfig) -> Result<FaceComparator> {
        reference.validate()?;
        config.validate()?;
        let targets = FaceTargets::resolve(&reference)?;

        Ok(FaceComparator {
            reference,
            config,
            targets,
        })
    }

    pub fn reference(&self) -> &ReferenceFace {
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
    ) -> Result<FaceComparison> {
        let span = span!(Level::DEBUG, "face_compare");
        let _guard = span.enter();

        if image_width == 0 || image_height == 0 {
            return Err(Error::InvalidDimensions {
                width: image_width,
                height: image_height,
            });
        }

        let o = self.config.orientation;
        let t = &self.targets;

        let nose = landmarks.face(FaceLandmark::NoseTip, o)?;
        let l_eye = landmarks.face(FaceLandmark::LeftEye, o)?;
        let r_eye = landmarks.face(FaceLandmark::RightEye, o)?;
        let l_ear = landmarks.face(FaceLandmark::LeftEar, o)?;
        let r_ear = landmarks.face(FaceLandmark::RightEar, o)?;
        let mouth = landmarks.face(FaceLandmark::MouthCenter, o)?;
        let chin = landmarks.face(FaceLandmark::Chin, o)?;
        let forehead = landmarks.face(FaceLandmark::Forehead, o)?;

        let deltas = FaceDeltas {
            nose: nose.distance(&t.center),
            eyes: (l_eye.distance(&t.left_eye) + r_eye.distance(&t.right_eye)) / 2.,
            ears: (l_ear.distance(&t.left_ear) + r_ear.distance(&t.right_ear)) / 2.,
            mouth_and_chin: (mouth.distance(&t.mouth_center) + chin.distance(&t.chin)) / 2.,
            forehead: forehead.distance(&t.forehead),
        };
        trace!("Face deltas: {deltas:?}");

        let parts = FaceParts {
            left_eye: axis_part_score(&l_eye, &t.left_eye),
            right_eye: axis_part_score(&r_eye, &t.right_eye),
            left_ear: axis_part_score(&l_ear, &t.left_ear),
            right_ear: axis_part_score(&r_ear, &t.right_ear),
            mouth_center: axis_part_score(&mouth, &t.mouth_center),
            chin: axis_part_score(&chin, &t.chin),
            forehead: axis_part_score(&forehead, &t.forehead),
        };
        trace!("Face part scores: {parts:?}");

        // eyes and mouth carry the expression; two strong features out of
        // three already reach the cap
        let overall_score =
            ((parts.left_eye + parts.right_eye + parts.mouth_center) * 4. / 3.).min(100.);
        debug!("Face score: {overall_score}");

        let threshold = self.config.balance_fraction * image_width as f32;
        let balance = Balance::classify(
            &nose.to_pixels(image_width, image_height),
            &t.center.to_pixels(image_width, image_height),
            threshold,
        );

        Ok(FaceComparison {
            overall_score,
            suggestions: self.suggestions(&deltas),
            deltas,
            parts,
            balance,
            current_center: nose,
            target_center: t.center,
        })
    }

    fn suggestions(&self, deltas: &FaceDeltas) -> Vec<Suggestion> {
        let c = &self.config;
        let mut suggestions = Vec::new();

        if deltas.nose > c.critical_threshold {
            suggestions.push(Suggestion::AdjustFaceCenter);
        }
        if deltas.eyes > c.position_threshold {
            suggestions.push(Suggestion::AdjustEyes);
        }
        if deltas.ears > c.position_threshold {
            suggestions.push(Suggestion::AdjustEars);
        }
        if deltas.mouth_and_chin > c.position_threshold {
            suggestions.push(Suggestion::AlignMouthAndChin);
        }

        if suggestions.is_empty() && deltas.mean() > c.position_threshold {
            suggestions.push(Suggestion::MatchOverallFace);
        }

        suggestions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::Landmark;

    fn comparator() -> FaceComparator {
        FaceComparator::new(ReferenceFace::bundled().unwrap(), ComparatorConfig::default())
            .unwrap()
    }

    fn faced_with(c: &FaceComparator, f: impl Fn(FaceLandmark, Point) -> Point) -> LandmarkSet {
        let o = c.config().orientation;
        let r = c.reference();
        let mut set = vec![Landmark::new(0.5, 0.5); FaceLandmark::MESH_SIZE];
        set[FaceLandmark::NoseTip.index()] = o.to_sensor(&f(FaceLandmark::NoseTip, r.center()));
        for (lm, label) in [
            (FaceLandmark::LeftEye, reference::LEFT_EYE),
            (FaceLandmark::RightEye, reference::RIGHT_EYE),
            (FaceLandmark::LeftEar, reference::LEFT_EAR),
            (FaceLandmark::RightEar, reference::RIGHT_EAR),
            (FaceLandmark::MouthCenter, reference::MOUTH_CENTER),
            (FaceLandmark::Chin, reference::CHIN),
            (FaceLandmark::Forehead, reference::FOREHEAD),
        ] {
            set[lm.index()] = o.to_sensor(&f(lm, r.absolute(label).unwrap()));
        }
        LandmarkSet::new(set)
    }

    fn faced(c: &FaceComparator, f: impl Fn(Point) -> Point) -> LandmarkSet {
        faced_with(c, |_, p| f(p))
    }

    #[test]
    fn test_reference_face_is_perfect() {
        let c = comparator();
        let res = c.compare(&faced(&c, |p| p), 720, 1280).unwrap();
        assert_eq!(res.overall_score, 100.);
        assert!(res.suggestions.is_empty());
        assert!(res.balance.is_centered());
    }

    #[test]
    fn test_raised_face() {
        let c = comparator();
        let res = c
            .compare(&faced(&c, |p| Point::new(p.x, p.y - 0.2)), 720, 1280)
            .unwrap();

        assert!(res.balance.top);
        assert!(!res.balance.bottom && !res.balance.left && !res.balance.right);
        // y diff >= 0.1 zeroes the y score -> 25 per part, 75 * 4 / 3 hits the cap
        assert_eq!(res.parts.left_eye, 25.);
        assert!((res.overall_score - 100.).abs() < 1e-4);
        assert_eq!(
            res.suggestions,
            vec![
                Suggestion::AdjustFaceCenter,
                Suggestion::AdjustEyes,
                Suggestion::AdjustEars,
                Suggestion::AlignMouthAndChin,
            ]
        );
    }

    #[test]
    fn test_far_off_face_scores_low() {
        let c = comparator();
        let res = c
            .compare(&faced(&c, |p| Point::new(p.x + 0.3, p.y - 0.2)), 720, 1280)
            .unwrap();
        // x 20, y 0 -> 5 per part -> 15 * 4 / 3
        assert!((res.overall_score - 20.).abs() < 1e-4);
    }

    #[test]
    fn test_forehead_drift_gets_general_hint() {
        let c = comparator();
        let res = c
            .compare(
                &faced_with(&c, |lm, p| match lm {
                    FaceLandmark::Forehead => Point::new(p.x, p.y - 0.6),
                    _ => p,
                }),
                720,
                1280,
            )
            .unwrap();

        // forehead has no hint of its own, so only the mean delta trips
        assert!(res.deltas.mean() > c.config().position_threshold);
        assert_eq!(res.suggestions, vec![Suggestion::MatchOverallFace]);
    }

    #[test]
    fn test_small_drift_flags_features_not_center() {
        let c = comparator();
        let res = c
            .compare(&faced(&c, |p| Point::new(p.x + 0.11, p.y)), 720, 1280)
            .unwrap();
        // every delta is 0.11: above the position threshold, below critical
        assert!(!res.suggestions.contains(&Suggestion::AdjustFaceCenter));
        assert!(res.suggestions.contains(&Suggestion::AdjustEyes));
        assert!(res.balance.right);
    }

    #[test]
    fn test_overall_in_range() {
        let c = comparator();
        for dx in [-0.3f32, -0.1, 0., 0.07, 0.2] {
            for dy in [-0.12f32, -0.03, 0., 0.05, 0.3] {
                let res = c
                    .compare(&faced(&c, |p| Point::new(p.x + dx, p.y + dy)), 720, 1280)
                    .unwrap();
                assert!((0. ..=100.).contains(&res.overall_score));
            }
        }
    }

    #[test]
    fn test_partial_mesh_errors() {
        let c = comparator();
        let set = LandmarkSet::new(vec![Landmark::new(0.5, 0.5); 300]);
        assert!(matches!(
            c.compare(&set, 720, 1280),
            Err(Error::MissingLandmark { index: 454, .. })
        ));
    }
}
