use crate::shapes::point::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    Ko,
    En,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zoom {
    ZoomIn,
    ZoomOut,
    Perfect,
}

// Rounding left over from the sensor to display mapping.
const DISTANCE_EPSILON: f32 = 1e-5;

impl Zoom {
    /// Subject spread wider than the reference means the camera is too
    /// close.
    pub fn classify(current: f32, reference: f32, tolerance: f32) -> Zoom {
        let band = tolerance + DISTANCE_EPSILON;
        if current > reference + band {
            Zoom::ZoomOut
        } else if current < reference - band {
            Zoom::ZoomIn
        } else {
            Zoom::Perfect
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Zoom::ZoomIn => "Zoom In",
            Zoom::ZoomOut => "Zoom Out",
            Zoom::Perfect => "Perfect Zoom",
        }
    }
}

impl fmt::Display for Zoom {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Which way the subject's centre sits relative to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Balance {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl Balance {
    /// All coordinates in pixels.
    pub fn classify(current: &Point, target: &Point, threshold: f32) -> Balance {
        Balance {
            left: current.x < target.x - threshold,
            right: current.x > target.x + threshold,
            top: current.y < target.y - threshold,
            bottom: current.y > target.y + threshold,
        }
    }

    pub fn is_centered(&self) -> bool {
        !(self.left || self.right || self.top || self.bottom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Suggestion {
    AdjustFace,
    AlignShoulders,
    AdjustHips,
    FollowThirds,
    MatchOverallPose,
    AdjustFaceCenter,
    AdjustEyes,
    AdjustEars,
    AlignMouthAndChin,
    MatchOverallFace,
}

impl Suggestion {
    pub fn message(&self, locale: Locale) -> &'static str {
        match locale {
            Locale::Ko => match self {
                Suggestion::AdjustFace => "얼굴 위치를 참조 구도에 맞게 조정해주세요",
                Suggestion::AlignShoulders => "어깨 높이를 맞춰주세요",
                Suggestion::AdjustHips => "허리 위치를 조정해주세요",
                Suggestion::FollowThirds => "삼분할 구도에 맞게 위치를 조정해주세요",
                Suggestion::MatchOverallPose => {
                    "전체적인 자세와 구도를 참조 이미지와 비슷하게 맞춰주세요"
                }
                Suggestion::AdjustFaceCenter => "얼굴 중심을 조정해주세요",
                Suggestion::AdjustEyes => "눈 위치를 조정해주세요",
                Suggestion::AdjustEars => "귀 위치를 조정해주세요",
                Suggestion::AlignMouthAndChin => "입과 턱 위치를 맞춰주세요",
                Suggestion::MatchOverallFace => {
                    "전체적인 얼굴 위치를 참조 이미지와 비슷하게 맞춰주세요"
                }
            },
            Locale::En => match self {
                Suggestion::AdjustFace => "Move your face to match the reference framing",
                Suggestion::AlignShoulders => "Level your shoulders",
                Suggestion::AdjustHips => "Adjust your waist position",
                Suggestion::FollowThirds => "Line yourself up with the rule-of-thirds grid",
                Suggestion::MatchOverallPose => {
                    "Match your overall pose and framing to the reference"
                }
                Suggestion::AdjustFaceCenter => "Recenter your face",
                Suggestion::AdjustEyes => "Adjust your eye position",
                Suggestion::AdjustEars => "Adjust your ear position",
                Suggestion::AlignMouthAndChin => "Line up your mouth and chin",
                Suggestion::MatchOverallFace => {
                    "Match your overall face position to the reference"
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_band() {
        assert_eq!(Zoom::classify(0.25, 0.2, 0.01), Zoom::ZoomOut);
        assert_eq!(Zoom::classify(0.15, 0.2, 0.01), Zoom::ZoomIn);
        assert_eq!(Zoom::classify(0.205, 0.2, 0.01), Zoom::Perfect);
        // zero tolerance still allows an exact match
        assert_eq!(Zoom::classify(0.2, 0.2, 0.), Zoom::Perfect);
        assert_eq!(Zoom::classify(0.2001, 0.2, 0.), Zoom::ZoomOut);
        assert_eq!(Zoom::classify(0.1999, 0.2, 0.), Zoom::ZoomIn);
    }

    #[test]
    fn test_balance() {
        let target = Point::new(360., 640.);
        let b = Balance::classify(&Point::new(300., 700.), &target, 36.);
        assert!(b.left && b.bottom);
        assert!(!b.right && !b.top);

        let centered = Balance::classify(&Point::new(380., 620.), &target, 36.);
        assert!(centered.is_centered());
    }

    #[test]
    fn test_messages_are_localized() {
        assert_eq!(Suggestion::AlignShoulders.message(Locale::Ko), "어깨 높이를 맞춰주세요");
        assert_eq!(
            Suggestion::AlignShoulders.message(Locale::En),
            "Level your shoulders"
        );
    }
}
