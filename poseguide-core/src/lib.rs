//! Framing guidance for a camera feed.
//!
//! Landmarks come from an external detector as normalized coordinates. The
//! comparators score them against bundled reference framings and
//! [`overlay::Overlay`] turns the results into drawing instructions.

pub mod config;
pub mod error;
pub mod face;
pub mod faces;
pub mod guidance;
pub mod landmarks;
pub mod overlay;
pub mod pose;
pub mod reference;
pub mod scoring;
pub mod shapes;

pub use config::ComparatorConfig;
pub use error::{Error, Result};
pub use face::{FaceComparator, FaceComparison};
pub use guidance::{Balance, Locale, Suggestion, Zoom};
pub use landmarks::{Landmark, LandmarkSet, Orientation};
pub use pose::{PoseComparator, PoseComparison};
pub use reference::{ReferenceFace, ReferencePoints};
