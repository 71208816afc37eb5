use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Minimum number of pose landmarks for a usable frame.
pub const POSE_LANDMARK_COUNT: usize = 33;
/// Minimum number of face mesh landmarks for a usable frame.
pub const FACE_LANDMARK_COUNT: usize = 468;

pub mod pose_index {
    pub const NOSE: usize = 0;
    pub const LEFT_EAR: usize = 7;
    pub const RIGHT_EAR: usize = 8;
    pub const LEFT_SHOULDER: usize = 11;
    pub const RIGHT_SHOULDER: usize = 12;
    pub const LEFT_HIP: usize = 23;
    pub const RIGHT_HIP: usize = 24;
}

pub mod face_index {
    /// Outer corner of the subject's right eye (image left).
    pub const LEFT_EYE: usize = 33;
    /// Outer corner of the subject's left eye (image right).
    pub const RIGHT_EYE: usize = 263;
}

/// Normalized image-space coordinate produced by the perception model.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
}

impl LandmarkPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: None }
    }

    pub fn with_z(mut self, z: f32) -> Self {
        self.z = Some(z);
        self
    }

    pub fn midpoint(&self, other: &LandmarkPoint) -> LandmarkPoint {
        let z = match (self.z, other.z) {
            (Some(a), Some(b)) => Some((a + b) / 2.0),
            (Some(a), None) | (None, Some(a)) => Some(a),
            (None, None) => None,
        };
        LandmarkPoint {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
            z,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct PoseFrame(pub Vec<LandmarkPoint>);

impl PoseFrame {
    pub fn new(landmarks: Vec<LandmarkPoint>) -> Self {
        Self(landmarks)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.0.len() >= POSE_LANDMARK_COUNT
    }

    pub fn get(&self, index: usize) -> Option<&LandmarkPoint> {
        self.0.get(index)
    }
}

impl From<Vec<LandmarkPoint>> for PoseFrame {
    fn from(value: Vec<LandmarkPoint>) -> Self {
        Self(value)
    }
}

/// Blendshape category name to intensity in [0, 1]. Missing categories read as 0.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Blendshapes(pub BTreeMap<String, f32>);

impl Blendshapes {
    pub fn score(&self, category: &str) -> f32 {
        self.0.get(category).copied().unwrap_or(0.0)
    }

    pub fn mean(&self, categories: &[&str]) -> f32 {
        if categories.is_empty() {
            return 0.0;
        }
        let sum: f32 = categories.iter().map(|c| self.score(c)).sum();
        sum / categories.len() as f32
    }

    pub fn with(mut self, category: &str, score: f32) -> Self {
        self.0.insert(category.to_owned(), score);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f32)> for Blendshapes {
    fn from_iter<I: IntoIterator<Item = (S, f32)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct FaceFrame {
    #[serde(default)]
    pub landmarks: Vec<LandmarkPoint>,
    #[serde(default)]
    pub blendshapes: Blendshapes,
}

impl FaceFrame {
    pub fn new(landmarks: Vec<LandmarkPoint>, blendshapes: Blendshapes) -> Self {
        Self {
            landmarks,
            blendshapes,
        }
    }

    pub fn has_face(&self) -> bool {
        self.landmarks.len() >= FACE_LANDMARK_COUNT
    }
}

/// One captured video frame as handed over by the perception boundary.
/// Either side may be absent when the model detected nothing.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct CaptureFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pose: Option<PoseFrame>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face: Option<FaceFrame>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_frame_parses_partial_json() {
        let frame: CaptureFrame = serde_json::from_str(
            r#"{"face":{"landmarks":[{"x":0.5,"y":0.4,"z":-0.02}],"blendshapes":{"mouthSmileLeft":0.6}}}"#,
        )
        .expect("valid frame");
        assert!(frame.pose.is_none());
        let face = frame.face.expect("face present");
        assert_eq!(face.landmarks[0].z, Some(-0.02));
        assert!((face.blendshapes.score("mouthSmileLeft") - 0.6).abs() < 1e-6);
        assert_eq!(face.blendshapes.score("mouthSmileRight"), 0.0);
        assert!(!face.has_face());
    }

    #[test]
    fn midpoint_keeps_available_depth() {
        let a = LandmarkPoint::new(0.2, 0.4).with_z(-0.2);
        let b = LandmarkPoint::new(0.6, 0.6);
        let m = a.midpoint(&b);
        assert!((m.x - 0.4).abs() < 1e-6);
        assert!((m.y - 0.5).abs() < 1e-6);
        assert_eq!(m.z, Some(-0.2));
    }

    #[test]
    fn blendshape_mean_treats_missing_as_zero() {
        let b = Blendshapes::default().with("cheekSquintLeft", 0.8);
        assert!((b.mean(&["cheekSquintLeft", "cheekSquintRight"]) - 0.4).abs() < 1e-6);
    }
}
