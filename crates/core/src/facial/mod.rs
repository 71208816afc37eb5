pub(crate) mod analyzer;
mod session;

use serde::{Deserialize, Serialize};

pub use analyzer::{analyze_facial_frame, FacialAnalyzer, FacialThresholds};
pub use session::{EmotionCounts, EyeContactCounts, FacialSession, FacialSessionSummary};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FacialIssue {
    PoorEyeContact,
    EyesUp,
    EyesDown,
    HeadTilt,
    TooClose,
    WeakSmile,
    NoSmile,
    MouthClosed,
    JawForward,
    NoFaceDetected,
}

impl FacialIssue {
    pub fn is_gaze(&self) -> bool {
        matches!(
            self,
            FacialIssue::PoorEyeContact | FacialIssue::EyesUp | FacialIssue::EyesDown
        )
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DominantEmotion {
    Happy,
    Serious,
    #[default]
    Neutral,
}

impl DominantEmotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            DominantEmotion::Happy => "happy",
            DominantEmotion::Serious => "serious",
            DominantEmotion::Neutral => "neutral",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EyeContact {
    #[default]
    Good,
    Poor,
    /// No face was available to judge.
    Unknown,
}

impl EyeContact {
    pub fn as_str(&self) -> &'static str {
        match self {
            EyeContact::Good => "good",
            EyeContact::Poor => "poor",
            EyeContact::Unknown => "unknown",
        }
    }
}

/// Positive expression signals raised by the scoring step. Labels are derived
/// from these and the issue set, never from feedback text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExpressionFlags {
    pub strong_smile: bool,
    pub genuine_smile: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FacialJudgment {
    pub feedback: Vec<String>,
    pub overall_score: u32,
    pub issues: Vec<FacialIssue>,
    pub dominant_emotion: DominantEmotion,
    pub eye_contact: EyeContact,
}

impl FacialJudgment {
    pub fn no_face() -> Self {
        Self {
            feedback: vec!["No face detected - position yourself in front of the camera".to_owned()],
            overall_score: 0,
            issues: vec![FacialIssue::NoFaceDetected],
            dominant_emotion: DominantEmotion::Neutral,
            eye_contact: EyeContact::Unknown,
        }
    }

    pub fn from_scoring(
        feedback: Vec<String>,
        overall_score: u32,
        issues: Vec<FacialIssue>,
        flags: ExpressionFlags,
    ) -> Self {
        let dominant_emotion = derive_emotion(&issues, flags);
        let eye_contact = derive_eye_contact(&issues);
        Self {
            feedback,
            overall_score,
            issues,
            dominant_emotion,
            eye_contact,
        }
    }

    pub fn face_detected(&self) -> bool {
        !self.issues.contains(&FacialIssue::NoFaceDetected)
    }
}

fn derive_emotion(issues: &[FacialIssue], flags: ExpressionFlags) -> DominantEmotion {
    if flags.strong_smile || flags.genuine_smile {
        DominantEmotion::Happy
    } else if issues
        .iter()
        .any(|i| matches!(i, FacialIssue::WeakSmile | FacialIssue::NoSmile))
    {
        DominantEmotion::Serious
    } else {
        DominantEmotion::Neutral
    }
}

fn derive_eye_contact(issues: &[FacialIssue]) -> EyeContact {
    if issues.contains(&FacialIssue::NoFaceDetected) {
        EyeContact::Unknown
    } else if issues.iter().any(FacialIssue::is_gaze) {
        EyeContact::Poor
    } else {
        EyeContact::Good
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_follow_flags_and_issues() {
        let j = FacialJudgment::from_scoring(
            vec![],
            90,
            vec![FacialIssue::EyesDown, FacialIssue::NoSmile],
            ExpressionFlags::default(),
        );
        assert_eq!(j.eye_contact, EyeContact::Poor);
        assert_eq!(j.dominant_emotion, DominantEmotion::Serious);

        let j = FacialJudgment::from_scoring(
            vec![],
            100,
            vec![FacialIssue::HeadTilt],
            ExpressionFlags {
                strong_smile: false,
                genuine_smile: true,
            },
        );
        assert_eq!(j.eye_contact, EyeContact::Good);
        assert_eq!(j.dominant_emotion, DominantEmotion::Happy);
    }

    #[test]
    fn no_face_wire_shape() {
        let v = serde_json::to_value(FacialJudgment::no_face()).expect("serializable");
        assert_eq!(v["overallScore"], 0);
        assert_eq!(v["issues"], serde_json::json!(["no_face_detected"]));
        assert_eq!(v["dominantEmotion"], "neutral");
        assert_eq!(v["eyeContact"], "unknown");
    }
}
