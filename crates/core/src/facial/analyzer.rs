use crate::facial::{ExpressionFlags, FacialIssue, FacialJudgment};
use crate::frame::{face_index, Blendshapes, FaceFrame, LandmarkPoint};
use crate::util::clamp_score;
use serde::{Deserialize, Serialize};

const LOG_TARGET: &str = "facial";

const SMILE: &[&str] = &["mouthSmileLeft", "mouthSmileRight"];
const CHEEK_RAISE: &[&str] = &["cheekSquintLeft", "cheekSquintRight"];
const MOUTH_OPEN: &str = "jawOpen";
const JAW_FORWARD: &str = "jawForward";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct FacialThresholds {
    /// Horizontal band of the eye midpoint considered centered.
    pub center_min_x: f32,
    pub center_max_x: f32,
    pub side_gaze_penalty: i32,
    pub look_up_y: f32,
    pub look_down_y: f32,
    pub vertical_gaze_penalty: i32,
    pub head_tilt: f32,
    pub head_tilt_penalty: i32,
    /// Depth below which the face is too close to the camera.
    pub too_close_z: f32,
    pub too_close_penalty: i32,
    pub strong_smile: f32,
    pub strong_smile_bonus: i32,
    pub light_smile: f32,
    pub light_smile_bonus: i32,
    pub weak_smile: f32,
    pub weak_smile_penalty: i32,
    pub no_smile_penalty: i32,
    pub mouth_wide_open: f32,
    pub mouth_speaking: f32,
    pub mouth_closed: f32,
    pub mouth_closed_penalty: i32,
    pub cheek_raise: f32,
    pub genuine_smile_bonus: i32,
    pub jaw_forward: f32,
    pub jaw_forward_penalty: i32,
}

impl Default for FacialThresholds {
    fn default() -> Self {
        Self {
            center_min_x: 0.35,
            center_max_x: 0.65,
            side_gaze_penalty: 12,
            look_up_y: 0.3,
            look_down_y: 0.6,
            vertical_gaze_penalty: 10,
            head_tilt: 0.04,
            head_tilt_penalty: 8,
            too_close_z: -0.1,
            too_close_penalty: 5,
            strong_smile: 0.7,
            strong_smile_bonus: 8,
            light_smile: 0.4,
            light_smile_bonus: 3,
            weak_smile: 0.1,
            weak_smile_penalty: 5,
            no_smile_penalty: 10,
            mouth_wide_open: 0.5,
            mouth_speaking: 0.2,
            mouth_closed: 0.05,
            mouth_closed_penalty: 5,
            cheek_raise: 0.3,
            genuine_smile_bonus: 5,
            jaw_forward: 0.4,
            jaw_forward_penalty: 5,
        }
    }
}

/// Accumulates one frame's score, issues and feedback lines.
struct Scorecard {
    score: i32,
    feedback: Vec<String>,
    issues: Vec<FacialIssue>,
    flags: ExpressionFlags,
}

impl Scorecard {
    fn new() -> Self {
        Self {
            score: 100,
            feedback: Vec::new(),
            issues: Vec::new(),
            flags: ExpressionFlags::default(),
        }
    }

    fn note(&mut self, line: &str) {
        self.feedback.push(line.to_owned());
    }

    fn adjust(&mut self, delta: i32, line: &str) {
        self.score += delta;
        self.note(line);
    }

    fn flag(&mut self, issue: FacialIssue, penalty: i32, line: &str) {
        self.issues.push(issue);
        self.adjust(-penalty, line);
    }

    fn finish(self) -> FacialJudgment {
        FacialJudgment::from_scoring(self.feedback, clamp_score(self.score), self.issues, self.flags)
    }
}

#[derive(Clone, Debug, Default)]
pub struct FacialAnalyzer {
    thresholds: FacialThresholds,
}

impl FacialAnalyzer {
    pub fn new(thresholds: FacialThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &FacialThresholds {
        &self.thresholds
    }

    pub fn analyze(&self, face: &FaceFrame) -> FacialJudgment {
        let eyes = face
            .landmarks
            .get(face_index::LEFT_EYE)
            .zip(face.landmarks.get(face_index::RIGHT_EYE));
        let (left_eye, right_eye) = match eyes {
            Some(pair) if face.has_face() => pair,
            _ => {
                tracing::debug!(target: LOG_TARGET, landmarks = face.landmarks.len(), "no face detected");
                return FacialJudgment::no_face();
            }
        };

        let mut card = Scorecard::new();
        self.score_gaze(&mut card, left_eye, right_eye);
        self.score_expression(&mut card, &face.blendshapes);

        let judgment = card.finish();
        tracing::debug!(
            target: LOG_TARGET,
            score = judgment.overall_score,
            emotion = judgment.dominant_emotion.as_str(),
            eye_contact = judgment.eye_contact.as_str(),
            "facial frame analyzed"
        );
        judgment
    }

    fn score_gaze(&self, card: &mut Scorecard, left_eye: &LandmarkPoint, right_eye: &LandmarkPoint) {
        let t = &self.thresholds;
        let mid = left_eye.midpoint(right_eye);

        let centered_x = mid.x >= t.center_min_x && mid.x <= t.center_max_x;
        if !centered_x {
            card.flag(
                FacialIssue::PoorEyeContact,
                t.side_gaze_penalty,
                "⚠️ Looking to the side - bring your gaze back to the camera",
            );
        }

        let centered_y = if mid.y < t.look_up_y {
            card.flag(
                FacialIssue::EyesUp,
                t.vertical_gaze_penalty,
                "⚠️ Looking up - lower your gaze to the camera",
            );
            false
        } else if mid.y > t.look_down_y {
            card.flag(
                FacialIssue::EyesDown,
                t.vertical_gaze_penalty,
                "⚠️ Looking down - lift your gaze to the camera",
            );
            false
        } else {
            true
        };

        if centered_x && centered_y {
            card.note("✓ Good eye contact");
        }

        if (left_eye.y - right_eye.y).abs() > t.head_tilt {
            card.flag(
                FacialIssue::HeadTilt,
                t.head_tilt_penalty,
                "⚠️ Head tilted - keep your head level",
            );
        } else {
            card.note("✓ Head is level");
        }

        if mid.z.is_some_and(|z| z < t.too_close_z) {
            card.flag(
                FacialIssue::TooClose,
                t.too_close_penalty,
                "⚠️ Too close to the camera - lean back slightly",
            );
        }
    }

    fn score_expression(&self, card: &mut Scorecard, shapes: &Blendshapes) {
        let t = &self.thresholds;
        let smile = shapes.mean(SMILE);

        if smile > t.strong_smile {
            card.flags.strong_smile = true;
            card.adjust(t.strong_smile_bonus, "😊 Great smile! Your warmth really comes through");
        } else if smile > t.light_smile {
            card.adjust(t.light_smile_bonus, "🙂 Light smile - friendly and approachable");
        } else if smile > t.weak_smile {
            card.flag(
                FacialIssue::WeakSmile,
                t.weak_smile_penalty,
                "⚠️ Weak smile - a little more warmth would help",
            );
        } else {
            card.flag(
                FacialIssue::NoSmile,
                t.no_smile_penalty,
                "⚠️ No smile detected - try a relaxed, natural smile",
            );
        }

        let mouth_open = shapes.score(MOUTH_OPEN);
        if mouth_open > t.mouth_wide_open {
            card.note("🗣️ Very expressive mouth movement");
        } else if mouth_open > t.mouth_speaking {
            card.note("✓ Speaking with natural mouth movement");
        } else if mouth_open >= t.mouth_closed {
            card.note("ℹ️ Mouth slightly open");
        } else {
            card.flag(
                FacialIssue::MouthClosed,
                t.mouth_closed_penalty,
                "⚠️ Mouth closed - open up as you speak",
            );
        }

        if shapes.mean(CHEEK_RAISE) > t.cheek_raise && smile > t.light_smile {
            card.flags.genuine_smile = true;
            card.adjust(t.genuine_smile_bonus, "✨ Genuine smile - your eyes are smiling too");
        }

        if shapes.score(JAW_FORWARD) > t.jaw_forward {
            card.flag(
                FacialIssue::JawForward,
                t.jaw_forward_penalty,
                "⚠️ Jaw pushed forward - relax your jaw",
            );
        }
    }
}

/// Facial judgment for one frame using the default thresholds.
pub fn analyze_facial_frame(landmarks: &[LandmarkPoint], blendshapes: &Blendshapes) -> FacialJudgment {
    FacialAnalyzer::default().analyze(&FaceFrame::new(landmarks.to_vec(), blendshapes.clone()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::facial::{DominantEmotion, EyeContact};
    use crate::frame::FACE_LANDMARK_COUNT;

    /// A face looking straight at the camera with level eyes.
    pub(crate) fn centered_face() -> Vec<LandmarkPoint> {
        let mut landmarks = vec![LandmarkPoint::new(0.5, 0.45); FACE_LANDMARK_COUNT];
        landmarks[face_index::LEFT_EYE] = LandmarkPoint::new(0.45, 0.45).with_z(-0.02);
        landmarks[face_index::RIGHT_EYE] = LandmarkPoint::new(0.55, 0.45).with_z(-0.02);
        landmarks
    }

    pub(crate) fn face_with_eyes(left: LandmarkPoint, right: LandmarkPoint) -> Vec<LandmarkPoint> {
        let mut landmarks = centered_face();
        landmarks[face_index::LEFT_EYE] = left;
        landmarks[face_index::RIGHT_EYE] = right;
        landmarks
    }

    /// Light smile while speaking: no score change from expression.
    pub(crate) fn neutral_shapes() -> Blendshapes {
        Blendshapes::default()
            .with("mouthSmileLeft", 0.5)
            .with("mouthSmileRight", 0.5)
            .with("jawOpen", 0.3)
    }

    pub(crate) fn smiling_shapes() -> Blendshapes {
        Blendshapes::default()
            .with("mouthSmileLeft", 0.9)
            .with("mouthSmileRight", 0.8)
            .with("jawOpen", 0.3)
    }

    pub(crate) fn serious_shapes() -> Blendshapes {
        Blendshapes::default().with("jawOpen", 0.3)
    }

    #[test]
    fn missing_face_is_explicit() {
        for landmarks in [vec![], vec![LandmarkPoint::new(0.5, 0.5); 100]] {
            let j = analyze_facial_frame(&landmarks, &smiling_shapes());
            assert_eq!(j, FacialJudgment::no_face());
            assert!(!j.face_detected());
        }
    }

    #[test]
    fn centered_light_smile_keeps_bonus_then_clamps() {
        let j = analyze_facial_frame(&centered_face(), &neutral_shapes());
        assert!(j.issues.is_empty(), "{:?}", j.issues);
        assert_eq!(j.overall_score, 100);
        assert_eq!(j.eye_contact, EyeContact::Good);
        assert_eq!(j.dominant_emotion, DominantEmotion::Neutral);
        assert!(j.feedback.iter().any(|l| l == "✓ Good eye contact"));
    }

    #[test]
    fn side_gaze_is_poor_eye_contact() {
        let j = analyze_facial_frame(
            &face_with_eyes(LandmarkPoint::new(0.75, 0.45), LandmarkPoint::new(0.85, 0.45)),
            &neutral_shapes(),
        );
        assert_eq!(j.issues, vec![FacialIssue::PoorEyeContact]);
        // 100 - 12 + 3
        assert_eq!(j.overall_score, 91);
        assert_eq!(j.eye_contact, EyeContact::Poor);
        assert!(!j.feedback.iter().any(|l| l == "✓ Good eye contact"));
    }

    #[test]
    fn vertical_gaze_zones() {
        let up = analyze_facial_frame(
            &face_with_eyes(LandmarkPoint::new(0.45, 0.2), LandmarkPoint::new(0.55, 0.2)),
            &neutral_shapes(),
        );
        assert_eq!(up.issues, vec![FacialIssue::EyesUp]);
        assert_eq!(up.overall_score, 93);

        let down = analyze_facial_frame(
            &face_with_eyes(LandmarkPoint::new(0.45, 0.7), LandmarkPoint::new(0.55, 0.7)),
            &neutral_shapes(),
        );
        assert_eq!(down.issues, vec![FacialIssue::EyesDown]);
        assert_eq!(down.eye_contact, EyeContact::Poor);
    }

    #[test]
    fn tilt_and_proximity() {
        let j = analyze_facial_frame(
            &face_with_eyes(
                LandmarkPoint::new(0.45, 0.40).with_z(-0.2),
                LandmarkPoint::new(0.55, 0.50).with_z(-0.2),
            ),
            &neutral_shapes(),
        );
        assert_eq!(j.issues, vec![FacialIssue::HeadTilt, FacialIssue::TooClose]);
        // 100 - 8 - 5 + 3
        assert_eq!(j.overall_score, 90);
        assert_eq!(j.eye_contact, EyeContact::Good);
    }

    #[test]
    fn smile_bands() {
        let strong = analyze_facial_frame(&centered_face(), &smiling_shapes());
        assert_eq!(strong.dominant_emotion, DominantEmotion::Happy);
        assert_eq!(strong.overall_score, 100);

        let weak = analyze_facial_frame(
            &centered_face(),
            &serious_shapes().with("mouthSmileLeft", 0.2).with("mouthSmileRight", 0.2),
        );
        assert_eq!(weak.issues, vec![FacialIssue::WeakSmile]);
        assert_eq!(weak.overall_score, 95);
        assert_eq!(weak.dominant_emotion, DominantEmotion::Serious);

        let none = analyze_facial_frame(&centered_face(), &serious_shapes());
        assert_eq!(none.issues, vec![FacialIssue::NoSmile]);
        assert_eq!(none.overall_score, 90);
        assert_eq!(none.dominant_emotion, DominantEmotion::Serious);
    }

    #[test]
    fn genuine_smile_marks_happy() {
        let shapes = neutral_shapes()
            .with("cheekSquintLeft", 0.6)
            .with("cheekSquintRight", 0.6);
        let j = analyze_facial_frame(&centered_face(), &shapes);
        assert_eq!(j.dominant_emotion, DominantEmotion::Happy);
        assert!(j.feedback.iter().any(|l| l.contains("Genuine smile")));
    }

    #[test]
    fn empty_blendshapes_penalize_expression() {
        let j = analyze_facial_frame(&centered_face(), &Blendshapes::default());
        assert_eq!(j.issues, vec![FacialIssue::NoSmile, FacialIssue::MouthClosed]);
        assert_eq!(j.overall_score, 85);
    }

    #[test]
    fn jaw_forward_penalized() {
        let j = analyze_facial_frame(&centered_face(), &neutral_shapes().with("jawForward", 0.6));
        assert_eq!(j.issues, vec![FacialIssue::JawForward]);
        assert_eq!(j.overall_score, 98);
    }

    #[test]
    fn score_always_within_bounds() {
        let worst = face_with_eyes(
            LandmarkPoint::new(0.0, 0.9).with_z(-0.5),
            LandmarkPoint::new(0.1, 1.0).with_z(-0.5),
        );
        let shapes = Blendshapes::default().with("jawForward", 1.0);
        let harsh = FacialThresholds {
            side_gaze_penalty: 80,
            vertical_gaze_penalty: 80,
            ..FacialThresholds::default()
        };
        let j = FacialAnalyzer::new(harsh).analyze(&FaceFrame::new(worst, shapes));
        assert_eq!(j.overall_score, 0);

        let best = smiling_shapes()
            .with("cheekSquintLeft", 1.0)
            .with("cheekSquintRight", 1.0);
        let j = analyze_facial_frame(&centered_face(), &best);
        assert_eq!(j.overall_score, 100);
    }

    #[test]
    fn eye_contact_label_matches_gaze_issues() {
        let cases = [
            centered_face(),
            face_with_eyes(LandmarkPoint::new(0.1, 0.45), LandmarkPoint::new(0.2, 0.45)),
            face_with_eyes(LandmarkPoint::new(0.45, 0.1), LandmarkPoint::new(0.55, 0.1)),
            face_with_eyes(LandmarkPoint::new(0.45, 0.9), LandmarkPoint::new(0.55, 0.9)),
            face_with_eyes(LandmarkPoint::new(0.9, 0.9), LandmarkPoint::new(0.95, 0.95)),
        ];
        for landmarks in cases {
            let j = analyze_facial_frame(&landmarks, &serious_shapes());
            let gaze_issue = j.issues.iter().any(FacialIssue::is_gaze);
            assert_eq!(j.eye_contact == EyeContact::Poor, gaze_issue);
        }
    }
}
