use crate::facial::{DominantEmotion, EyeContact, FacialJudgment};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmotionCounts {
    pub happy: u64,
    pub serious: u64,
    pub neutral: u64,
}

impl EmotionCounts {
    fn add(&mut self, emotion: DominantEmotion) {
        match emotion {
            DominantEmotion::Happy => self.happy += 1,
            DominantEmotion::Serious => self.serious += 1,
            DominantEmotion::Neutral => self.neutral += 1,
        }
    }

    /// Majority label. Ties go to neutral, then serious, then happy.
    pub fn majority(&self) -> DominantEmotion {
        let ranked = [
            (DominantEmotion::Neutral, self.neutral),
            (DominantEmotion::Serious, self.serious),
            (DominantEmotion::Happy, self.happy),
        ];
        majority_of(&ranked).unwrap_or_default()
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EyeContactCounts {
    pub good: u64,
    pub poor: u64,
}

impl EyeContactCounts {
    fn add(&mut self, eye_contact: EyeContact) {
        match eye_contact {
            EyeContact::Good => self.good += 1,
            EyeContact::Poor => self.poor += 1,
            EyeContact::Unknown => {}
        }
    }

    /// Majority label, `Unknown` when nothing was counted. Ties go to poor.
    pub fn majority(&self) -> EyeContact {
        let ranked = [(EyeContact::Poor, self.poor), (EyeContact::Good, self.good)];
        majority_of(&ranked).unwrap_or(EyeContact::Unknown)
    }
}

/// First entry with the highest non-zero count.
fn majority_of<L: Copy>(ranked: &[(L, u64)]) -> Option<L> {
    let mut best: Option<(L, u64)> = None;
    for &(label, count) in ranked {
        if count == 0 {
            continue;
        }
        match best {
            Some((_, top)) if top >= count => {}
            _ => best = Some((label, count)),
        }
    }
    best.map(|(label, _)| label)
}

/// Running facial tally for one session. Frames without a face are counted in
/// `frames_total` only.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FacialSession {
    frames_total: u64,
    face_frames: u64,
    score_sum: u64,
    emotions: EmotionCounts,
    eye_contact: EyeContactCounts,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FacialSessionSummary {
    pub dominant_emotion: DominantEmotion,
    pub eye_contact: EyeContact,
    pub frames_analyzed: u64,
    pub face_detected_frames: u64,
    pub average_score: u32,
    pub emotion_counts: EmotionCounts,
    pub eye_contact_counts: EyeContactCounts,
}

impl FacialSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fold(mut self, judgment: &FacialJudgment) -> Self {
        self.record(judgment);
        self
    }

    pub fn record(&mut self, judgment: &FacialJudgment) {
        self.frames_total += 1;
        if !judgment.face_detected() {
            return;
        }
        self.face_frames += 1;
        self.score_sum += u64::from(judgment.overall_score);
        self.emotions.add(judgment.dominant_emotion);
        self.eye_contact.add(judgment.eye_contact);
    }

    pub fn frames_total(&self) -> u64 {
        self.frames_total
    }

    pub fn face_frames(&self) -> u64 {
        self.face_frames
    }

    pub fn dominant_emotion(&self) -> DominantEmotion {
        self.emotions.majority()
    }

    pub fn eye_contact(&self) -> EyeContact {
        self.eye_contact.majority()
    }

    pub fn average_score(&self) -> u32 {
        if self.face_frames == 0 {
            return 0;
        }
        (self.score_sum as f64 / self.face_frames as f64).round() as u32
    }

    pub fn summary(&self) -> FacialSessionSummary {
        FacialSessionSummary {
            dominant_emotion: self.dominant_emotion(),
            eye_contact: self.eye_contact(),
            frames_analyzed: self.frames_total,
            face_detected_frames: self.face_frames,
            average_score: self.average_score(),
            emotion_counts: self.emotions,
            eye_contact_counts: self.eye_contact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facial::analyzer::tests::{
        centered_face, face_with_eyes, serious_shapes, smiling_shapes,
    };
    use crate::facial::analyze_facial_frame;
    use crate::frame::LandmarkPoint;

    #[test]
    fn majority_labels_over_face_frames() {
        let happy = analyze_facial_frame(&centered_face(), &smiling_shapes());
        let looking_away = analyze_facial_frame(
            &face_with_eyes(LandmarkPoint::new(0.05, 0.45), LandmarkPoint::new(0.15, 0.45)),
            &serious_shapes(),
        );
        let no_face = FacialJudgment::no_face();

        let session = FacialSession::new()
            .fold(&happy)
            .fold(&happy)
            .fold(&looking_away)
            .fold(&no_face)
            .fold(&no_face)
            .fold(&no_face);

        let summary = session.summary();
        assert_eq!(summary.dominant_emotion, DominantEmotion::Happy);
        assert_eq!(summary.eye_contact, EyeContact::Good);
        assert_eq!(summary.frames_analyzed, 6);
        assert_eq!(summary.face_detected_frames, 3);
        assert_eq!(summary.emotion_counts.happy, 2);
        assert_eq!(summary.eye_contact_counts.poor, 1);
    }

    #[test]
    fn session_without_face_is_unknown() {
        let session = FacialSession::new().fold(&FacialJudgment::no_face());
        assert_eq!(session.dominant_emotion(), DominantEmotion::Neutral);
        assert_eq!(session.eye_contact(), EyeContact::Unknown);
        assert_eq!(session.average_score(), 0);
    }

    #[test]
    fn ties_resolve_deterministically() {
        let counts = EmotionCounts {
            happy: 2,
            serious: 2,
            neutral: 1,
        };
        assert_eq!(counts.majority(), DominantEmotion::Serious);
        let counts = EmotionCounts {
            happy: 3,
            serious: 3,
            neutral: 3,
        };
        assert_eq!(counts.majority(), DominantEmotion::Neutral);
        let eyes = EyeContactCounts { good: 4, poor: 4 };
        assert_eq!(eyes.majority(), EyeContact::Poor);
    }

    #[test]
    fn average_score_over_face_frames() {
        let full = analyze_facial_frame(&centered_face(), &smiling_shapes());
        let serious = analyze_facial_frame(&centered_face(), &serious_shapes());
        let session = FacialSession::new()
            .fold(&full)
            .fold(&serious)
            .fold(&FacialJudgment::no_face());
        assert_eq!(full.overall_score, 100);
        assert_eq!(serious.overall_score, 90);
        assert_eq!(session.average_score(), 95);
    }
}
