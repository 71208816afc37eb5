mod rules;

use crate::facial::{DominantEmotion, EyeContact};
use crate::speech::SpeechMetrics;
use serde::{Deserialize, Serialize};

pub use rules::generate_feedback;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Nervous,
    Flat,
    Confident,
    #[default]
    #[serde(other)]
    Neutral,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    Introvert,
    #[default]
    Ambivert,
    Extrovert,
    /// Anything unrecognized; receives no personality tip.
    #[serde(other)]
    Unknown,
}

/// Speech metrics plus the session context the composer reads.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackInput {
    #[serde(flatten)]
    pub metrics: SpeechMetrics,
    /// Recording length in seconds.
    pub duration: f64,
    #[serde(default)]
    pub personality: Personality,
    /// Self-reported confidence on a 0-10 scale.
    pub confidence_score: f64,
    #[serde(default)]
    pub tone: Tone,
    #[serde(default)]
    pub dominant_emotion: DominantEmotion,
    #[serde(default)]
    pub eye_contact: EyeContact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posture_score: Option<u32>,
}

impl FeedbackInput {
    pub const DEFAULT_CONFIDENCE: f64 = 7.0;

    /// Context defaults used when no profile or visual analysis is available.
    pub fn new(metrics: SpeechMetrics, duration: f64) -> Self {
        Self {
            metrics,
            duration,
            personality: Personality::default(),
            confidence_score: Self::DEFAULT_CONFIDENCE,
            tone: Tone::default(),
            dominant_emotion: DominantEmotion::default(),
            eye_contact: EyeContact::default(),
            posture_score: None,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResult {
    pub feedback: Vec<String>,
    pub recommendations: Vec<String>,
    /// Floored at 0 only; no upper clamp is applied here.
    pub overall_score: u32,
}
