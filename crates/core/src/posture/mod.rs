pub(crate) mod analyzer;
mod session;

use serde::{Deserialize, Serialize};

pub use analyzer::{analyze_posture_frame, MetricRule, PostureAnalyzer, PostureThresholds};
pub use session::{PostureSession, PostureSessionSummary};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum PostureIssue {
    HeadTilt,
    UnevenShoulders,
    ForwardHead,
    MisalignedHips,
    InsufficientData,
}

impl PostureIssue {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostureIssue::HeadTilt => "head_tilt",
            PostureIssue::UnevenShoulders => "uneven_shoulders",
            PostureIssue::ForwardHead => "forward_head",
            PostureIssue::MisalignedHips => "misaligned_hips",
            PostureIssue::InsufficientData => "insufficient_data",
        }
    }
}

/// Per-frame posture verdict.
///
/// Serializes with `postureScore`/`postureIssues` mirroring `overallScore`/`issues`,
/// since downstream consumers read either name.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(into = "PostureJudgmentWire", from = "PostureJudgmentWire")]
pub struct PostureJudgment {
    pub feedback: Vec<String>,
    pub overall_score: u32,
    pub issues: Vec<PostureIssue>,
}

impl PostureJudgment {
    pub fn insufficient() -> Self {
        Self {
            feedback: vec![
                "Insufficient pose data - make sure your upper body is visible to the camera"
                    .to_owned(),
            ],
            overall_score: 0,
            issues: vec![PostureIssue::InsufficientData],
        }
    }

    pub fn has_signal(&self) -> bool {
        !self.issues.contains(&PostureIssue::InsufficientData)
    }

    /// A frame with landmarks and no posture issue at all.
    pub fn is_good(&self) -> bool {
        self.has_signal() && self.issues.is_empty()
    }

    pub fn posture_score(&self) -> u32 {
        self.overall_score
    }

    pub fn posture_issues(&self) -> &[PostureIssue] {
        &self.issues
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostureJudgmentWire {
    feedback: Vec<String>,
    overall_score: u32,
    issues: Vec<PostureIssue>,
    #[serde(default)]
    posture_score: Option<u32>,
    #[serde(default)]
    posture_issues: Option<Vec<PostureIssue>>,
}

impl From<PostureJudgment> for PostureJudgmentWire {
    fn from(j: PostureJudgment) -> Self {
        Self {
            posture_score: Some(j.overall_score),
            posture_issues: Some(j.issues.clone()),
            feedback: j.feedback,
            overall_score: j.overall_score,
            issues: j.issues,
        }
    }
}

impl From<PostureJudgmentWire> for PostureJudgment {
    fn from(w: PostureJudgmentWire) -> Self {
        Self {
            feedback: w.feedback,
            overall_score: w.overall_score,
            issues: w.issues,
        }
    }
}
