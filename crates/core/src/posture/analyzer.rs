use crate::frame::{pose_index, LandmarkPoint, PoseFrame};
use crate::posture::{PostureIssue, PostureJudgment};
use crate::util::clamp_score;
use serde::{Deserialize, Serialize};

const LOG_TARGET: &str = "posture";

/// A metric is flagged when its value is strictly above `threshold`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct MetricRule {
    pub threshold: f32,
    pub penalty: i32,
}

impl MetricRule {
    pub const fn new(threshold: f32, penalty: i32) -> Self {
        Self { threshold, penalty }
    }

    fn exceeded_by(&self, value: f32) -> bool {
        value > self.threshold
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct PostureThresholds {
    pub head_tilt: MetricRule,
    pub uneven_shoulders: MetricRule,
    pub forward_head: MetricRule,
    pub misaligned_hips: MetricRule,
}

impl Default for PostureThresholds {
    fn default() -> Self {
        Self {
            head_tilt: MetricRule::new(0.05, 15),
            uneven_shoulders: MetricRule::new(0.08, 12),
            forward_head: MetricRule::new(0.05, 10),
            misaligned_hips: MetricRule::new(0.10, 8),
        }
    }
}

struct PostureMetrics {
    head_tilt: f32,
    shoulder_diff: f32,
    forward_head: f32,
    hip_diff: f32,
}

impl PostureMetrics {
    fn measure(frame: &PoseFrame) -> Option<Self> {
        if !frame.is_complete() {
            return None;
        }
        let at = |i: usize| -> Option<LandmarkPoint> { frame.get(i).copied() };

        let nose = at(pose_index::NOSE)?;
        let left_ear = at(pose_index::LEFT_EAR)?;
        let right_ear = at(pose_index::RIGHT_EAR)?;
        let left_shoulder = at(pose_index::LEFT_SHOULDER)?;
        let right_shoulder = at(pose_index::RIGHT_SHOULDER)?;
        let left_hip = at(pose_index::LEFT_HIP)?;
        let right_hip = at(pose_index::RIGHT_HIP)?;

        let shoulder_mid_x = (left_shoulder.x + right_shoulder.x) / 2.0;

        Some(Self {
            head_tilt: (left_ear.y - right_ear.y).abs(),
            shoulder_diff: (left_shoulder.y - right_shoulder.y).abs(),
            forward_head: nose.x - shoulder_mid_x,
            hip_diff: (left_hip.y - right_hip.y).abs(),
        })
    }
}

struct Check {
    issue: PostureIssue,
    rule: MetricRule,
    value: f32,
    ok_line: &'static str,
    warn_line: &'static str,
}

#[derive(Clone, Debug, Default)]
pub struct PostureAnalyzer {
    thresholds: PostureThresholds,
}

impl PostureAnalyzer {
    pub fn new(thresholds: PostureThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &PostureThresholds {
        &self.thresholds
    }

    pub fn analyze(&self, frame: &PoseFrame) -> PostureJudgment {
        let Some(m) = PostureMetrics::measure(frame) else {
            tracing::debug!(target: LOG_TARGET, landmarks = frame.len(), "insufficient pose landmarks");
            return PostureJudgment::insufficient();
        };

        let t = &self.thresholds;
        let checks = [
            Check {
                issue: PostureIssue::HeadTilt,
                rule: t.head_tilt,
                value: m.head_tilt,
                ok_line: "✓ Head is level",
                warn_line: "⚠️ Head tilted - keep your head level and centered",
            },
            Check {
                issue: PostureIssue::UnevenShoulders,
                rule: t.uneven_shoulders,
                value: m.shoulder_diff,
                ok_line: "✓ Shoulders are even",
                warn_line: "⚠️ Uneven shoulders - relax and level your shoulders",
            },
            Check {
                issue: PostureIssue::ForwardHead,
                rule: t.forward_head,
                value: m.forward_head,
                ok_line: "✓ Head is aligned over your shoulders",
                warn_line: "⚠️ Head jutting forward - bring your chin back over your shoulders",
            },
            Check {
                issue: PostureIssue::MisalignedHips,
                rule: t.misaligned_hips,
                value: m.hip_diff,
                ok_line: "✓ Hips are aligned",
                warn_line: "⚠️ Hips misaligned - distribute your weight evenly",
            },
        ];

        let mut score: i32 = 100;
        let mut feedback = Vec::with_capacity(checks.len());
        let mut issues = Vec::new();

        for check in &checks {
            if check.rule.exceeded_by(check.value) {
                score -= check.rule.penalty;
                issues.push(check.issue);
                feedback.push(check.warn_line.to_owned());
            } else {
                feedback.push(check.ok_line.to_owned());
            }
        }

        let overall_score = clamp_score(score);
        tracing::debug!(
            target: LOG_TARGET,
            score = overall_score,
            issues = issues.len(),
            "posture frame analyzed"
        );

        PostureJudgment {
            feedback,
            overall_score,
            issues,
        }
    }
}

/// Posture judgment for one frame using the default thresholds.
pub fn analyze_posture_frame(landmarks: &[LandmarkPoint]) -> PostureJudgment {
    PostureAnalyzer::default().analyze(&PoseFrame::new(landmarks.to_vec()))
}
