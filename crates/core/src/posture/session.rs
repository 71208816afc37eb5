use crate::posture::{PostureIssue, PostureJudgment};
use serde::{Deserialize, Serialize};

/// Running posture tally for one session. Owned by a single session loop.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PostureSession {
    frames_total: u64,
    frames_with_signal: u64,
    good_frames: u64,
    issues_seen: Vec<PostureIssue>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PostureSessionSummary {
    pub posture_score: u32,
    pub posture_issues: Vec<PostureIssue>,
    pub frames_analyzed: u64,
    pub frames_with_landmarks: u64,
    pub good_frames: u64,
}

impl PostureSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fold(mut self, judgment: &PostureJudgment) -> Self {
        self.record(judgment);
        self
    }

    pub fn record(&mut self, judgment: &PostureJudgment) {
        self.frames_total += 1;
        if !judgment.has_signal() {
            return;
        }
        self.frames_with_signal += 1;
        if judgment.is_good() {
            self.good_frames += 1;
        }
        for issue in &judgment.issues {
            if !self.issues_seen.contains(issue) {
                self.issues_seen.push(*issue);
            }
        }
    }

    pub fn frames_total(&self) -> u64 {
        self.frames_total
    }

    pub fn frames_with_signal(&self) -> u64 {
        self.frames_with_signal
    }

    pub fn good_frames(&self) -> u64 {
        self.good_frames
    }

    /// Percentage of frames with landmarks that had no issue; 0 when no frame had landmarks.
    pub fn score(&self) -> u32 {
        if self.frames_with_signal == 0 {
            return 0;
        }
        let pct = 100.0 * self.good_frames as f64 / self.frames_with_signal as f64;
        pct.round() as u32
    }

    pub fn summary(&self) -> PostureSessionSummary {
        PostureSessionSummary {
            posture_score: self.score(),
            posture_issues: self.issues_seen.clone(),
            frames_analyzed: self.frames_total,
            frames_with_landmarks: self.frames_with_signal,
            good_frames: self.good_frames,
        }
    }
}
