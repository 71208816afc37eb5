use crate::{
    config::{AnalysisSelection, CoachConfig, FrameInterval},
    facial::{FacialAnalyzer, FacialJudgment, FacialSession, FacialSessionSummary, FacialThresholds},
    frame::{CaptureFrame, PoseFrame},
    ingest::{FrameSource, IngestError},
    posture::{PostureAnalyzer, PostureJudgment, PostureSession, PostureSessionSummary, PostureThresholds},
    store::AnalysisKind,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

const LOG_TARGET: &str = "pipeline";

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("frame source failed: {0}")]
    Ingest(#[from] IngestError),
    #[error("frame source task aborted: {0}")]
    SourceTask(#[from] tokio::task::JoinError),
}

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub posture: PostureThresholds,
    pub facial: FacialThresholds,
    pub selection: AnalysisSelection,
    pub frame_interval: FrameInterval,
}

impl PipelineConfig {
    pub fn from_coach(config: &CoachConfig) -> Self {
        Self {
            posture: config.posture,
            facial: config.facial,
            selection: config.selection.clone(),
            frame_interval: config.frame_interval,
        }
    }
}

/// Per-frame judgments, delivered to an optional subscriber as they are made.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FrameEvent {
    pub index: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posture: Option<PostureJudgment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facial: Option<FacialJudgment>,
}

/// Session-level aggregates for the visual analyses that were selected.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VisualSummary {
    pub frames: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posture: Option<PostureSessionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotion: Option<FacialSessionSummary>,
}

pub struct SessionPipeline<S> {
    pub source: S,
    pub config: PipelineConfig,
    events: Option<mpsc::Sender<FrameEvent>>,
}

impl<S> SessionPipeline<S>
where
    S: FrameSource + 'static,
{
    pub fn new(source: S, config: PipelineConfig) -> Self {
        Self {
            source,
            config,
            events: None,
        }
    }

    pub fn with_events(mut self, tx: mpsc::Sender<FrameEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Drains the source, analysing frames strictly in arrival order.
    pub async fn run(self) -> Result<VisualSummary, PipelineError> {
        let capacity = self.channel_capacity();
        let (frame_tx, mut frame_rx) = mpsc::channel::<CaptureFrame>(capacity);

        let source_task = tokio::spawn(self.source.start(frame_tx));

        let run_posture = self.config.selection.includes(AnalysisKind::Posture);
        let run_facial = self.config.selection.includes(AnalysisKind::Emotion);
        let posture_analyzer = PostureAnalyzer::new(self.config.posture);
        let facial_analyzer = FacialAnalyzer::new(self.config.facial);

        let mut posture_session = PostureSession::new();
        let mut facial_session = FacialSession::new();
        let mut events = self.events;
        let mut index = 0u64;

        while let Some(frame) = frame_rx.recv().await {
            let posture = run_posture.then(|| {
                let judgment = match &frame.pose {
                    Some(pose) => posture_analyzer.analyze(pose),
                    None => posture_analyzer.analyze(&PoseFrame::default()),
                };
                posture_session.record(&judgment);
                judgment
            });
            let facial = run_facial.then(|| {
                let judgment = match &frame.face {
                    Some(face) => facial_analyzer.analyze(face),
                    None => FacialJudgment::no_face(),
                };
                facial_session.record(&judgment);
                judgment
            });

            if let Some(tx) = &events {
                let event = FrameEvent {
                    index,
                    posture,
                    facial,
                };
                if tx.send(event).await.is_err() {
                    tracing::debug!(target: LOG_TARGET, index, "event subscriber dropped");
                    events = None;
                }
            }
            index += 1;
        }

        source_task.await??;

        tracing::info!(
            target: LOG_TARGET,
            frames = index,
            posture = run_posture,
            facial = run_facial,
            "visual analysis finished"
        );

        Ok(VisualSummary {
            frames: index,
            posture: run_posture.then(|| posture_session.summary()),
            emotion: run_facial.then(|| facial_session.summary()),
        })
    }

    /// Room for about one second of frames at the configured rate.
    pub fn channel_capacity(&self) -> usize {
        let per_second = 1000 / self.config.frame_interval.millis.max(1);
        usize::try_from(per_second.clamp(2, 32)).unwrap_or(8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_selection;
    use crate::facial::analyzer::tests::{centered_face, smiling_shapes};
    use crate::facial::{DominantEmotion, EyeContact};
    use crate::frame::{pose_index, FaceFrame, LandmarkPoint};
    use crate::ingest::VecFrameSource;
    use crate::posture::analyzer::tests::neutral_pose;

    fn good_frame() -> CaptureFrame {
        CaptureFrame {
            pose: Some(PoseFrame::new(neutral_pose())),
            face: Some(FaceFrame::new(centered_face(), smiling_shapes())),
        }
    }

    fn slouched_frame() -> CaptureFrame {
        let mut pose = neutral_pose();
        pose[pose_index::LEFT_SHOULDER].y = 0.3;
        CaptureFrame {
            pose: Some(PoseFrame::new(pose)),
            face: None,
        }
    }

    fn config(selection: &str) -> PipelineConfig {
        let mut config = PipelineConfig::from_coach(&CoachConfig::default());
        config.selection = parse_selection(selection).expect("valid selection");
        config
    }

    #[tokio::test]
    async fn aggregates_in_order() {
        let mut frames = vec![good_frame(); 7];
        frames.extend(vec![slouched_frame(); 3]);
        frames.push(CaptureFrame::default());

        let (tx, mut rx) = mpsc::channel(64);
        let summary = SessionPipeline::new(VecFrameSource::new(frames), config("posture,emotion"))
            .with_events(tx)
            .run()
            .await
            .expect("pipeline runs");

        assert_eq!(summary.frames, 11);
        let posture = summary.posture.expect("posture selected");
        assert_eq!(posture.posture_score, 70);
        assert_eq!(posture.frames_with_landmarks, 10);
        let emotion = summary.emotion.expect("emotion selected");
        assert_eq!(emotion.face_detected_frames, 7);
        assert_eq!(emotion.dominant_emotion, DominantEmotion::Happy);
        assert_eq!(emotion.eye_contact, EyeContact::Good);

        let mut indices = Vec::new();
        while let Some(event) = rx.recv().await {
            indices.push(event.index);
        }
        assert_eq!(indices, (0..11).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn unselected_analyses_are_skipped() {
        let (tx, mut rx) = mpsc::channel(8);
        let summary = SessionPipeline::new(VecFrameSource::new(vec![good_frame()]), config("posture"))
            .with_events(tx)
            .run()
            .await
            .expect("pipeline runs");
        assert!(summary.emotion.is_none());
        let event = rx.recv().await.expect("one event");
        assert!(event.posture.is_some());
        assert!(event.facial.is_none());
    }

    #[tokio::test]
    async fn dropped_subscriber_does_not_stop_analysis() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let summary = SessionPipeline::new(VecFrameSource::new(vec![good_frame(); 5]), config("posture"))
            .with_events(tx)
            .run()
            .await
            .expect("pipeline runs");
        assert_eq!(summary.frames, 5);
        assert_eq!(summary.posture.map(|p| p.good_frames), Some(5));
    }

    #[test]
    fn capacity_tracks_frame_rate() {
        let pipeline = SessionPipeline::new(VecFrameSource::default(), config("posture"));
        assert_eq!(pipeline.channel_capacity(), 10);
        let mut fast = config("posture");
        fast.frame_interval = FrameInterval::new(5).expect("non-zero");
        assert_eq!(SessionPipeline::new(VecFrameSource::default(), fast).channel_capacity(), 32);
    }

    #[tokio::test]
    async fn midpoint_of_shoulders_is_used_for_forward_head() {
        let mut pose = neutral_pose();
        pose[pose_index::LEFT_SHOULDER] = LandmarkPoint::new(0.2, 0.0);
        pose[pose_index::RIGHT_SHOULDER] = LandmarkPoint::new(-0.2, 0.0);
        let frame = CaptureFrame {
            pose: Some(PoseFrame::new(pose)),
            face: None,
        };
        let summary = SessionPipeline::new(VecFrameSource::new(vec![frame]), config("posture"))
            .run()
            .await
            .expect("pipeline runs");
        assert_eq!(summary.posture.map(|p| p.posture_score), Some(100));
    }
}
