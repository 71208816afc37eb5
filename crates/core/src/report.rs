use crate::{
    config::{AnalysisSelection, CoachConfig, DEFAULT_USER_ID},
    facial::FacialSessionSummary,
    feedback::{generate_feedback, FeedbackInput, FeedbackResult, Personality, Tone},
    narrative::{Narrative, NarrativeClient, NarrativeKind, NarrativeRequest},
    pipeline::VisualSummary,
    posture::PostureSessionSummary,
    speech::{validate_speech_input, SpeechAnalyzer, SpeechMetrics},
    store::{AnalysisKind, AnalysisRecord, ResultStore, StoreError},
};
use serde::{Deserialize, Serialize};

const LOG_TARGET: &str = "report";

/// Who is practicing and how they described themselves.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub user_id: String,
    pub personality: Personality,
    pub confidence_score: f64,
    pub tone: Tone,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_title: Option<String>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            user_id: DEFAULT_USER_ID.to_owned(),
            personality: Personality::default(),
            confidence_score: FeedbackInput::DEFAULT_CONFIDENCE,
            tone: Tone::default(),
            scenario_id: None,
            scenario_title: None,
        }
    }
}

/// Final transcript and recording length from the speech-to-text boundary.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpeechSample {
    pub transcript: String,
    pub duration_secs: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpeechReport {
    #[serde(flatten)]
    pub metrics: SpeechMetrics,
    pub duration: f64,
    /// Why the metrics are zero, when the input was unusable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    #[serde(flatten)]
    pub feedback: FeedbackResult,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub frames: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speech: Option<SpeechReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<FacialSessionSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posture: Option<PostureSessionSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub narratives: Vec<Narrative>,
}

impl SessionReport {
    /// Combines the speech sample with the visual session aggregates and runs
    /// the feedback composer. Only analyses in the config's selection appear.
    pub fn compose(
        config: &CoachConfig,
        ctx: &SessionContext,
        speech: Option<&SpeechSample>,
        visual: VisualSummary,
    ) -> Self {
        let selection = &config.selection;
        let emotion = visual.emotion.filter(|_| selection.includes(AnalysisKind::Emotion));
        let posture = visual.posture.filter(|_| selection.includes(AnalysisKind::Posture));

        let speech = speech
            .filter(|_| selection.includes(AnalysisKind::Speech))
            .map(|sample| {
                let analyzer = SpeechAnalyzer::new(config.fillers.clone());
                let metrics = analyzer.analyze(&sample.transcript, sample.duration_secs);
                let notice = validate_speech_input(&sample.transcript, sample.duration_secs)
                    .err()
                    .map(|e| e.to_string());

                let mut input = FeedbackInput::new(metrics.clone(), sample.duration_secs);
                input.personality = ctx.personality;
                input.confidence_score = ctx.confidence_score;
                input.tone = ctx.tone;
                if let Some(e) = &emotion {
                    input.dominant_emotion = e.dominant_emotion;
                    input.eye_contact = e.eye_contact;
                }
                input.posture_score = posture.as_ref().map(|p| p.posture_score);

                SpeechReport {
                    metrics,
                    duration: sample.duration_secs,
                    notice,
                    feedback: generate_feedback(&input),
                }
            });

        tracing::info!(
            target: LOG_TARGET,
            frames = visual.frames,
            speech = speech.is_some(),
            emotion = emotion.is_some(),
            posture = posture.is_some(),
            "session report composed"
        );

        Self {
            frames: visual.frames,
            speech,
            emotion,
            posture,
            narratives: Vec::new(),
        }
    }

    /// One record per analysis present in the report.
    pub fn records(&self, ctx: &SessionContext) -> Result<Vec<AnalysisRecord>, StoreError> {
        let mut records = Vec::with_capacity(3);
        if let Some(speech) = &self.speech {
            records.push(AnalysisRecord::new(&ctx.user_id, AnalysisKind::Speech, speech)?);
        }
        if let Some(emotion) = &self.emotion {
            records.push(AnalysisRecord::new(&ctx.user_id, AnalysisKind::Emotion, emotion)?);
        }
        if let Some(posture) = &self.posture {
            records.push(AnalysisRecord::new(&ctx.user_id, AnalysisKind::Posture, posture)?);
        }
        Ok(records
            .into_iter()
            .map(|r| r.with_scenario(ctx.scenario_id, ctx.scenario_title.clone()))
            .collect())
    }

    pub async fn persist<S>(&self, store: &S, ctx: &SessionContext) -> Result<usize, StoreError>
    where
        S: ResultStore + ?Sized,
    {
        let records = self.records(ctx)?;
        let count = records.len();
        for record in records {
            store.save(record).await?;
        }
        tracing::info!(target: LOG_TARGET, user_id = %ctx.user_id, records = count, "session persisted");
        Ok(count)
    }

    /// Narrative requests for each analysis present, plus a comprehensive one
    /// when speech was analyzed.
    pub fn narrative_requests(&self, ctx: &SessionContext) -> Vec<NarrativeRequest> {
        let mut requests = Vec::new();
        if let Some(speech) = &self.speech {
            requests.push(NarrativeRequest::new(
                NarrativeKind::Speech,
                serde_json::json!({
                    "transcript": speech.metrics.transcript,
                    "wpm": speech.metrics.wpm,
                    "fillerWords": speech.metrics.filler_words,
                    "duration": speech.duration,
                }),
            ));
        }
        if let Some(emotion) = &self.emotion {
            requests.push(NarrativeRequest::new(
                NarrativeKind::Emotion,
                serde_json::json!({
                    "dominantEmotion": emotion.dominant_emotion,
                    "eyeContact": emotion.eye_contact,
                    "postureScore": self.posture.as_ref().map(|p| p.posture_score),
                }),
            ));
        }
        if let Some(posture) = &self.posture {
            requests.push(NarrativeRequest::new(
                NarrativeKind::Posture,
                serde_json::json!({
                    "postureScore": posture.posture_score,
                    "postureIssues": posture.posture_issues,
                }),
            ));
        }
        if let Some(speech) = &self.speech {
            requests.push(NarrativeRequest::new(
                NarrativeKind::Comprehensive,
                serde_json::json!({
                    "wpm": speech.metrics.wpm,
                    "fillerWords": speech.metrics.filler_words,
                    "dominantEmotion": self.emotion.as_ref().map(|e| e.dominant_emotion).unwrap_or_default(),
                    "eyeContact": self.emotion.as_ref().map(|e| e.eye_contact).unwrap_or_default(),
                    "postureScore": self.posture.as_ref().map(|p| p.posture_score).unwrap_or(0),
                    "confidenceScore": ctx.confidence_score,
                }),
            ));
        }
        requests
    }

    /// Fetches narratives; a failed request is logged and left out.
    pub async fn narrate<C>(&mut self, client: &C, ctx: &SessionContext)
    where
        C: NarrativeClient + ?Sized,
    {
        for request in self.narrative_requests(ctx) {
            let kind = request.kind;
            match client.narrate(request).await {
                Ok(narrative) => self.narratives.push(narrative),
                Err(e) => {
                    tracing::warn!(target: LOG_TARGET, kind = kind.as_str(), error = %e, "narrative unavailable");
                }
            }
        }
    }

    pub fn selection_covered(&self, selection: &AnalysisSelection) -> bool {
        selection.iter().all(|kind| match kind {
            AnalysisKind::Speech => self.speech.is_some(),
            AnalysisKind::Emotion => self.emotion.is_some(),
            AnalysisKind::Posture => self.posture.is_some(),
        })
    }
}
