use anyhow::Context;
use clap::{ArgGroup, Parser};
use presence_coach_core::config::{
    parse_selection, resolve_api_key, resolve_string_with_default, CoachConfig, Env, FrameInterval,
    NarrativeConfig, StdEnv, DEFAULT_FRAME_INTERVAL_MS, DEFAULT_NARRATIVE_ENDPOINT,
    DEFAULT_NARRATIVE_MODEL, DEFAULT_USER_ID, ENV_GROQ_API_KEY, ENV_NARRATIVE_MODEL, ENV_USER_ID,
};
use presence_coach_core::feedback::{FeedbackInput, Personality, Tone};
use presence_coach_core::ingest::JsonlFrameSource;
use presence_coach_core::narrative::{
    FallbackNarrativeClient, GroqNarrativeClient, NarrativeClient, OfflineNarrativeClient,
};
use presence_coach_core::pipeline::{FrameEvent, PipelineConfig, SessionPipeline, VisualSummary};
use presence_coach_core::report::{SessionContext, SessionReport, SpeechSample};
use presence_coach_core::store::JsonlResultStore;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "presence-coach")]
#[command(about = "Scores a recorded practice session: speech pacing, posture and facial presence")]
#[command(group(
    ArgGroup::new("speech")
        .required(false)
        .multiple(false)
        .args(["transcript", "transcript_file"])
))]
struct Args {
    /// Capture frames as JSON lines (`{"pose":[..],"face":{..}}`).
    #[arg(long)]
    frames: Option<PathBuf>,

    #[arg(long)]
    transcript: Option<String>,

    #[arg(long)]
    transcript_file: Option<PathBuf>,

    /// Recording length in seconds.
    #[arg(long)]
    duration: Option<f64>,

    #[arg(long, default_value = "ambivert")]
    personality: String,

    #[arg(long, default_value_t = FeedbackInput::DEFAULT_CONFIDENCE)]
    confidence: f64,

    #[arg(long, default_value = "neutral")]
    tone: String,

    #[arg(long, default_value = "speech,emotion,posture")]
    analyses: String,

    #[arg(long)]
    user_id: Option<String>,

    #[arg(long)]
    scenario_id: Option<u32>,

    #[arg(long)]
    scenario_title: Option<String>,

    /// Append analysis records to this JSONL file.
    #[arg(long)]
    store: Option<PathBuf>,

    /// Request a coaching narrative for each analysis.
    #[arg(long, default_value_t = false)]
    narrative: bool,

    #[arg(long)]
    groq_api_key: Option<String>,

    #[arg(long)]
    narrative_model: Option<String>,

    #[arg(long, default_value = DEFAULT_NARRATIVE_ENDPOINT)]
    narrative_endpoint: String,

    #[arg(long, default_value_t = DEFAULT_FRAME_INTERVAL_MS)]
    frame_interval_ms: u64,

    /// Replay frames at the capture rate instead of as fast as possible.
    #[arg(long, default_value_t = false)]
    pace: bool,

    #[arg(long, default_value = "info")]
    log_level: String,
}

struct Run {
    config: CoachConfig,
    ctx: SessionContext,
    frames: Option<PathBuf>,
    speech: Option<SpeechSample>,
    store: Option<PathBuf>,
    narrative: bool,
    pace: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let env = StdEnv;
    let run = build_run(args, &env).await?;

    tracing::info!(
        user_id = %run.ctx.user_id,
        frame_interval_ms = run.config.frame_interval.millis,
        narrative = run.narrative,
        "config loaded"
    );

    let report = run_session(&run).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

async fn run_session(run: &Run) -> anyhow::Result<SessionReport> {
    let visual = match &run.frames {
        Some(path) => {
            let mut source = JsonlFrameSource::new(path);
            if run.pace {
                source = source.paced(run.config.frame_interval.duration());
            }
            let (event_tx, event_rx) = tokio::sync::mpsc::channel(64);
            let events = tokio::spawn(log_frame_events(event_rx));

            let summary = SessionPipeline::new(source, PipelineConfig::from_coach(&run.config))
                .with_events(event_tx)
                .run()
                .await
                .with_context(|| format!("analysing frames from {}", path.display()))?;
            events.await?;
            summary
        }
        None => VisualSummary::default(),
    };

    let mut report = SessionReport::compose(&run.config, &run.ctx, run.speech.as_ref(), visual);

    if run.narrative {
        let client = narrative_client(&run.config.narrative)?;
        report.narrate(client.as_ref(), &run.ctx).await;
    }

    if let Some(path) = &run.store {
        let store = JsonlResultStore::new(path);
        report
            .persist(&store, &run.ctx)
            .await
            .with_context(|| format!("writing results to {}", path.display()))?;
    }

    Ok(report)
}

async fn log_frame_events(mut rx: tokio::sync::mpsc::Receiver<FrameEvent>) {
    while let Some(event) = rx.recv().await {
        tracing::debug!(
            index = event.index,
            posture_score = event.posture.as_ref().map(|p| p.overall_score),
            facial_score = event.facial.as_ref().map(|f| f.overall_score),
            "frame analyzed"
        );
    }
}

fn narrative_client(config: &NarrativeConfig) -> anyhow::Result<Box<dyn NarrativeClient>> {
    if config.api_key.is_none() {
        tracing::info!("no {ENV_GROQ_API_KEY} configured, using offline narrative");
        return Ok(Box::new(OfflineNarrativeClient::new()));
    }
    let groq = GroqNarrativeClient::new(config)?;
    Ok(Box::new(FallbackNarrativeClient::new(groq, OfflineNarrativeClient::new())))
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn parse_label<T: serde::de::DeserializeOwned>(value: &str) -> anyhow::Result<T> {
    serde_json::from_value(serde_json::Value::String(value.trim().to_lowercase()))
        .with_context(|| format!("invalid value: {value}"))
}

async fn build_run(args: Args, env: &impl Env) -> anyhow::Result<Run> {
    let transcript = match (args.transcript, args.transcript_file) {
        (Some(t), None) => Some(t),
        (None, Some(path)) => Some(
            tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("reading transcript {}", path.display()))?,
        ),
        (None, None) => None,
        _ => anyhow::bail!("at most one of --transcript or --transcript-file may be provided"),
    };
    let speech = match (transcript, args.duration) {
        (Some(transcript), Some(duration_secs)) => Some(SpeechSample {
            transcript,
            duration_secs,
        }),
        (Some(_), None) => anyhow::bail!("--duration is required with a transcript"),
        (None, _) => None,
    };

    let api_key = resolve_api_key(args.groq_api_key, ENV_GROQ_API_KEY, env)?;
    let narrative = NarrativeConfig {
        api_key,
        model: resolve_string_with_default(
            args.narrative_model,
            ENV_NARRATIVE_MODEL,
            env,
            DEFAULT_NARRATIVE_MODEL,
        ),
        endpoint: args.narrative_endpoint,
    };

    let config = CoachConfig {
        frame_interval: FrameInterval::new(args.frame_interval_ms)?,
        selection: parse_selection(&args.analyses)?,
        narrative,
        ..Default::default()
    };

    let personality: Personality = parse_label(&args.personality)?;
    let tone: Tone = parse_label(&args.tone)?;
    let ctx = SessionContext {
        user_id: resolve_string_with_default(args.user_id, ENV_USER_ID, env, DEFAULT_USER_ID),
        personality,
        confidence_score: args.confidence,
        tone,
        scenario_id: args.scenario_id,
        scenario_title: args.scenario_title,
    };

    Ok(Run {
        config,
        ctx,
        frames: args.frames,
        speech,
        store: args.store,
        narrative: args.narrative,
        pace: args.pace,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use presence_coach_core::config::MapEnv;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["presence-coach"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[tokio::test]
    async fn defaults_follow_the_practice_page() {
        let run = build_run(args(&["--transcript", "hello there", "--duration", "30"]), &MapEnv::default())
            .await
            .expect("valid args");
        assert_eq!(run.ctx.personality, Personality::Ambivert);
        assert_eq!(run.ctx.confidence_score, 7.0);
        assert_eq!(run.ctx.tone, Tone::Neutral);
        assert_eq!(run.ctx.user_id, DEFAULT_USER_ID);
        assert!(run.config.narrative.api_key.is_none());
        assert_eq!(run.speech.map(|s| s.duration_secs), Some(30.0));
    }

    #[tokio::test]
    async fn env_supplies_user_and_key() {
        let env = MapEnv::default()
            .with_var(ENV_USER_ID, "u-42")
            .with_var(ENV_GROQ_API_KEY, "gsk-test");
        let run = build_run(args(&["--analyses", "posture"]), &env)
            .await
            .expect("valid args");
        assert_eq!(run.ctx.user_id, "u-42");
        assert!(run.config.narrative.api_key.is_some());
        assert!(run.speech.is_none());
    }

    #[tokio::test]
    async fn transcript_without_duration_is_rejected() {
        let err = build_run(args(&["--transcript", "hi"]), &MapEnv::default()).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn unknown_tone_is_tolerated_as_neutral() {
        let run = build_run(args(&["--tone", "Mumbling"]), &MapEnv::default())
            .await
            .expect("valid args");
        assert_eq!(run.ctx.tone, Tone::Neutral);
    }

    #[tokio::test]
    async fn session_without_frames_reports_speech_only() {
        let run = build_run(
            args(&["--transcript", "um we like grew revenue", "--duration", "3", "--analyses", "speech"]),
            &MapEnv::default(),
        )
        .await
        .expect("valid args");
        let report = run_session(&run).await.expect("session runs");
        let speech = report.speech.expect("speech analyzed");
        assert_eq!(speech.metrics.filler_words, 2);
        assert_eq!(speech.metrics.wpm, 100);
        assert!(report.posture.is_none());
    }
}
