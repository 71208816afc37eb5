use crate::narrative::{Narrative, NarrativeClient, NarrativeError, NarrativeKind, NarrativeRequest, NarrativeSource};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::{json, Value};

/// Deterministic narrative derived from the metrics alone. Used when no model
/// is configured or the remote call fails.
#[derive(Clone, Debug, Default)]
pub struct OfflineNarrativeClient;

impl OfflineNarrativeClient {
    pub fn new() -> Self {
        Self
    }

    pub fn compose(&self, request: &NarrativeRequest) -> Narrative {
        let m = &request.metrics;
        let content = match request.kind {
            NarrativeKind::Speech => speech(m),
            NarrativeKind::Emotion => emotion(m),
            NarrativeKind::Posture => posture(m),
            NarrativeKind::Comprehensive => comprehensive(m),
        };
        Narrative {
            kind: request.kind,
            source: NarrativeSource::Offline,
            content,
        }
    }
}

impl NarrativeClient for OfflineNarrativeClient {
    fn narrate(&self, request: NarrativeRequest) -> BoxFuture<'_, Result<Narrative, NarrativeError>> {
        let narrative = self.compose(&request);
        async move { Ok(narrative) }.boxed()
    }
}

fn number(m: &Value, key: &str) -> u64 {
    m.get(key)
        .and_then(|v| v.as_f64())
        .map(|v| v.max(0.0).round() as u64)
        .unwrap_or(0)
}

fn text<'a>(m: &'a Value, key: &str, default: &'a str) -> &'a str {
    m.get(key).and_then(Value::as_str).unwrap_or(default)
}

fn speech(m: &Value) -> Value {
    let wpm = number(m, "wpm");
    let fillers = number(m, "fillerWords");
    let quality = match wpm {
        0 => "No measurable speech",
        w if w < 100 => "Clear but slow delivery",
        w if w > 160 => "Energetic but rushed delivery",
        _ => "Steady, well paced delivery",
    };
    let score = match wpm {
        w if w > 150 => 7,
        w if w > 100 => 6,
        _ => 5,
    };
    json!({
        "quality": quality,
        "strengths": [format!("WPM: {wpm}"), format!("Managed {fillers} filler words")],
        "improvements": ["Continue practicing for more fluency"],
        "score": score,
    })
}

fn emotion(m: &Value) -> Value {
    let happy = text(m, "dominantEmotion", "neutral") == "happy";
    let good_eyes = text(m, "eyeContact", "unknown") == "good";
    json!({
        "authenticity": if happy { "High" } else { "Moderate" },
        "confidence": if good_eyes { 8 } else { 6 },
        "engagement": "Professional",
        "recommendations": ["Maintain eye contact", "Show more enthusiasm"],
    })
}

fn posture(m: &Value) -> Value {
    let score = number(m, "postureScore");
    let issues: Vec<Value> = m
        .get("postureIssues")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let quality = match score {
        s if s > 70 => "Excellent",
        s if s > 50 => "Good",
        _ => "Needs Improvement",
    };
    let corrections = if issues.is_empty() {
        vec![json!("Great posture!")]
    } else {
        issues
    };
    json!({
        "quality": quality,
        "presence": if score > 70 { 8 } else { 6 },
        "corrections": corrections,
        "impact": "Strong professional presence",
    })
}

fn comprehensive(m: &Value) -> Value {
    let wpm = number(m, "wpm");
    let emotion = text(m, "dominantEmotion", "neutral");
    let eyes = text(m, "eyeContact", "unknown");
    json!({
        "assessment": "Good communication performance overall. Focus on consistency and confidence.",
        "feedback": [
            format!("Speech pace was {wpm} WPM"),
            format!("Demonstrated {emotion} emotion"),
            format!("Maintained {eyes} eye contact"),
        ],
        "recommendations": [
            "Practice speaking more slowly for clarity",
            "Record yourself to identify filler words",
            "Work on maintaining consistent posture",
        ],
        "actionPlan": [
            "Record 2-3 more practice sessions this week",
            "Focus on one area at a time",
            "Review feedback before next practice",
        ],
    })
}
