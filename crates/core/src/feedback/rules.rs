use crate::feedback::{FeedbackInput, FeedbackResult, Personality, Tone};

const MIN_WPM: u32 = 100;
const MAX_WPM: u32 = 160;
const MANY_FILLERS: u32 = 4;
const FEW_FILLERS: u32 = 1;
const LOW_CONFIDENCE: f64 = 6.0;
const HIGH_CONFIDENCE: f64 = 8.0;
const MIN_DURATION_SECS: f64 = 20.0;

#[derive(Default)]
struct Composition {
    score: i32,
    feedback: Vec<String>,
    recommendations: Vec<String>,
}

impl Composition {
    fn new() -> Self {
        Self {
            score: 100,
            ..Default::default()
        }
    }

    fn praise(&mut self, line: impl Into<String>) {
        self.feedback.push(line.into());
    }

    fn penalize(&mut self, points: i32, line: impl Into<String>) {
        self.score -= points;
        self.feedback.push(line.into());
    }

    fn recommend(&mut self, line: &str) {
        self.recommendations.push(line.to_owned());
    }

    fn finish(self) -> FeedbackResult {
        FeedbackResult {
            feedback: self.feedback,
            recommendations: self.recommendations,
            overall_score: self.score.max(0).unsigned_abs(),
        }
    }
}

/// Rule-based coaching feedback. Blocks run in a fixed order and each reads
/// only its own fields, so the output is a pure function of `input`.
pub fn generate_feedback(input: &FeedbackInput) -> FeedbackResult {
    let mut c = Composition::new();

    pacing(&mut c, input.metrics.wpm);
    fluency(&mut c, input.metrics.filler_words);
    confidence(&mut c, input.confidence_score);
    tone(&mut c, input.tone);
    duration(&mut c, input.duration);
    personality(&mut c, input.personality);

    let result = c.finish();
    tracing::debug!(
        score = result.overall_score,
        feedback = result.feedback.len(),
        recommendations = result.recommendations.len(),
        "feedback composed"
    );
    result
}

fn pacing(c: &mut Composition, wpm: u32) {
    if wpm < MIN_WPM {
        c.penalize(
            10,
            format!("📉 Pacing: {wpm} WPM is a little slow. Aim for 120-150 WPM to hold attention."),
        );
    } else if wpm > MAX_WPM {
        c.penalize(
            10,
            format!("📈 Pacing: {wpm} WPM is fast. Slowing down slightly will improve clarity."),
        );
    } else {
        c.praise(format!("✅ Pacing: {wpm} WPM is a professional, engaging speed."));
    }
}

fn fluency(c: &mut Composition, fillers: u32) {
    if fillers > MANY_FILLERS {
        c.penalize(
            15,
            format!("⚠️ Fluency: {fillers} filler words detected. They distract from your message."),
        );
        c.recommend("Practice the pause: when a filler is coming, stop and breathe instead.");
    } else if fillers > FEW_FILLERS {
        c.penalize(
            5,
            "ℹ️ Fluency: a few filler words slipped in. Dropping them will sound more authoritative.",
        );
    } else {
        c.praise("🌟 Fluency: clear delivery with almost no filler words.");
    }
}

fn confidence(c: &mut Composition, score: f64) {
    if score < LOW_CONFIDENCE {
        c.penalize(
            20,
            format!("🛡️ Confidence: your confidence level is low ({score}/10). You may sound hesitant."),
        );
        c.recommend("Try a power pose for two minutes before you speak.");
    } else if score < HIGH_CONFIDENCE {
        c.penalize(
            10,
            format!("📊 Confidence: moderately confident ({score}/10). A bit more vocal energy would help."),
        );
        c.recommend("End sentences with a downward inflection to sound more definitive.");
    } else {
        c.praise(format!(
            "🔥 Confidence: you project strong confidence ({score}/10), which builds trust."
        ));
    }
}

fn tone(c: &mut Composition, tone: Tone) {
    match tone {
        Tone::Nervous => {
            c.penalize(10, "🎵 Tone: your voice sounds nervous.");
            c.recommend("Use box breathing (inhale 4s, hold 4s, exhale 4s) to settle your nerves.");
        }
        Tone::Flat => {
            c.penalize(10, "🎵 Tone: your delivery sounds monotone. Vocal variety keeps listeners engaged.");
            c.recommend("Emphasize key verbs and adjectives to add color to your speech.");
        }
        Tone::Confident => c.praise("🎵 Tone: warm, resonant and assured."),
        Tone::Neutral => {}
    }
}

fn duration(c: &mut Composition, secs: f64) {
    if secs < MIN_DURATION_SECS {
        c.penalize(5, "⏱️ Duration: your response was very brief. Elaborating shows depth of thought.");
        c.recommend("Structure answers with PREP: Point, Reason, Example, Point.");
    } else {
        c.praise("⏱️ Duration: your answer had enough room to develop its points.");
    }
}

fn personality(c: &mut Composition, personality: Personality) {
    let tip = match personality {
        Personality::Introvert => {
            "🧠 Coach tip: lean on your listening skills and pause to form your insight before speaking."
        }
        Personality::Ambivert => {
            "🧠 Coach tip: balance your practice. Low on energy? Push volume. High? Focus on structure."
        }
        Personality::Extrovert => {
            "🧠 Coach tip: your energy is a strength. Leave space for clarity and don't rush."
        }
        Personality::Unknown => return,
    };
    c.recommend(tip);
}
