mod fillers;

use serde::{Deserialize, Serialize};

pub use fillers::{FillerLexicon, DEFAULT_FILLER_WORDS};

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SpeechMetrics {
    pub wpm: u32,
    pub filler_words: u32,
    pub transcript: String,
}

impl SpeechMetrics {
    /// Zero-rate result used when no usable speech is available.
    pub fn sentinel(transcript: impl Into<String>) -> Self {
        Self {
            wpm: 0,
            filler_words: 0,
            transcript: transcript.into(),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SpeechInputError {
    #[error("No speech detected. Please speak during recording.")]
    NoSpeech,
    #[error("Invalid recording duration: {0}")]
    InvalidDuration(f64),
}

/// Checks the inputs `analyze_speech` would otherwise map to a sentinel, so a
/// caller can surface the reason to the user.
pub fn validate_speech_input(transcript: &str, duration_secs: f64) -> Result<(), SpeechInputError> {
    if transcript.trim().is_empty() {
        return Err(SpeechInputError::NoSpeech);
    }
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return Err(SpeechInputError::InvalidDuration(duration_secs));
    }
    Ok(())
}

#[derive(Clone, Debug, Default)]
pub struct SpeechAnalyzer {
    lexicon: FillerLexicon,
}

impl SpeechAnalyzer {
    pub fn new(lexicon: FillerLexicon) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &FillerLexicon {
        &self.lexicon
    }

    pub fn analyze(&self, transcript: &str, duration_secs: f64) -> SpeechMetrics {
        if transcript.trim().is_empty() {
            tracing::debug!("empty transcript, returning sentinel metrics");
            return SpeechMetrics::sentinel(transcript);
        }

        let filler_words = self.lexicon.count_in(transcript);
        let word_count = transcript.split_whitespace().count();

        let wpm = if duration_secs.is_finite() && duration_secs > 0.0 {
            let rate = word_count as f64 / (duration_secs / 60.0);
            // Saturating float-to-int cast.
            rate.round() as u32
        } else {
            tracing::warn!(duration_secs, "invalid speech duration, reporting wpm=0");
            0
        };

        tracing::debug!(word_count, wpm, filler_words, "speech analyzed");

        SpeechMetrics {
            wpm,
            filler_words,
            transcript: transcript.to_owned(),
        }
    }
}

/// Rate-of-speech and filler metrics using the default filler lexicon.
pub fn analyze_speech(transcript: &str, duration_secs: f64) -> SpeechMetrics {
    SpeechAnalyzer::default().analyze(transcript, duration_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_fillers_and_rate() {
        let metrics = analyze_speech("um so I like think uh this is good", 60.0);
        assert_eq!(metrics.filler_words, 3);
        assert_eq!(metrics.wpm, 9);
        assert_eq!(metrics.transcript, "um so I like think uh this is good");
    }

    #[test]
    fn eight_words_in_one_minute_is_eight_wpm() {
        let metrics = analyze_speech("um I like think uh this is good", 60.0);
        assert_eq!(metrics.wpm, 8);
        assert_eq!(metrics.filler_words, 3);
    }

    #[test]
    fn rate_is_rounded() {
        // 5 words in 35s = 8.57 wpm
        assert_eq!(analyze_speech("one two three four five", 35.0).wpm, 9);
        // 10 words in 45s = 13.33 wpm
        assert_eq!(analyze_speech("a b c d e f g h i j", 45.0).wpm, 13);
    }

    #[test]
    fn is_idempotent() {
        let t = "Basically, you know, I actually think it went fine";
        assert_eq!(analyze_speech(t, 12.5), analyze_speech(t, 12.5));
    }

    #[test]
    fn empty_transcript_yields_sentinel() {
        let metrics = analyze_speech("   \n\t", 30.0);
        assert_eq!(metrics.wpm, 0);
        assert_eq!(metrics.filler_words, 0);
        assert_eq!(
            validate_speech_input("   ", 30.0),
            Err(SpeechInputError::NoSpeech)
        );
    }

    #[test]
    fn invalid_duration_yields_zero_rate() {
        for d in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let metrics = analyze_speech("um hello there", d);
            assert_eq!(metrics.wpm, 0);
            assert_eq!(metrics.filler_words, 1);
            assert!(matches!(
                validate_speech_input("um hello there", d),
                Err(SpeechInputError::InvalidDuration(_))
            ));
        }
        assert!(validate_speech_input("hello", 1.0).is_ok());
    }

    #[test]
    fn serializes_with_downstream_field_names() {
        let v = serde_json::to_value(analyze_speech("uh hi", 60.0)).expect("serializable");
        assert_eq!(
            v,
            serde_json::json!({"wpm": 2, "fillerWords": 1, "transcript": "uh hi"})
        );
    }

    #[test]
    fn custom_lexicon_applies() {
        let analyzer = SpeechAnalyzer::new(FillerLexicon::new(["so"]));
        assert_eq!(analyzer.analyze("so um so", 60.0).filler_words, 2);
    }
}
