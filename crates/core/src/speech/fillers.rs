use serde::{Deserialize, Serialize};

pub const DEFAULT_FILLER_WORDS: &[&str] = &["um", "uh", "like", "you know", "actually", "basically"];

/// Filler phrases matched case-insensitively on whole words.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FillerLexicon {
    phrases: Vec<String>,
}

impl FillerLexicon {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let phrases = phrases
            .into_iter()
            .map(|p| normalize_phrase(p.as_ref()))
            .filter(|p| !p.is_empty())
            .collect();
        Self { phrases }
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn count_in(&self, transcript: &str) -> u32 {
        let words = tokenize(transcript);
        let mut total = 0u32;
        for phrase in &self.phrases {
            let needle: Vec<&str> = phrase.split(' ').collect();
            if needle.len() > words.len() {
                continue;
            }
            let hits = words
                .windows(needle.len())
                .filter(|window| window.iter().map(String::as_str).eq(needle.iter().copied()))
                .count();
            total = total.saturating_add(u32::try_from(hits).unwrap_or(u32::MAX));
        }
        total
    }
}

impl Default for FillerLexicon {
    fn default() -> Self {
        Self::new(DEFAULT_FILLER_WORDS.iter().copied())
    }
}

fn normalize_phrase(phrase: &str) -> String {
    tokenize(phrase).join(" ")
}

fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}
