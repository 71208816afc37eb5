use crate::facial::FacialThresholds;
use crate::posture::PostureThresholds;
use crate::speech::FillerLexicon;
use crate::store::AnalysisKind;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt, time::Duration};

pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 100;
pub const DEFAULT_NARRATIVE_MODEL: &str = "llama3-70b-8192";
pub const DEFAULT_NARRATIVE_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_USER_ID: &str = "anonymous";
pub const ENV_GROQ_API_KEY: &str = "GROQ_API_KEY";
pub const ENV_NARRATIVE_MODEL: &str = "PRESENCE_COACH_NARRATIVE_MODEL";
pub const ENV_USER_ID: &str = "PRESENCE_COACH_USER_ID";

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(v))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(**redacted**)")
    }
}

/// Polling interval of the capture loop.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrameInterval {
    pub millis: u64,
}

impl FrameInterval {
    pub fn new(millis: u64) -> Result<Self, ConfigError> {
        if millis == 0 {
            return Err(ConfigError::ZeroFrameInterval);
        }
        Ok(Self { millis })
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.millis)
    }

    pub fn frames_per_second(&self) -> f64 {
        1000.0 / self.millis as f64
    }
}

impl Default for FrameInterval {
    fn default() -> Self {
        Self {
            millis: DEFAULT_FRAME_INTERVAL_MS,
        }
    }
}

/// Which analyses a session runs and persists.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct AnalysisSelection(BTreeSet<AnalysisKind>);

impl AnalysisSelection {
    pub fn new<I: IntoIterator<Item = AnalysisKind>>(kinds: I) -> Result<Self, ConfigError> {
        let set: BTreeSet<_> = kinds.into_iter().collect();
        if set.is_empty() {
            return Err(ConfigError::EmptySelection);
        }
        Ok(Self(set))
    }

    pub fn all() -> Self {
        Self(
            [AnalysisKind::Speech, AnalysisKind::Emotion, AnalysisKind::Posture]
                .into_iter()
                .collect(),
        )
    }

    pub fn includes(&self, kind: AnalysisKind) -> bool {
        self.0.contains(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = AnalysisKind> + '_ {
        self.0.iter().copied()
    }
}

impl Default for AnalysisSelection {
    fn default() -> Self {
        Self::all()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NarrativeConfig {
    pub api_key: Option<ApiKey>,
    pub model: String,
    pub endpoint: String,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_NARRATIVE_MODEL.to_owned(),
            endpoint: DEFAULT_NARRATIVE_ENDPOINT.to_owned(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct CoachConfig {
    pub posture: PostureThresholds,
    pub facial: FacialThresholds,
    pub fillers: FillerLexicon,
    pub frame_interval: FrameInterval,
    pub selection: AnalysisSelection,
    pub narrative: NarrativeConfig,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("api key must not be empty")]
    EmptyApiKey,
    #[error("frame interval must be > 0 ms")]
    ZeroFrameInterval,
    #[error("at least one analysis must be selected")]
    EmptySelection,
    #[error("unknown analysis kind: {0}")]
    UnknownAnalysis(String),
}

pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StdEnv;

impl Env for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: std::collections::BTreeMap<String, String>,
}

impl MapEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn resolve_api_key(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Result<Option<ApiKey>, ConfigError> {
    match cli_value {
        Some(v) => Ok(Some(ApiKey::new(v)?)),
        None => match env.var(env_key) {
            Some(v) => Ok(Some(ApiKey::new(v)?)),
            None => Ok(None),
        },
    }
}

pub fn resolve_string_with_default(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
    default: &str,
) -> String {
    match cli_value {
        Some(v) => v,
        None => env.var(env_key).unwrap_or_else(|| default.to_owned()),
    }
}

pub fn resolve_optional_string(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Option<String> {
    match cli_value {
        Some(v) => Some(v),
        None => env.var(env_key),
    }
}

/// Parses a comma separated list such as `speech,posture`.
pub fn parse_selection(value: &str) -> Result<AnalysisSelection, ConfigError> {
    let kinds = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<AnalysisKind>().map_err(|_| ConfigError::UnknownAnalysis(s.to_owned())))
        .collect::<Result<Vec<_>, _>>()?;
    AnalysisSelection::new(kinds)
}
