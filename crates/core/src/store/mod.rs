mod jsonl;
mod memory;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

pub use jsonl::JsonlResultStore;
pub use memory::MemoryResultStore;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    Speech,
    Emotion,
    Posture,
}

impl AnalysisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::Speech => "speech",
            AnalysisKind::Emotion => "emotion",
            AnalysisKind::Posture => "posture",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "speech" => Ok(AnalysisKind::Speech),
            "emotion" => Ok(AnalysisKind::Emotion),
            "posture" => Ok(AnalysisKind::Posture),
            _ => Err(StoreError::UnknownKind(s.to_owned())),
        }
    }
}

/// Shape handed to the persistence collaborator.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: AnalysisKind,
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_title: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AnalysisRecord {
    pub fn new<T: Serialize>(
        user_id: impl Into<String>,
        kind: AnalysisKind,
        data: &T,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            user_id: user_id.into(),
            kind,
            data: serde_json::to_value(data)?,
            scenario_id: None,
            scenario_title: None,
            created_at: Utc::now(),
        })
    }

    pub fn with_scenario(mut self, id: Option<u32>, title: Option<String>) -> Self {
        self.scenario_id = id;
        self.scenario_title = title;
        self
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown analysis type: {0}")]
    UnknownKind(String),
}

pub trait ResultStore: Send + Sync {
    fn save(&self, record: AnalysisRecord) -> BoxFuture<'_, Result<(), StoreError>>;

    /// All records of one type for a user, newest first.
    fn history(
        &self,
        user_id: String,
        kind: AnalysisKind,
    ) -> BoxFuture<'_, Result<Vec<AnalysisRecord>, StoreError>>;
}

pub(crate) fn newest_first(records: &mut [AnalysisRecord]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
