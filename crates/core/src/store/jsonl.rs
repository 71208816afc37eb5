use crate::store::{newest_first, AnalysisKind, AnalysisRecord, ResultStore, StoreError};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

const LOG_TARGET: &str = "store::jsonl";

/// Appends one JSON record per line. Writes are serialized through a lock so
/// concurrent sessions never interleave partial lines.
#[derive(Clone)]
pub struct JsonlResultStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl JsonlResultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultStore for JsonlResultStore {
    fn save(&self, record: AnalysisRecord) -> BoxFuture<'_, Result<(), StoreError>> {
        async move {
            let mut line = serde_json::to_vec(&record)?;
            line.push(b'\n');

            let _guard = self.write_lock.lock().await;
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            file.write_all(&line).await?;
            file.flush().await?;

            tracing::debug!(
                target: LOG_TARGET,
                user_id = %record.user_id,
                kind = %record.kind,
                path = %self.path.display(),
                "analysis record saved"
            );
            Ok(())
        }
        .boxed()
    }

    fn history(
        &self,
        user_id: String,
        kind: AnalysisKind,
    ) -> BoxFuture<'_, Result<Vec<AnalysisRecord>, StoreError>> {
        async move {
            let content = match tokio::fs::read_to_string(&self.path).await {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(e.into()),
            };

            let mut records = Vec::new();
            for (index, line) in content.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<AnalysisRecord>(line) {
                    Ok(r) if r.user_id == user_id && r.kind == kind => records.push(r),
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(target: LOG_TARGET, line = index + 1, error = %e, "skipping malformed record");
                    }
                }
            }
            newest_first(&mut records);
            Ok(records)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appends_and_reads_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonlResultStore::new(dir.path().join("results.jsonl"));

        let missing = store
            .history("u".into(), AnalysisKind::Speech)
            .await
            .expect("missing file is empty");
        assert!(missing.is_empty());

        let first = AnalysisRecord::new("u", AnalysisKind::Speech, &serde_json::json!({"wpm": 120}))
            .expect("serializable");
        let other = AnalysisRecord::new("u", AnalysisKind::Emotion, &serde_json::json!({}))
            .expect("serializable");
        store.save(first.clone()).await.expect("saved");
        store.save(other).await.expect("saved");

        let history = store
            .history("u".into(), AnalysisKind::Speech)
            .await
            .expect("readable");
        assert_eq!(history, vec![first]);
    }

    #[tokio::test]
    async fn skips_malformed_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("results.jsonl");
        tokio::fs::write(&path, "not json\n\n").await.expect("written");

        let store = JsonlResultStore::new(&path);
        let record = AnalysisRecord::new("u", AnalysisKind::Posture, &serde_json::json!({"postureScore": 70}))
            .expect("serializable");
        store.save(record).await.expect("saved");

        let history = store
            .history("u".into(), AnalysisKind::Posture)
            .await
            .expect("readable");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].data["postureScore"], 70);
    }
}
