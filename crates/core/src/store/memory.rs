use crate::store::{newest_first, AnalysisKind, AnalysisRecord, ResultStore, StoreError};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone, Default)]
pub struct MemoryResultStore {
    records: Arc<Mutex<Vec<AnalysisRecord>>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    pub async fn snapshot(&self) -> Vec<AnalysisRecord> {
        self.records.lock().await.clone()
    }
}

impl ResultStore for MemoryResultStore {
    fn save(&self, record: AnalysisRecord) -> BoxFuture<'_, Result<(), StoreError>> {
        async move {
            self.records.lock().await.push(record);
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
            let mut matching: Vec<_> = self
                .records
                .lock()
                .await
                .iter()
                .filter(|r| r.user_id == user_id && r.kind == kind)
                .cloned()
                .collect();
            newest_first(&mut matching);
            Ok(matching)
        }
        .boxed()
    }
}
