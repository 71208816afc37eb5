use crate::narrative::{Narrative, NarrativeClient, NarrativeError, NarrativeRequest};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const LOG_TARGET: &str = "narrative::fallback";

/// Tries the model first and answers from `local` when it fails. Rejected
/// credentials disable the model for the lifetime of the client.
#[derive(Clone)]
pub struct FallbackNarrativeClient<P, L>
where
    P: NarrativeClient + Clone,
    L: NarrativeClient + Clone,
{
    primary: P,
    local: L,
    primary_disabled: Arc<AtomicBool>,
}

impl<P, L> FallbackNarrativeClient<P, L>
where
    P: NarrativeClient + Clone,
    L: NarrativeClient + Clone,
{
    pub fn new(primary: P, local: L) -> Self {
        Self {
            primary,
            local,
            primary_disabled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_using_fallback(&self) -> bool {
        self.primary_disabled.load(Ordering::Relaxed)
    }
}

impl<P, L> NarrativeClient for FallbackNarrativeClient<P, L>
where
    P: NarrativeClient + Clone + Send + Sync + 'static,
    L: NarrativeClient + Clone + Send + Sync + 'static,
{
    fn narrate(&self, request: NarrativeRequest) -> BoxFuture<'_, Result<Narrative, NarrativeError>> {
        async move {
            if self.primary_disabled.load(Ordering::Relaxed) {
                return self.local.narrate(request).await;
            }

            match self.primary.narrate(request.clone()).await {
                Ok(narrative) => Ok(narrative),
                Err(e) if e.is_auth_failure() => {
                    tracing::warn!(target: LOG_TARGET, error = %e, "narrative credentials rejected, using offline narrative from now on");
                    self.primary_disabled.store(true, Ordering::Relaxed);
                    self.local.narrate(request).await
                }
                Err(e) => {
                    tracing::warn!(target: LOG_TARGET, error = %e, kind = request.kind.as_str(), "narrative request failed, using offline narrative");
                    self.local.narrate(request).await
                }
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narrative::{NarrativeKind, NarrativeSource, OfflineNarrativeClient};
    use std::sync::atomic::AtomicU32;

    #[derive(Clone, Default)]
    struct FailingClient {
        status: u16,
        calls: Arc<AtomicU32>,
    }

    impl NarrativeClient for FailingClient {
        fn narrate(&self, _request: NarrativeRequest) -> BoxFuture<'_, Result<Narrative, NarrativeError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let status = self.status;
            async move {
                Err(NarrativeError::Api {
                    status,
                    body: "nope".into(),
                })
            }
            .boxed()
        }
    }

    #[derive(Clone)]
    struct ModelClient;

    impl NarrativeClient for ModelClient {
        fn narrate(&self, request: NarrativeRequest) -> BoxFuture<'_, Result<Narrative, NarrativeError>> {
            async move {
                Ok(Narrative {
                    kind: request.kind,
                    source: NarrativeSource::Model,
                    content: serde_json::json!({"assessment": "great"}),
                })
            }
            .boxed()
        }
    }

    fn request() -> NarrativeRequest {
        NarrativeRequest::new(NarrativeKind::Comprehensive, serde_json::json!({"wpm": 120}))
    }

    #[tokio::test]
    async fn uses_model_when_healthy() {
        let client = FallbackNarrativeClient::new(ModelClient, OfflineNarrativeClient::new());
        let n = client.narrate(request()).await.expect("narrative");
        assert_eq!(n.source, NarrativeSource::Model);
        assert!(!client.is_using_fallback());
    }

    #[tokio::test]
    async fn transient_failure_falls_back_per_request() {
        let primary = FailingClient {
            status: 503,
            ..Default::default()
        };
        let calls = primary.calls.clone();
        let client = FallbackNarrativeClient::new(primary, OfflineNarrativeClient::new());

        for _ in 0..2 {
            let n = client.narrate(request()).await.expect("narrative");
            assert_eq!(n.source, NarrativeSource::Offline);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!client.is_using_fallback());
    }

    #[tokio::test]
    async fn rejected_credentials_disable_the_model() {
        let primary = FailingClient {
            status: 401,
            ..Default::default()
        };
        let calls = primary.calls.clone();
        let client = FallbackNarrativeClient::new(primary, OfflineNarrativeClient::new());

        client.narrate(request()).await.expect("narrative");
        client.narrate(request()).await.expect("narrative");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(client.is_using_fallback());
    }
}
