use crate::error::AnalysisError;
use crate::services::openai::ChatRequest;

/// Trait for vision-capable chat-completion backends.
///
/// One call is one round trip: implementations must not retry.
#[async_trait::async_trait]
pub trait VisionModel: Send + Sync {
    async fn complete(&self, api_key: &str, request: &ChatRequest) -> Result<String, AnalysisError>;
}

#[cfg(test)]
pub mod fake {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Canned model for tests. Replies once, then reports an empty response,
    /// and records how often it was called.
    pub struct FakeVisionModel {
        reply: Mutex<Option<Result<String, AnalysisError>>>,
        calls: AtomicUsize,
        last_request: Mutex<Option<ChatRequest>>,
    }

    impl FakeVisionModel {
        pub fn replying(content: &str) -> Arc<Self> {
            Self::with_reply(Ok(content.to_string()))
        }

        pub fn failing(err: AnalysisError) -> Arc<Self> {
            Self::with_reply(Err(err))
        }

        fn with_reply(reply: Result<String, AnalysisError>) -> Arc<Self> {
            Arc::new(Self {
                reply: Mutex::new(Some(reply)),
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            })
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn last_request(&self) -> Option<ChatRequest> {
            self.last_request.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl VisionModel for FakeVisionModel {
        async fn complete(&self, _api_key: &str, request: &ChatRequest) -> Result<String, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            self.reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(AnalysisError::EmptyResponse))
        }
    }
}
