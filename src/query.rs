//! Cached read and tracked write over the transport, plus the rule binding
//! them: a successful submission invalidates the conversation cache so the
//! next fetch picks up both the persisted user message and the reply.
//!
//! Both sides follow the same shape: spawn the network call as a task held
//! in state, then drive it from the event loop with a non-blocking `poll`.

use tokio::task::JoinHandle;

use crate::api::{ApiClient, TransportError};
use crate::message::Message;

/// Read side: the conversation list, fetched once and cached until
/// invalidated. All consumers share the single in-flight fetch.
pub struct MessageCache {
    messages: Option<Vec<Message>>,
    error: Option<String>,
    task: Option<JoinHandle<Result<Vec<Message>, TransportError>>>,
}

impl MessageCache {
    pub fn new() -> Self {
        Self {
            messages: None,
            error: None,
            task: None,
        }
    }

    /// Spawn the fetch if nothing is cached and nothing is in flight.
    /// A failed fetch parks the cache in its error state; `ensure` will not
    /// fetch again until `invalidate` clears it. No automatic retry.
    pub fn ensure(&mut self, api: &ApiClient) {
        if self.messages.is_some() || self.error.is_some() || self.task.is_some() {
            return;
        }
        let api = api.clone();
        self.task = Some(tokio::spawn(async move { api.fetch_messages().await }));
    }

    /// Drop the cached value (and any parked error) so the next `ensure`
    /// fetches again. An in-flight fetch is left to finish; its result
    /// lands through `poll` as usual.
    pub fn invalidate(&mut self) {
        self.messages = None;
        self.error = None;
    }

    /// Apply the in-flight fetch's result if it has landed.
    pub async fn poll(&mut self) {
        let finished = self
            .task
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }
        if let Some(task) = self.task.take() {
            match task.await {
                Ok(Ok(messages)) => {
                    self.messages = Some(messages);
                    self.error = None;
                }
                Ok(Err(err)) => self.error = Some(err.to_string()),
                Err(err) => self.error = Some(err.to_string()),
            }
        }
    }

    pub fn messages(&self) -> Option<&[Message]> {
        self.messages.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_fetching(&self) -> bool {
        self.task.is_some()
    }
}

/// Status of the write side. Success is observable until the next trigger;
/// the pending echo stops rendering as soon as the status leaves
/// `Pending`/`Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStatus {
    Idle,
    Pending,
    Success,
    Error,
}

/// Write side: at most one submission tracked at a time. Exposes the status,
/// the last-submitted text (so the view can echo it before the server
/// answers), and the last failure.
///
/// The tracker does not queue or reject concurrent triggers; keeping a
/// second submission from starting while one is pending is the input
/// surface's job.
pub struct SubmitTracker {
    status: SubmitStatus,
    input: Option<String>,
    error: Option<String>,
    task: Option<JoinHandle<Result<Message, TransportError>>>,
}

impl SubmitTracker {
    pub fn new() -> Self {
        Self {
            status: SubmitStatus::Idle,
            input: None,
            error: None,
            task: None,
        }
    }

    /// Start a submission of `text`.
    pub fn trigger(&mut self, text: String, api: &ApiClient) {
        let api = api.clone();
        let payload = text.clone();
        self.input = Some(text);
        self.error = None;
        self.status = SubmitStatus::Pending;
        self.task = Some(tokio::spawn(async move {
            api.submit_message(&payload).await
        }));
    }

    /// Apply the in-flight submission's result if it has landed. On success
    /// the conversation cache is invalidated; the next fetch picks up the
    /// user message and the reply.
    pub async fn poll(&mut self, cache: &mut MessageCache) {
        let finished = self
            .task
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }
        if let Some(task) = self.task.take() {
            match task.await {
                Ok(Ok(_reply)) => {
                    self.status = SubmitStatus::Success;
                    cache.invalidate();
                }
                Ok(Err(err)) => {
                    self.status = SubmitStatus::Error;
                    self.error = Some(err.to_string());
                }
                Err(err) => {
                    self.status = SubmitStatus::Error;
                    self.error = Some(err.to_string());
                }
            }
        }
    }

    pub fn status(&self) -> SubmitStatus {
        self.status
    }

    pub fn is_pending(&self) -> bool {
        self.status == SubmitStatus::Pending
    }

    /// The text last handed to `trigger`, surviving into the error state so
    /// the view can keep echoing it.
    pub fn input(&self) -> Option<&str> {
        self.input.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn settle_cache(cache: &mut MessageCache) {
        for _ in 0..200 {
            cache.poll().await;
            if !cache.is_fetching() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("fetch did not settle");
    }

    async fn settle_tracker(tracker: &mut SubmitTracker, cache: &mut MessageCache) {
        for _ in 0..200 {
            tracker.poll(cache).await;
            if !tracker.is_pending() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("submission did not settle");
    }

    fn conversation_body() -> serde_json::Value {
        json!([
            {"id": 1, "role": "user", "content": "hi"},
            {"id": 2, "role": "assistant", "content": "hello"}
        ])
    }

    #[tokio::test]
    async fn test_ensure_fetches_once_and_caches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(conversation_body()))
            .expect(1)
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri());
        let mut cache = MessageCache::new();

        cache.ensure(&api);
        // Second ensure while the first fetch is outstanding shares it.
        cache.ensure(&api);
        settle_cache(&mut cache).await;

        assert_eq!(cache.messages().unwrap().len(), 2);

        // Cached value is served without another fetch.
        cache.ensure(&api);
        cache.poll().await;
        assert_eq!(cache.messages().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_never_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/messages"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri());
        let mut cache = MessageCache::new();

        cache.ensure(&api);
        settle_cache(&mut cache).await;

        assert!(cache.messages().is_none());
        assert!(cache.error().unwrap().contains("500"));

        // Still failed; ensure must not spawn a second fetch.
        cache.ensure(&api);
        cache.poll().await;
        assert!(!cache.is_fetching());
        assert!(cache.error().is_some());
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(conversation_body()))
            .expect(2)
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri());
        let mut cache = MessageCache::new();

        cache.ensure(&api);
        settle_cache(&mut cache).await;
        assert!(cache.messages().is_some());

        cache.invalidate();
        assert!(cache.messages().is_none());

        cache.ensure(&api);
        settle_cache(&mut cache).await;
        assert!(cache.messages().is_some());
    }

    #[tokio::test]
    async fn test_invalidate_clears_parked_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/messages"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(conversation_body()))
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri());
        let mut cache = MessageCache::new();

        cache.ensure(&api);
        settle_cache(&mut cache).await;
        assert!(cache.error().is_some());

        // Manual refresh path: invalidate, then ensure fetches again.
        cache.invalidate();
        cache.ensure(&api);
        settle_cache(&mut cache).await;

        assert!(cache.error().is_none());
        assert_eq!(cache.messages().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_trigger_goes_pending_and_keeps_input() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/messages"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": 3, "role": "assistant", "content": "4"}))
                    .set_delay(Duration::from_millis(50)),
            )
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri());
        let mut cache = MessageCache::new();
        let mut tracker = SubmitTracker::new();

        assert_eq!(tracker.status(), SubmitStatus::Idle);
        tracker.trigger("What is 2+2?".to_string(), &api);

        assert!(tracker.is_pending());
        assert_eq!(tracker.input(), Some("What is 2+2?"));
        assert!(tracker.error().is_none());

        settle_tracker(&mut tracker, &mut cache).await;
        assert_eq!(tracker.status(), SubmitStatus::Success);
    }

    #[tokio::test]
    async fn test_success_invalidates_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(conversation_body()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(
                {"id": 3, "role": "assistant", "content": "4"}
            )))
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri());
        let mut cache = MessageCache::new();
        let mut tracker = SubmitTracker::new();

        cache.ensure(&api);
        settle_cache(&mut cache).await;
        assert!(cache.messages().is_some());

        tracker.trigger("What is 2+2?".to_string(), &api);
        settle_tracker(&mut tracker, &mut cache).await;

        assert_eq!(tracker.status(), SubmitStatus::Success);
        // The cached conversation is gone; the next ensure refetches.
        assert!(cache.messages().is_none());
    }

    #[tokio::test]
    async fn test_failed_submission_keeps_input_and_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/messages"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri());
        let mut cache = MessageCache::new();
        let mut tracker = SubmitTracker::new();

        tracker.trigger("hi".to_string(), &api);
        settle_tracker(&mut tracker, &mut cache).await;

        assert_eq!(tracker.status(), SubmitStatus::Error);
        assert_eq!(tracker.input(), Some("hi"));
        assert!(tracker.error().unwrap().contains("500"));
        // A failed write never touches the read cache.
        assert!(cache.messages().is_none());
        assert!(!cache.is_fetching());
    }

    #[tokio::test]
    async fn test_retrigger_after_error_resets_tracker() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/messages"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(
                {"id": 3, "role": "assistant", "content": "ok"}
            )))
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri());
        let mut cache = MessageCache::new();
        let mut tracker = SubmitTracker::new();

        tracker.trigger("first".to_string(), &api);
        settle_tracker(&mut tracker, &mut cache).await;
        assert_eq!(tracker.status(), SubmitStatus::Error);

        tracker.trigger("second".to_string(), &api);
        assert!(tracker.error().is_none());
        assert_eq!(tracker.input(), Some("second"));

        settle_tracker(&mut tracker, &mut cache).await;
        assert_eq!(tracker.status(), SubmitStatus::Success);
    }
}
