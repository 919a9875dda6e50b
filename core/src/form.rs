//! Create-item form: input, validation and submission.
//!
//! # Design
//! The form is a two-phase state machine, `Editing` and `Submitting`.
//! Validation runs before any request is built, so an invalid submission
//! never reaches the transport. On success the fields are cleared; on
//! failure they are kept and the error message is held for display next to
//! the submit control.
//!
//! Fields live in cells so the form can be read and rendered while a
//! `submit` future is still running. A submit issued while another is in
//! flight is refused with `SubmitOutcome::Busy`. Dropping an unfinished
//! submit puts the form back into `Editing`.

use std::cell::{Cell, RefCell};
use std::fmt;

use tracing::debug;

use crate::cache::QueryCache;
use crate::error::ValidationError;
use crate::http::Transport;
use crate::items::{CreateItemMutation, ItemsApi};
use crate::state::{OperationState, SharedState};
use crate::types::{Item, ItemCreate};

pub const NAME_REQUIRED: &str = "Name is required";

const SUBMIT_LABEL: &str = "Create item";
const SUBMITTING_LABEL: &str = "Creating...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormPhase {
    #[default]
    Editing,
    Submitting,
}

/// Result of one `submit` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Validation failed; nothing was sent.
    Rejected(ValidationError),
    Created(Item),
    /// The create call failed; carries the message shown to the user.
    Failed(String),
    /// A submission is already in flight; nothing was sent.
    Busy,
}

#[derive(Debug, Default)]
pub struct CreateItemForm {
    name: RefCell<String>,
    description: RefCell<String>,
    phase: Cell<FormPhase>,
    name_error: RefCell<Option<ValidationError>>,
    submit_error: RefCell<Option<String>>,
    mutation: CreateItemMutation,
}

/// Holds the form in `Submitting` for as long as it lives.
struct Submitting<'a> {
    phase: &'a Cell<FormPhase>,
}

impl<'a> Submitting<'a> {
    fn enter(phase: &'a Cell<FormPhase>) -> Self {
        phase.set(FormPhase::Submitting);
        Self { phase }
    }
}

impl Drop for Submitting<'_> {
    fn drop(&mut self) {
        self.phase.set(FormPhase::Editing);
    }
}

impl CreateItemForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> String {
        self.name.borrow().clone()
    }

    pub fn description(&self) -> String {
        self.description.borrow().clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        *self.name.borrow_mut() = name.into();
    }

    pub fn set_description(&self, description: impl Into<String>) {
        *self.description.borrow_mut() = description.into();
    }

    pub fn phase(&self) -> FormPhase {
        self.phase.get()
    }

    pub fn name_error(&self) -> Option<ValidationError> {
        self.name_error.borrow().clone()
    }

    pub fn submit_error(&self) -> Option<String> {
        self.submit_error.borrow().clone()
    }

    pub fn mutation_state(&self) -> OperationState<Item> {
        self.mutation.state()
    }

    pub fn watch_mutation(&self) -> SharedState<Item> {
        self.mutation.watch()
    }

    pub fn is_submit_disabled(&self) -> bool {
        self.phase.get() == FormPhase::Submitting
    }

    pub fn submit_label(&self) -> &'static str {
        match self.phase.get() {
            FormPhase::Editing => SUBMIT_LABEL,
            FormPhase::Submitting => SUBMITTING_LABEL,
        }
    }

    /// Check the current input and build the create payload.
    ///
    /// The name is sent trimmed. An empty description is sent as absent.
    pub fn validate(&self) -> Result<ItemCreate, ValidationError> {
        let name = self.name.borrow().trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::new("name", NAME_REQUIRED));
        }
        let description = Some(self.description.borrow().clone()).filter(|d| !d.is_empty());
        Ok(ItemCreate { name, description })
    }

    pub async fn submit<T: Transport>(&self, api: &ItemsApi<T>, cache: &QueryCache) -> SubmitOutcome {
        if self.is_submit_disabled() {
            debug!("create form already submitting");
            return SubmitOutcome::Busy;
        }
        let input = match self.validate() {
            Ok(input) => input,
            Err(err) => {
                debug!(field = err.field, "create form rejected");
                *self.name_error.borrow_mut() = Some(err.clone());
                return SubmitOutcome::Rejected(err);
            }
        };
        *self.name_error.borrow_mut() = None;
        *self.submit_error.borrow_mut() = None;

        let submitting = Submitting::enter(&self.phase);
        let outcome = match self.mutation.mutate(api, cache, &input).await {
            OperationState::Success(item) => SubmitOutcome::Created(item),
            OperationState::Error(err) => SubmitOutcome::Failed(err.to_string()),
            OperationState::Pending { .. } | OperationState::Idle => SubmitOutcome::Busy,
        };
        drop(submitting);

        match &outcome {
            SubmitOutcome::Created(_) => {
                self.name.borrow_mut().clear();
                self.description.borrow_mut().clear();
            }
            SubmitOutcome::Failed(message) => *self.submit_error.borrow_mut() = Some(message.clone()),
            SubmitOutcome::Rejected(_) | SubmitOutcome::Busy => {}
        }
        outcome
    }

    /// Plain-text rendering of the form.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CreateItemForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name: {}", self.name.borrow())?;
        if let Some(err) = &*self.name_error.borrow() {
            writeln!(f, "  {err}")?;
        }
        writeln!(f, "Description: {}", self.description.borrow())?;
        let marker = if self.is_submit_disabled() { " (disabled)" } else { "" };
        writeln!(f, "[{}]{marker}", self.submit_label())?;
        if let Some(message) = &*self.submit_error.borrow() {
            writeln!(f, "{message}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::future::Future;
    use std::pin::{pin, Pin};
    use std::task::Poll;

    use super::*;
    use crate::cache::QueryKey;
    use crate::client::ApiClient;
    use crate::error::TransportError;
    use crate::http::{HttpRequest, HttpResponse};
    use crate::types::ItemListResponse;

    #[derive(Default)]
    struct StubTransport {
        responses: RefCell<VecDeque<HttpResponse>>,
        calls: Cell<usize>,
        last_body: RefCell<Option<String>>,
    }

    impl StubTransport {
        fn respond(&self, status: u16, status_text: &str, body: &str) {
            self.responses.borrow_mut().push_back(HttpResponse {
                status,
                status_text: status_text.to_string(),
                headers: Vec::new(),
                body: body.to_string(),
            });
        }
    }

    impl Transport for StubTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.calls.set(self.calls.get() + 1);
            *self.last_body.borrow_mut() = request.body;
            self.responses
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| "no response queued".into())
        }
    }

    /// Accepts a request and never answers it.
    #[derive(Default)]
    struct SilentTransport {
        calls: Cell<usize>,
    }

    impl Transport for SilentTransport {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.calls.set(self.calls.get() + 1);
            std::future::pending().await
        }
    }

    /// Poll `future` exactly once.
    async fn poll_once<F: Future>(future: Pin<&mut F>) -> Poll<F::Output> {
        let mut future = Some(future);
        std::future::poll_fn(|cx| {
            let polled = future.take().map(|f| f.poll(cx));
            Poll::Ready(polled.unwrap_or(Poll::Pending))
        })
        .await
    }

    const CREATED: &str = r#"{"id":"123","name":"New Item","description":null,"created_at":"2024-01-01T00:00:00Z","updated_at":"2024-01-01T00:00:00Z"}"#;

    fn api(transport: &StubTransport) -> ItemsApi<&StubTransport> {
        ItemsApi::new(ApiClient::new("http://localhost:8000"), transport)
    }

    #[tokio::test]
    async fn blank_names_are_rejected_without_a_request() {
        let transport = StubTransport::default();
        let api = api(&transport);
        let cache = QueryCache::new();

        for name in ["", " ", "\t\n", "   "] {
            let form = CreateItemForm::new();
            form.set_name(name);
            form.set_description("ignored");
            let outcome = form.submit(&api, &cache).await;
            assert_eq!(
                outcome,
                SubmitOutcome::Rejected(ValidationError::new("name", NAME_REQUIRED))
            );
            assert_eq!(form.name_error().unwrap().message, "Name is required");
            assert_eq!(form.phase(), FormPhase::Editing);
            assert_eq!(form.description(), "ignored");
        }
        assert_eq!(transport.calls.get(), 0);
    }

    #[tokio::test]
    async fn success_clears_fields_and_invalidates_list() {
        let transport = StubTransport::default();
        transport.respond(201, "Created", CREATED);
        let api = api(&transport);
        let cache = QueryCache::new();
        cache
            .store(QueryKey::Items, &ItemListResponse { items: Vec::new(), total: 0 })
            .unwrap();

        let form = CreateItemForm::new();
        form.set_name("New Item");
        let outcome = form.submit(&api, &cache).await;

        assert!(matches!(outcome, SubmitOutcome::Created(ref item) if item.id == "123"));
        assert_eq!(form.name(), "");
        assert_eq!(form.description(), "");
        assert_eq!(form.phase(), FormPhase::Editing);
        assert!(!form.is_submit_disabled());
        assert_eq!(cache.is_stale(QueryKey::Items), Some(true));

        let body: serde_json::Value =
            serde_json::from_str(transport.last_body.borrow().as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({ "name": "New Item" }));
    }

    #[tokio::test]
    async fn api_failure_keeps_fields_and_shows_message() {
        let transport = StubTransport::default();
        transport.respond(500, "Internal Server Error", "");
        let api = api(&transport);
        let cache = QueryCache::new();

        let form = CreateItemForm::new();
        form.set_name("Fail Item");
        form.set_description("kept");
        let outcome = form.submit(&api, &cache).await;

        assert_eq!(
            outcome,
            SubmitOutcome::Failed("API error: 500 Internal Server Error".to_string())
        );
        assert_eq!(
            form.submit_error().as_deref(),
            Some("API error: 500 Internal Server Error")
        );
        assert_eq!(form.name(), "Fail Item");
        assert_eq!(form.description(), "kept");
        assert_eq!(form.phase(), FormPhase::Editing);
        assert!(form.render().contains("API error: 500 Internal Server Error"));
    }

    #[tokio::test]
    async fn resubmit_after_validation_error_clears_it() {
        let transport = StubTransport::default();
        transport.respond(201, "Created", CREATED);
        let api = api(&transport);
        let cache = QueryCache::new();

        let form = CreateItemForm::new();
        form.submit(&api, &cache).await;
        assert!(form.name_error().is_some());

        form.set_name("  New Item  ");
        form.submit(&api, &cache).await;
        assert!(form.name_error().is_none());

        let body: serde_json::Value =
            serde_json::from_str(transport.last_body.borrow().as_deref().unwrap()).unwrap();
        assert_eq!(body["name"], "New Item");
    }

    #[test]
    fn validate_sends_non_empty_description() {
        let form = CreateItemForm::new();
        form.set_name("Named");
        form.set_description("Described");
        let input = form.validate().unwrap();
        assert_eq!(input.description.as_deref(), Some("Described"));
    }

    #[test]
    fn render_shows_field_error_and_submit_label() {
        let form = CreateItemForm::new();
        *form.name_error.borrow_mut() = Some(ValidationError::new("name", NAME_REQUIRED));
        let text = form.render();
        assert!(text.contains("Name is required"));
        assert!(text.contains("[Create item]"));
        assert!(!text.contains("(disabled)"));
    }

    #[tokio::test]
    async fn second_submit_while_in_flight_is_busy() {
        let transport = SilentTransport::default();
        let api = ItemsApi::new(ApiClient::new("http://localhost:8000"), &transport);
        let cache = QueryCache::new();
        let form = CreateItemForm::new();
        form.set_name("Slow Item");

        let mut first = pin!(form.submit(&api, &cache));
        assert!(poll_once(first.as_mut()).await.is_pending());
        assert_eq!(form.phase(), FormPhase::Submitting);
        assert_eq!(form.submit_label(), "Creating...");
        assert!(form.render().contains("[Creating...] (disabled)"));
        assert!(form.mutation_state().is_loading());

        assert_eq!(form.submit(&api, &cache).await, SubmitOutcome::Busy);
        assert_eq!(transport.calls.get(), 1);
    }

    #[tokio::test]
    async fn dropped_submit_returns_to_editing() {
        let transport = SilentTransport::default();
        let api = ItemsApi::new(ApiClient::new("http://localhost:8000"), &transport);
        let cache = QueryCache::new();
        let form = CreateItemForm::new();
        form.set_name("Abandoned");

        {
            let mut submit = pin!(form.submit(&api, &cache));
            assert!(poll_once(submit.as_mut()).await.is_pending());
            assert!(form.is_submit_disabled());
        }

        assert_eq!(form.phase(), FormPhase::Editing);
        assert_eq!(form.submit_label(), "Create item");
        assert!(form.mutation_state().is_idle());
        assert_eq!(form.name(), "Abandoned");
    }
}
