//! Observable per-operation state and retry configuration.
//!
//! # Design
//! Each operation publishes its lifecycle through a `SharedState`, a
//! single-threaded `Rc<RefCell<_>>` cell. Observers hold clones of the handle
//! and can read the state while the operation's future is still running.
//! A `Pending` state doubles as the single-flight marker: `start` refuses to
//! begin a second run while one is in flight. The `InFlight` guard returned
//! by `start` rolls the state back if the future is dropped before it
//! settles.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::RequestError;

/// Lifecycle of one read or write operation.
///
/// `Pending` keeps the data from the previous success, if any, so a refetch
/// can keep showing it while the new request is in flight.
#[derive(Debug, Clone)]
pub enum OperationState<T> {
    Idle,
    Pending { previous: Option<T> },
    Success(T),
    Error(Rc<RequestError>),
}

impl<T> Default for OperationState<T> {
    fn default() -> Self {
        OperationState::Idle
    }
}

impl<T> OperationState<T> {
    pub fn is_idle(&self) -> bool {
        matches!(self, OperationState::Idle)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, OperationState::Pending { .. })
    }

    /// In flight with nothing to show yet.
    pub fn is_loading(&self) -> bool {
        matches!(self, OperationState::Pending { previous: None })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OperationState::Success(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, OperationState::Error(_))
    }

    /// Latest successful data, including what a pending refetch is holding on to.
    pub fn data(&self) -> Option<&T> {
        match self {
            OperationState::Success(data) => Some(data),
            OperationState::Pending { previous } => previous.as_ref(),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&RequestError> {
        match self {
            OperationState::Error(err) => Some(&**err),
            _ => None,
        }
    }

    /// Move to `Pending`, carrying forward data from a previous success.
    pub(crate) fn begin(&mut self) {
        let previous = match std::mem::take(self) {
            OperationState::Success(data) => Some(data),
            OperationState::Pending { previous } => previous,
            OperationState::Idle | OperationState::Error(_) => None,
        };
        *self = OperationState::Pending { previous };
    }

    pub(crate) fn settle(&mut self, result: Result<T, RequestError>) {
        *self = match result {
            Ok(data) => OperationState::Success(data),
            Err(err) => OperationState::Error(Rc::new(err)),
        };
    }

    /// Undo `begin` for a run whose result will never arrive.
    pub(crate) fn abandon(&mut self) {
        *self = match std::mem::take(self) {
            OperationState::Pending { previous: Some(data) } => OperationState::Success(data),
            OperationState::Pending { previous: None } => OperationState::Idle,
            settled => settled,
        };
    }

    pub(crate) fn reset(&mut self) {
        *self = OperationState::Idle;
    }

    pub fn label(&self) -> &'static str {
        match self {
            OperationState::Idle => "idle",
            OperationState::Pending { .. } => "pending",
            OperationState::Success(_) => "success",
            OperationState::Error(_) => "error",
        }
    }
}

/// Shared handle to an operation's state. Clones observe the same cell.
#[derive(Debug)]
pub struct SharedState<T> {
    inner: Rc<RefCell<OperationState<T>>>,
}

impl<T> Clone for SharedState<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Default for SharedState<T> {
    fn default() -> Self {
        Self {
            inner: Rc::new(RefCell::new(OperationState::Idle)),
        }
    }
}

impl<T> SharedState<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the current state without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&OperationState<T>) -> R) -> R {
        f(&*self.inner.borrow())
    }

    pub fn is_pending(&self) -> bool {
        self.with(OperationState::is_pending)
    }

    pub fn label(&self) -> &'static str {
        self.with(OperationState::label)
    }

    pub(crate) fn update(&self, f: impl FnOnce(&mut OperationState<T>)) {
        f(&mut *self.inner.borrow_mut());
    }

    /// Enter `Pending` unless a run is already in flight.
    pub(crate) fn start(&self) -> Option<InFlight<'_, T>> {
        if self.is_pending() {
            return None;
        }
        self.update(OperationState::begin);
        Some(InFlight {
            state: self,
            settled: false,
        })
    }
}

impl<T: Clone> SharedState<T> {
    /// Copy of the current state.
    pub fn get(&self) -> OperationState<T> {
        self.inner.borrow().clone()
    }
}

/// One running operation. Dropping it unsettled rolls `Pending` back.
pub(crate) struct InFlight<'a, T> {
    state: &'a SharedState<T>,
    settled: bool,
}

impl<T> InFlight<'_, T> {
    pub(crate) fn finish(mut self, result: Result<T, RequestError>) {
        self.state.update(|state| state.settle(result));
        self.settled = true;
    }
}

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        if !self.settled {
            self.state.update(OperationState::abandon);
        }
    }
}

/// How many times a failed operation is re-attempted. Retries are immediate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    pub max_retries: u32,
}

impl RetryPolicy {
    pub const fn none() -> Self {
        Self { max_retries: 0 }
    }

    pub const fn times(max_retries: u32) -> Self {
        Self { max_retries }
    }

    pub fn should_retry(&self, failed_attempts: u32) -> bool {
        failed_attempts > 0 && failed_attempts <= self.max_retries
    }
}

/// Read-operation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryConfig {
    pub retry: RetryPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    fn api_error() -> RequestError {
        RequestError::Api(ApiError::Status {
            status: 503,
            status_text: "Service Unavailable".to_string(),
        })
    }

    #[test]
    fn first_load_is_loading() {
        let mut state: OperationState<u32> = OperationState::Idle;
        state.begin();
        assert!(state.is_pending());
        assert!(state.is_loading());
        assert!(state.data().is_none());
    }

    #[test]
    fn refetch_keeps_previous_data() {
        let mut state = OperationState::Success(7u32);
        state.begin();
        assert!(state.is_pending());
        assert!(!state.is_loading());
        assert_eq!(state.data(), Some(&7));
    }

    #[test]
    fn refetch_after_error_starts_empty() {
        let mut state: OperationState<u32> = OperationState::Error(Rc::new(api_error()));
        state.begin();
        assert!(state.is_loading());
    }

    #[test]
    fn settle_records_outcome() {
        let mut state: OperationState<u32> = OperationState::Idle;
        state.begin();
        state.settle(Err(api_error()));
        assert!(state.is_error());
        assert_eq!(state.error().unwrap().to_string(), "API error: 503 Service Unavailable");

        state.begin();
        state.settle(Ok(3));
        assert!(state.is_success());
        assert_eq!(state.data(), Some(&3));
        assert_eq!(state.label(), "success");
    }

    #[test]
    fn abandon_restores_previous_data_or_idle() {
        let mut state = OperationState::Success(5u32);
        state.begin();
        state.abandon();
        assert_eq!(state.data(), Some(&5));
        assert!(state.is_success());

        let mut state: OperationState<u32> = OperationState::Idle;
        state.begin();
        state.abandon();
        assert!(state.is_idle());
    }

    #[test]
    fn start_is_single_flight() {
        let shared: SharedState<u32> = SharedState::new();
        let observer = shared.clone();

        let flight = shared.start().unwrap();
        assert!(observer.is_pending());
        assert!(shared.start().is_none());

        flight.finish(Ok(1));
        assert!(observer.get().is_success());
        assert!(shared.start().is_some());
    }

    #[test]
    fn dropped_flight_rolls_back() {
        let shared: SharedState<u32> = SharedState::new();
        let flight = shared.start().unwrap();
        drop(flight);
        assert!(shared.get().is_idle());
    }

    #[test]
    fn no_retry_policy_never_retries() {
        let policy = RetryPolicy::none();
        assert!(!policy.should_retry(1));
        assert_eq!(QueryConfig::default().retry, policy);
    }

    #[test]
    fn bounded_retry_policy() {
        let policy = RetryPolicy::times(2);
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
    }
}
