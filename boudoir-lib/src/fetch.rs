//! Remote data state for one view.
//!
//! Each view owns a [`FetchController`]. Starting a fetch hands out a
//! [`FetchTicket`]; starting another cancels the previous ticket, and a
//! result delivered with a stale ticket is dropped, so the last request
//! issued always wins. A failure keeps the previously loaded data and
//! leaves a toast message for the UI.

use tokio_util::sync::CancellationToken;

/// Where a view's data stands.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState<T> {
    Idle,
    Loading,
    Success(T),
    Error(String),
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T> FetchState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// Handle for one in-flight request.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    generation: u64,
    token: CancellationToken,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Cancelled when a newer fetch starts or the view resets.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Last-request-wins state machine.
///
/// # Example
///
/// ```
/// use boudoir_lib::fetch::{FetchController, FetchState};
///
/// let mut fetch: FetchController<Vec<u32>> = FetchController::new();
/// let first = fetch.begin();
/// let second = fetch.begin();
/// assert!(first.is_cancelled());
///
/// assert!(!fetch.finish(&first, Ok::<_, String>(vec![1])));
/// assert!(fetch.finish(&second, Ok::<_, String>(vec![2])));
/// assert_eq!(fetch.state(), &FetchState::Success(vec![2]));
/// ```
#[derive(Debug)]
pub struct FetchController<T> {
    state: FetchState<T>,
    /// Data of the last success while a newer fetch is loading or failed.
    previous: Option<T>,
    generation: u64,
    token: Option<CancellationToken>,
    toast: Option<String>,
}

impl<T> Default for FetchController<T> {
    fn default() -> Self {
        Self {
            state: FetchState::Idle,
            previous: None,
            generation: 0,
            token: None,
            toast: None,
        }
    }
}

impl<T> FetchController<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FetchState<T> {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    /// Data to display: the current success, else the last one.
    pub fn data(&self) -> Option<&T> {
        match &self.state {
            FetchState::Success(data) => Some(data),
            _ => self.previous.as_ref(),
        }
    }

    /// Starts a fetch, cancelling the one in flight.
    pub fn begin(&mut self) -> FetchTicket {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
        if let FetchState::Success(data) = std::mem::replace(&mut self.state, FetchState::Loading) {
            self.previous = Some(data);
        }
        self.generation += 1;
        let token = CancellationToken::new();
        self.token = Some(token.clone());
        FetchTicket {
            generation: self.generation,
            token,
        }
    }

    /// Delivers a result. Returns `false` when the ticket is stale and the
    /// result was dropped.
    pub fn finish<E: std::fmt::Display>(&mut self, ticket: &FetchTicket, result: Result<T, E>) -> bool {
        if ticket.generation != self.generation || ticket.is_cancelled() {
            log::debug!("Dropping stale fetch result (generation {})", ticket.generation);
            return false;
        }
        self.token = None;
        match result {
            Ok(data) => {
                self.previous = None;
                self.state = FetchState::Success(data);
            }
            Err(e) => {
                let message = e.to_string();
                log::warn!("Fetch failed: {}", message);
                self.toast = Some(message.clone());
                self.state = FetchState::Error(message);
            }
        }
        true
    }

    /// Cancels any in-flight fetch and returns to `Idle`. Loaded data
    /// stays available through [`data`](Self::data).
    pub fn reset(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
        self.generation += 1;
        if let FetchState::Success(data) = std::mem::take(&mut self.state) {
            self.previous = Some(data);
        }
    }

    /// Pending toast message, cleared once taken.
    pub fn take_toast(&mut self) -> Option<String> {
        self.toast.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_flow() {
        let mut fetch = FetchController::new();
        assert_eq!(fetch.state(), &FetchState::Idle);

        let ticket = fetch.begin();
        assert!(fetch.is_loading());
        assert!(fetch.finish(&ticket, Ok::<_, String>(3)));
        assert_eq!(fetch.data(), Some(&3));
        assert!(fetch.take_toast().is_none());
    }

    #[test]
    fn test_error_keeps_previous_data_and_raises_toast() {
        let mut fetch = FetchController::new();
        let ticket = fetch.begin();
        fetch.finish(&ticket, Ok::<_, String>(vec!["a"]));

        let ticket = fetch.begin();
        assert_eq!(fetch.data(), Some(&vec!["a"]));
        fetch.finish(&ticket, Err::<Vec<&str>, _>("HTTP 500: boom"));

        assert_eq!(fetch.state().error(), Some("HTTP 500: boom"));
        assert_eq!(fetch.data(), Some(&vec!["a"]));
        assert_eq!(fetch.take_toast().as_deref(), Some("HTTP 500: boom"));
        assert!(fetch.take_toast().is_none());
    }

    #[test]
    fn test_last_request_wins() {
        let mut fetch = FetchController::new();
        let old = fetch.begin();
        let new = fetch.begin();

        assert!(old.is_cancelled());
        assert!(!new.is_cancelled());
        assert!(fetch.finish(&new, Ok::<_, String>("new")));
        assert!(!fetch.finish(&old, Ok::<_, String>("old")));
        assert_eq!(fetch.data(), Some(&"new"));
    }

    #[test]
    fn test_reset_cancels_in_flight() {
        let mut fetch = FetchController::new();
        let done = fetch.begin();
        fetch.finish(&done, Ok::<_, String>(1));

        let ticket = fetch.begin();
        fetch.reset();
        assert!(ticket.is_cancelled());
        assert_eq!(fetch.state(), &FetchState::Idle);
        assert_eq!(fetch.data(), Some(&1));
        assert!(!fetch.finish(&ticket, Ok::<_, String>(2)));
    }
}
