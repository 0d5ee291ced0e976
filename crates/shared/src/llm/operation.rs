//! Single-flight async operation state for assistant widgets.
//!
//! An [`Operation`] allows one request at a time. Each `begin` hands out a
//! [`Ticket`]; only the current ticket may complete the operation, so a
//! response that arrives after a cancel or remount is dropped.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationState<T, E> {
    Idle,
    Loading,
    Success(T),
    Failure(E),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OperationError {
    #[error("an operation is already in flight")]
    AlreadyInFlight,
    #[error("operation was cancelled")]
    Cancelled,
    #[error("operation result is stale")]
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
}

impl Ticket {
    pub const fn generation(self) -> u64 {
        self.generation
    }
}

struct InFlight {
    generation: u64,
    cancel: CancellationToken,
}

struct Inner<T, E> {
    state: OperationState<T, E>,
    generation: u64,
    in_flight: Option<InFlight>,
    last_success: Option<T>,
}

pub struct Operation<T, E> {
    inner: Arc<Mutex<Inner<T, E>>>,
}

impl<T, E> Clone for Operation<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, E> Default for Operation<T, E>
where
    T: Clone,
    E: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> Operation<T, E>
where
    T: Clone,
    E: Clone,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: OperationState::Idle,
                generation: 0,
                in_flight: None,
                last_success: None,
            })),
        }
    }

    pub fn begin(&self) -> Result<Ticket, OperationError> {
        self.begin_with_token().map(|(ticket, _)| ticket)
    }

    fn begin_with_token(&self) -> Result<(Ticket, CancellationToken), OperationError> {
        let mut inner = self.lock();
        if inner.in_flight.is_some() {
            return Err(OperationError::AlreadyInFlight);
        }

        let generation = inner.generation.wrapping_add(1);
        let cancel = CancellationToken::new();
        inner.generation = generation;
        inner.in_flight = Some(InFlight {
            generation,
            cancel: cancel.clone(),
        });
        inner.state = OperationState::Loading;

        Ok((Ticket { generation }, cancel))
    }

    /// Applies `result` if `ticket` is still the in-flight request.
    pub fn complete(&self, ticket: Ticket, result: Result<T, E>) -> Result<(), OperationError> {
        let mut inner = self.lock();
        let current = inner.in_flight.as_ref().map(|in_flight| in_flight.generation);
        if current != Some(ticket.generation) {
            return Err(OperationError::Stale);
        }

        inner.in_flight = None;
        inner.state = match result {
            Ok(value) => {
                inner.last_success = Some(value.clone());
                OperationState::Success(value)
            }
            Err(err) => OperationState::Failure(err),
        };

        Ok(())
    }

    /// Returns to `Idle` and invalidates the in-flight ticket. No-op when idle.
    pub fn cancel(&self) {
        let mut inner = self.lock();
        if let Some(in_flight) = inner.in_flight.take() {
            inner.state = OperationState::Idle;
            in_flight.cancel.cancel();
        }
    }

    /// Drives `future` as one operation, racing it against [`Self::cancel`].
    pub async fn run<F>(&self, future: F) -> Result<Result<T, E>, OperationError>
    where
        F: Future<Output = Result<T, E>>,
    {
        let (ticket, cancel) = self.begin_with_token()?;
        let _release = RunGuard {
            operation: self,
            ticket,
        };

        tokio::select! {
            result = future => {
                self.complete(ticket, result.clone())?;
                Ok(result)
            }
            _ = cancel.cancelled() => Err(OperationError::Cancelled),
        }
    }

    // Clears `ticket` if it is still in flight; no-op once completed or cancelled.
    fn release(&self, ticket: Ticket) {
        let mut inner = self.lock();
        let current = inner.in_flight.as_ref().map(|in_flight| in_flight.generation);
        if current != Some(ticket.generation) {
            return;
        }
        if let Some(in_flight) = inner.in_flight.take() {
            inner.state = OperationState::Idle;
            in_flight.cancel.cancel();
        }
    }

    pub fn state(&self) -> OperationState<T, E> {
        self.lock().state.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().in_flight.is_some()
    }

    /// Most recent successful value, kept across later failures.
    pub fn last_success(&self) -> Option<T> {
        self.lock().last_success.clone()
    }

    pub fn reset(&self) {
        self.cancel();
        let mut inner = self.lock();
        inner.state = OperationState::Idle;
        inner.last_success = None;
    }

    /// Ties the operation to a mount scope: dropping the scope cancels any
    /// in-flight request.
    pub fn mount(&self) -> MountScope<T, E> {
        MountScope {
            operation: self.clone(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T, E>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the ticket when a `run` future is dropped before it settles.
struct RunGuard<'a, T, E>
where
    T: Clone,
    E: Clone,
{
    operation: &'a Operation<T, E>,
    ticket: Ticket,
}

impl<T, E> Drop for RunGuard<'_, T, E>
where
    T: Clone,
    E: Clone,
{
    fn drop(&mut self) {
        self.operation.release(self.ticket);
    }
}

pub struct MountScope<T, E>
where
    T: Clone,
    E: Clone,
{
    operation: Operation<T, E>,
}

impl<T, E> MountScope<T, E>
where
    T: Clone,
    E: Clone,
{
    pub fn operation(&self) -> &Operation<T, E> {
        &self.operation
    }
}

impl<T, E> Drop for MountScope<T, E>
where
    T: Clone,
    E: Clone,
{
    fn drop(&mut self) {
        self.operation.cancel();
    }
}
