//! Screen-level workflows.
//!
//! Each flow owns the local state of one view (lists, drafts, editor
//! dialogs, field errors) and talks to the backend through `ApiClient`.
//! Every async operation takes a `ViewScope`; once the scope is cancelled
//! the request is dropped and no state is touched afterwards.

pub mod auth;
pub mod classes;
pub mod faculty;
pub mod feedback;
mod list;
pub mod profile;
pub mod subjects;

pub use list::Keyed;

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::api::{ApiClient, ApiError, ApiResult, FieldErrors};
use crate::models::{Faculty, Role, Student};
use crate::session::SessionError;

#[derive(Debug, Error)]
pub enum FlowError {
    /// Local validation failed; nothing was sent
    #[error("{0}")]
    Validation(FieldErrors),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Another request is still in progress")]
    Busy,

    #[error("Cancelled")]
    Cancelled,

    #[error("Sign in as {0} first")]
    NotSignedIn(Role),

    #[error("Nothing is waiting for confirmation")]
    NothingPending,

    #[error("No editor is open")]
    NoEditor,
}

impl FlowError {
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            FlowError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<FieldErrors> for FlowError {
    fn from(errors: FieldErrors) -> Self {
        FlowError::Validation(errors)
    }
}

pub type FlowResult<T> = Result<T, FlowError>;

/// Outcome of an editor submit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Saved {
    Created,
    Updated,
}

// -------------------------------------------------------------------------
// In-flight flags
// -------------------------------------------------------------------------

/// "A request for this trigger is running". Set by `try_begin`, cleared
/// when the returned guard drops, on every exit path.
#[derive(Debug, Clone, Default)]
pub struct InFlight(Arc<AtomicBool>);

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// None if a request is already running
    pub fn try_begin(&self) -> Option<InFlightGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(self.0.clone()))
    }

    /// Like `try_begin`, as a flow error
    pub fn begin(&self) -> FlowResult<InFlightGuard> {
        self.try_begin().ok_or(FlowError::Busy)
    }

    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[must_use = "the flag clears as soon as the guard is dropped"]
#[derive(Debug)]
pub struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// -------------------------------------------------------------------------
// View scope
// -------------------------------------------------------------------------

/// Lifetime of a view. Cancel it when the view goes away.
#[derive(Debug, Clone, Default)]
pub struct ViewScope {
    token: CancellationToken,
}

impl ViewScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// A scope cancelled together with this one, or on its own
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Drive `fut` unless the scope is cancelled first
    pub async fn run<F: Future>(&self, fut: F) -> FlowResult<F::Output> {
        if self.is_cancelled() {
            return Err(FlowError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(FlowError::Cancelled),
            output = fut => Ok(output),
        }
    }

    /// `run` for a backend call
    pub async fn call<T>(&self, fut: impl Future<Output = ApiResult<T>>) -> FlowResult<T> {
        Ok(self.run(fut).await??)
    }
}

// -------------------------------------------------------------------------
// Session lookups shared by the flows
// -------------------------------------------------------------------------

pub(crate) fn require_student(api: &ApiClient) -> FlowResult<Student> {
    api.session()
        .student()
        .ok_or(FlowError::NotSignedIn(Role::Student))
}

pub(crate) fn require_faculty(api: &ApiClient) -> FlowResult<Faculty> {
    api.session()
        .faculty()
        .ok_or(FlowError::NotSignedIn(Role::Faculty))
}
