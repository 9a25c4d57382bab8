//! Client-side session state.
//!
//! The store is the single owner of "who is signed in". It starts in
//! `Loading`, restores synchronously from storage, and changes only through
//! the named transitions below. Observers subscribe to a watch channel.

mod storage;

pub use storage::{FileStorage, MemoryStorage, SessionStorage, StorageError};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::models::{Faculty, Role, Student};

/// Who the session belongs to. Exactly one role per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "profile", rename_all = "lowercase")]
pub enum Identity {
    Student(Student),
    Faculty(Faculty),
}

impl Identity {
    pub fn role(&self) -> Role {
        match self {
            Identity::Student(_) => Role::Student,
            Identity::Faculty(_) => Role::Faculty,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Identity::Student(student) => &student.name,
            Identity::Faculty(faculty) => faculty.display_name(),
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Identity::Student(student) => &student.email,
            Identity::Faculty(faculty) => &faculty.email,
        }
    }
}

/// An authenticated session; also the persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub identity: Identity,
    pub fully_registered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Storage has not been read yet
    Loading,
    Anonymous,
    /// A login or registration request is in flight. Never persisted.
    Authenticating,
    Active(Session),
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Active(session) => Some(session),
            _ => None,
        }
    }

    pub fn student(&self) -> Option<&Student> {
        match self.session().map(|s| &s.identity) {
            Some(Identity::Student(student)) => Some(student),
            _ => None,
        }
    }

    pub fn faculty(&self) -> Option<&Faculty> {
        match self.session().map(|s| &s.identity) {
            Some(Identity::Faculty(faculty)) => Some(faculty),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.session().map(|s| s.identity.role())
    }

    pub fn is_fully_registered(&self) -> bool {
        self.session().map(|s| s.fully_registered).unwrap_or(false)
    }

    /// True while no guard decision should be made
    pub fn is_pending(&self) -> bool {
        matches!(self, SessionState::Loading | SessionState::Authenticating)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Not signed in")]
    NoSession,

    #[error("Signed in, but not as {expected}")]
    WrongRole { expected: Role },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub struct SessionStore {
    storage: Box<dyn SessionStorage>,
    state: watch::Sender<SessionState>,
    /// State to return to if an authentication attempt is abandoned.
    /// Its lock also serializes transitions.
    suspended: Mutex<Option<SessionState>>,
}

impl SessionStore {
    /// A store in the `Loading` state. Call [`restore`](Self::restore) next.
    pub fn new(storage: impl SessionStorage + 'static) -> Self {
        let (state, _) = watch::channel(SessionState::Loading);
        Self {
            storage: Box::new(storage),
            state,
            suspended: Mutex::new(None),
        }
    }

    /// Build and restore in one step
    pub fn restored(storage: impl SessionStorage + 'static) -> Self {
        let store = Self::new(storage);
        store.restore();
        store
    }

    /// Read the persisted session. A corrupt record is erased; a failed read
    /// leaves the record in place. Either way the store comes up anonymous.
    pub fn restore(&self) {
        let _guard = self.suspended.lock();
        let next = match self.storage.load() {
            Ok(Some(session)) => {
                debug!(role = %session.identity.role(), "Restored session");
                SessionState::Active(session)
            }
            Ok(None) => SessionState::Anonymous,
            Err(e @ StorageError::Corrupt(_)) => {
                warn!(error = %e, "Discarding unreadable session");
                if let Err(e) = self.storage.clear() {
                    warn!(error = %e, "Failed to erase unreadable session");
                }
                SessionState::Anonymous
            }
            Err(e) => {
                warn!(error = %e, "Could not read stored session");
                SessionState::Anonymous
            }
        };
        self.state.send_replace(next);
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        matches!(*self.state.borrow(), SessionState::Loading)
    }

    pub fn student(&self) -> Option<Student> {
        self.state.borrow().student().cloned()
    }

    pub fn faculty(&self) -> Option<Faculty> {
        self.state.borrow().faculty().cloned()
    }

    pub fn is_fully_registered(&self) -> bool {
        self.state.borrow().is_fully_registered()
    }

    pub fn token(&self) -> Option<String> {
        self.state
            .borrow()
            .session()
            .and_then(|s| s.token.clone())
    }

    pub fn begin_authentication(&self) {
        let mut suspended = self.suspended.lock();
        let previous = self.state.send_replace(SessionState::Authenticating);
        if previous != SessionState::Authenticating {
            *suspended = Some(previous);
        }
    }

    /// Return to whatever was active before `begin_authentication`
    pub fn abort_authentication(&self) {
        let mut suspended = self.suspended.lock();
        if *self.state.borrow() != SessionState::Authenticating {
            return;
        }
        let previous = suspended.take().unwrap_or(SessionState::Anonymous);
        self.state.send_replace(previous);
    }

    /// Enter a student session. Any faculty session is replaced.
    pub fn login_student(
        &self,
        student: Student,
        fully_registered: bool,
        token: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.establish(Session {
            identity: Identity::Student(student),
            fully_registered,
            token: Some(token.into()),
        })
    }

    /// Enter a faculty session. Any student session is replaced.
    pub fn login_faculty(
        &self,
        faculty: Faculty,
        fully_registered: bool,
        token: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.establish(Session {
            identity: Identity::Faculty(faculty),
            fully_registered,
            token: Some(token.into()),
        })
    }

    /// Faculty and class chosen: store the updated student as fully registered
    pub fn complete_student_profile(&self, student: Student) -> Result<(), SessionError> {
        let token = self.current_token_for(Role::Student)?;
        self.establish(Session {
            identity: Identity::Student(student),
            fully_registered: true,
            token,
        })
    }

    /// Profile details uploaded: store the updated faculty as fully registered
    pub fn complete_faculty_profile(&self, faculty: Faculty) -> Result<(), SessionError> {
        let token = self.current_token_for(Role::Faculty)?;
        self.establish(Session {
            identity: Identity::Faculty(faculty),
            fully_registered: true,
            token,
        })
    }

    pub fn logout(&self) {
        self.end("Signed out");
    }

    /// The backend rejected our credential; drop the whole session.
    pub fn expire(&self) {
        self.end("Session expired");
    }

    /// Expire only if `token` is still the active credential. A rejection of
    /// a token that was already replaced by a newer sign-in is ignored.
    pub fn expire_if(&self, token: &str) -> bool {
        let mut suspended = self.suspended.lock();
        let current = self.token();
        if current.as_deref() != Some(token) {
            debug!("Ignoring rejection of a superseded credential");
            return false;
        }
        self.end_locked(&mut suspended, "Session expired");
        true
    }

    fn end(&self, reason: &str) {
        let mut suspended = self.suspended.lock();
        self.end_locked(&mut suspended, reason);
    }

    fn end_locked(&self, suspended: &mut Option<SessionState>, reason: &str) {
        *suspended = None;
        if let Err(e) = self.storage.clear() {
            warn!(error = %e, "Failed to erase stored session");
        }
        let previous = self.state.send_replace(SessionState::Anonymous);
        if previous.session().is_some() {
            info!("{}", reason);
        }
    }

    fn current_token_for(&self, role: Role) -> Result<Option<String>, SessionError> {
        let state = self.state.borrow();
        match state.session() {
            None => Err(SessionError::NoSession),
            Some(session) if session.identity.role() != role => {
                Err(SessionError::WrongRole { expected: role })
            }
            Some(session) => Ok(session.token.clone()),
        }
    }

    fn establish(&self, session: Session) -> Result<(), SessionError> {
        let mut suspended = self.suspended.lock();
        self.storage.save(&session)?;
        *suspended = None;
        debug!(role = %session.identity.role(), fully_registered = session.fully_registered, "Session established");
        self.state.send_replace(SessionState::Active(session));
        Ok(())
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}
