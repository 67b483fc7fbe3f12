use chrono::{DateTime, Duration, Utc};
use nexttrip_core::flight::FlightSelection;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, RwLock, TryLockError};
use uuid::Uuid;

use crate::session::{WizardError, WizardSession};

/// One session behind its own lock, so a slow commit never blocks other
/// customers' sessions.
///
/// The commit marker lives beside the lock, not inside it: it is readable
/// while a commit holds the session, and it is released by [`CommitClaim`]'s
/// drop whether the commit finishes, fails or is cancelled.
#[derive(Debug)]
pub struct SessionSlot {
    session: Mutex<WizardSession>,
    committing: AtomicBool,
}

pub type SessionHandle = Arc<SessionSlot>;

impl SessionSlot {
    fn new(session: WizardSession) -> Self {
        Self {
            session: Mutex::new(session),
            committing: AtomicBool::new(false),
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, WizardSession> {
        self.session.lock().await
    }

    pub fn try_lock(&self) -> Result<MutexGuard<'_, WizardSession>, TryLockError> {
        self.session.try_lock()
    }

    pub fn is_committing(&self) -> bool {
        self.committing.load(Ordering::Acquire)
    }

    /// Mark a commit as in flight. Fails if one already is.
    pub fn begin_commit(&self) -> Result<CommitClaim<'_>, WizardError> {
        self.committing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| WizardError::SubmissionInProgress)?;
        Ok(CommitClaim { flag: &self.committing })
    }
}

/// Held for the duration of a commit.
#[derive(Debug)]
pub struct CommitClaim<'a> {
    flag: &'a AtomicBool,
}

impl Drop for CommitClaim<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Keeps every open wizard session in memory and drops the idle ones.
pub struct SessionManager {
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Start a wizard for `flight` on behalf of `owner`.
    pub async fn open(&self, owner: &str, flight: FlightSelection) -> (Uuid, SessionHandle) {
        let session = WizardSession::new(owner, flight);
        let id = session.id();
        let handle = Arc::new(SessionSlot::new(session));

        self.sessions.write().await.insert(id, handle.clone());
        tracing::info!(session_id = %id, owner = %owner, "Wizard session opened");
        (id, handle)
    }

    /// A missing session reads the same as arriving without a flight.
    pub async fn get(&self, id: &Uuid) -> Result<SessionHandle, WizardError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(WizardError::NoFlightSelected)
    }

    pub async fn discard(&self, id: &Uuid) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Drop sessions idle for longer than the TTL. Sessions that are locked
    /// or committing at the moment are left for the next sweep.
    pub async fn cleanup_expired(&self, now: DateTime<Utc>) -> Vec<Uuid> {
        let mut sessions = self.sessions.write().await;
        let mut removed = Vec::new();

        sessions.retain(|id, handle| match handle.try_lock() {
            Ok(session) if !handle.is_committing() && session.updated_at() + self.ttl <= now => {
                removed.push(*id);
                false
            }
            _ => true,
        });

        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(Duration::minutes(30))
    }
}
