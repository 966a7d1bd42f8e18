//! Session store for the HTTP surface
//!
//! Maps opaque session ids to sessions, one per login. In-memory only and
//! capped; the oldest sessions are evicted first.

use crate::auth::{authenticate, ProfileDirectory};
use crate::error::AssistantError;
use crate::models::Session;
use crate::Result;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// Open sessions kept before the oldest is evicted
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

#[derive(Default)]
struct SessionTable {
    sessions: HashMap<Uuid, Session>,
    // Login order, oldest first
    order: VecDeque<Uuid>,
}

pub struct SessionStore {
    directory: Arc<dyn ProfileDirectory>,
    table: Arc<RwLock<SessionTable>>,
    capacity: usize,
}

impl SessionStore {
    pub fn new(directory: Arc<dyn ProfileDirectory>) -> Self {
        Self::with_capacity(directory, DEFAULT_MAX_SESSIONS)
    }

    pub fn with_capacity(directory: Arc<dyn ProfileDirectory>, capacity: usize) -> Self {
        Self {
            directory,
            table: Arc::new(RwLock::new(SessionTable::default())),
            capacity: capacity.max(1),
        }
    }

    /// Authenticate and open a new session. Failed logins store nothing.
    pub async fn login(&self, account_id: &str, password: &str) -> Result<(Uuid, Session)> {
        let session = authenticate(self.directory.as_ref(), account_id, password)?;
        let session_id = Uuid::new_v4();

        let mut table = self.table.write().await;
        while table.order.len() >= self.capacity {
            let Some(oldest) = table.order.pop_front() else {
                break;
            };
            table.sessions.remove(&oldest);
            debug!(session_id = %oldest, "Session evicted");
        }
        table.order.push_back(session_id);
        table.sessions.insert(session_id, session.clone());
        info!(%session_id, "Session opened");

        Ok((session_id, session))
    }

    pub async fn get(&self, session_id: Uuid) -> Option<Session> {
        self.table.read().await.sessions.get(&session_id).cloned()
    }

    /// Look up a session from its string form.
    pub async fn resolve(&self, raw_id: &str) -> Result<Session> {
        let session_id = Uuid::parse_str(raw_id.trim())?;
        self.get(session_id)
            .await
            .ok_or(AssistantError::SessionNotFound)
    }

    /// Drop the session. Its id stops resolving immediately.
    pub async fn logout(&self, session_id: Uuid) -> Result<()> {
        let mut table = self.table.write().await;
        if table.sessions.remove(&session_id).is_none() {
            debug!(%session_id, "Logout for unknown session");
            return Err(AssistantError::SessionNotFound);
        }
        table.order.retain(|id| *id != session_id);
        info!(%session_id, "Session closed");
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.table.read().await.sessions.is_empty()
    }
}
