use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

pub mod handlers;
pub mod message_types;
pub mod router;

use message_types::ServerEvent;

/// Identity of one live connection.
///
/// Disconnect callbacks pass the id they were issued at announce time, so a
/// stale disconnect can never evict a newer connection for the same user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

struct PresenceEntry {
    connection_id: ConnectionId,
    sender: UnboundedSender<String>,
}

/// Process-wide map of online users to their live connection handle.
///
/// Held in memory only; after a restart every user is offline until they
/// reconnect. At most one handle per user: a new `announce` supersedes any
/// prior connection. All operations are synchronous and never suspend, so
/// they are safe to call from inside connection-event handling.
#[derive(Default, Clone)]
pub struct PresenceRegistry {
    inner: Arc<DashMap<Uuid, PresenceEntry>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or overwrite) the live handle for a user and tell everyone
    /// else they came online. Returns the connection id to hand back to
    /// `remove` on disconnect.
    pub fn announce(&self, user_id: Uuid, sender: UnboundedSender<String>) -> ConnectionId {
        let connection_id = ConnectionId::new();
        self.inner.insert(
            user_id,
            PresenceEntry {
                connection_id,
                sender,
            },
        );
        tracing::debug!(%user_id, "user announced presence");
        self.broadcast_except(user_id, &ServerEvent::UserOnline { user_id });
        connection_id
    }

    /// Current handle for a user, if online. Never blocks, never fails.
    pub fn lookup(&self, user_id: Uuid) -> Option<UnboundedSender<String>> {
        self.inner.get(&user_id).map(|entry| entry.sender.clone())
    }

    pub fn is_online(&self, user_id: Uuid) -> bool {
        self.inner.contains_key(&user_id)
    }

    /// Drop the mapping on disconnect, but only if it still belongs to the
    /// connection being torn down. Returns whether an entry was removed.
    pub fn remove(&self, user_id: Uuid, connection_id: ConnectionId) -> bool {
        let removed = self
            .inner
            .remove_if(&user_id, |_, entry| entry.connection_id == connection_id)
            .is_some();
        if removed {
            tracing::debug!(%user_id, "user went offline");
            self.broadcast_except(user_id, &ServerEvent::UserOffline { user_id });
        }
        removed
    }

    pub fn online_count(&self) -> usize {
        self.inner.len()
    }

    /// Fire-and-forget fan-out to every connection except `skip`. Closed
    /// channels are ignored; their entries are reaped by their own
    /// disconnect path.
    fn broadcast_except(&self, skip: Uuid, event: &ServerEvent) {
        if let Ok(text) = serde_json::to_string(event) {
            for entry in self.inner.iter() {
                if *entry.key() != skip {
                    let _ = entry.value().sender.send(text.clone());
                }
            }
        }
    }
}
