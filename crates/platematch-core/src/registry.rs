//! Connection registry.
//!
//! Maps opaque connection identities to their live delivery channel.
//! The registry owns the [`Connection`] records; group member entries hold
//! cloned channel handles, never the record itself.

use std::collections::HashMap;

use tokio::sync::mpsc;

use crate::event::ServerEvent;

/// Handle used to deliver events to one connection. Sends are channel
/// pushes consumed by the connection's transport task; they never touch
/// the network directly.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// One live, authenticated connection.
#[derive(Debug, Clone)]
pub struct Connection {
    /// Stable user identity, as established at connect time. Survives
    /// reconnects; the connection id does not.
    pub username: String,
    /// Delivery channel for outbound events.
    pub sender: EventSender,
}

/// Process-wide table of live connections.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<String, Connection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly authenticated connection.
    pub fn register(&mut self, connection_id: &str, username: &str, sender: EventSender) {
        self.connections.insert(
            connection_id.to_string(),
            Connection {
                username: username.to_string(),
                sender,
            },
        );
    }

    pub fn get(&self, connection_id: &str) -> Option<&Connection> {
        self.connections.get(connection_id)
    }

    /// Remove a closed connection, returning its record for cleanup.
    pub fn remove(&mut self, connection_id: &str) -> Option<Connection> {
        self.connections.remove(connection_id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
