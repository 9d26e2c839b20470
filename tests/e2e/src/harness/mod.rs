//! Test harness
//!
//! Channel-backed fake members for driving a coordinator in-process:
//! - One `TestMember` per simulated connection, with a drainable inbox
//! - Event constructors so journeys read like client traffic
//! - Unreachable members (receiver already dropped) for delivery-failure
//!   scenarios

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver};

use platematch_core::{ClientEvent, Coordinator, ServerEvent};

static NEXT_CONNECTION: AtomicU64 = AtomicU64::new(0);

fn next_connection_id(username: &str) -> String {
    format!(
        "conn-{}-{}",
        username,
        NEXT_CONNECTION.fetch_add(1, Ordering::SeqCst)
    )
}

/// One simulated connection.
pub struct TestMember {
    pub connection_id: String,
    pub username: String,
    rx: UnboundedReceiver<ServerEvent>,
}

impl TestMember {
    /// Drain every event delivered so far.
    pub fn drain(&mut self) -> Vec<ServerEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            out.push(event);
        }
        out
    }

    /// Count drained events matching a predicate.
    pub fn drain_count(&mut self, predicate: impl Fn(&ServerEvent) -> bool) -> usize {
        self.drain().iter().filter(|e| predicate(e)).count()
    }
}

/// A coordinator plus helpers for wiring fake connections to it.
pub struct TestBed {
    pub coordinator: Arc<Coordinator>,
}

impl TestBed {
    pub fn new() -> Self {
        Self {
            coordinator: Arc::new(Coordinator::new()),
        }
    }

    /// Open a fake connection, optionally auto-joining a group at connect
    /// time.
    pub async fn connect(&self, username: &str, initial_group: Option<&str>) -> TestMember {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection_id = next_connection_id(username);
        self.coordinator
            .connect(&connection_id, username, tx, initial_group)
            .await;
        TestMember {
            connection_id,
            username: username.to_string(),
            rx,
        }
    }

    /// A member whose receive side is already gone; every delivery to
    /// them fails. Returns the connection id for later disconnect.
    pub async fn connect_unreachable(&self, username: &str, initial_group: Option<&str>) -> String {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let connection_id = next_connection_id(username);
        self.coordinator
            .connect(&connection_id, username, tx, initial_group)
            .await;
        connection_id
    }

    pub async fn send(&self, member: &TestMember, event: ClientEvent) {
        self.coordinator
            .handle_event(&member.connection_id, event)
            .await;
    }

    /// Simulate transport closure for a member.
    pub async fn disconnect(&self, member: &TestMember) {
        self.coordinator.disconnect(&member.connection_id).await;
    }
}

impl Default for TestBed {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// EVENT CONSTRUCTORS
// ============================================================================

pub fn join(group: &str, username: &str) -> ClientEvent {
    ClientEvent::JoinGroup {
        group_code: group.to_string(),
        username: username.to_string(),
        name: None,
    }
}

pub fn leave(group: &str, username: &str) -> ClientEvent {
    ClientEvent::LeaveGroup {
        group_code: group.to_string(),
        username: username.to_string(),
        name: None,
    }
}

pub fn vote(group: &str, restaurant: &str, name: &str, liked: bool) -> ClientEvent {
    ClientEvent::RestaurantVote {
        group_code: group.to_string(),
        restaurant_id: restaurant.to_string(),
        restaurant_name: name.to_string(),
        liked,
    }
}

pub fn reset(group: &str, username: &str) -> ClientEvent {
    ClientEvent::ResetSelection {
        group_code: group.to_string(),
        username: username.to_string(),
        name: None,
    }
}

pub fn ready(group: &str, username: &str, is_ready: bool) -> ClientEvent {
    ClientEvent::ReadyStatusChange {
        group_code: group.to_string(),
        username: username.to_string(),
        is_ready,
    }
}

pub fn dissolve(group: &str) -> ClientEvent {
    ClientEvent::GroupDissolvedByHost {
        group_code: group.to_string(),
        message: None,
    }
}
