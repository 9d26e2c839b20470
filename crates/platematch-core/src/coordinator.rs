//! Connection lifecycle manager and event dispatch.
//!
//! [`Coordinator`] is the single service object owning the three shared
//! tables: the connection registry, the group membership table, and the
//! per-group vote ledger. Every mutation runs as one exclusive critical
//! section behind a mutex; deliveries and notices are collected inside
//! the section and dispatched only after it is released, so nothing ever
//! blocks on a slow recipient while holding the lock.
//!
//! Events referencing a group the engine no longer knows are benign
//! no-ops: late or duplicate client traffic after a dissolve is expected,
//! not a programming error.

use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info};

use crate::broadcast::{dispatch, fan_out, Delivery};
use crate::event::{ClientEvent, ServerEvent};
use crate::group::GroupTable;
use crate::notice::CoordinationNotice;
use crate::registry::{ConnectionRegistry, EventSender};

const MATCH_MESSAGE: &str = "You've found a match!";
const DISSOLVED_MESSAGE: &str = "The host has dissolved the group";
const ALL_READY_MESSAGE: &str = "All members are ready! Starting restaurant selection...";

/// Capacity of the notice bus. Subscribers that fall further behind than
/// this observe a lag error, never a stalled coordinator.
const NOTICE_CAPACITY: usize = 256;

/// Point-in-time counters for the status reporter.
#[derive(Debug, Clone)]
pub struct CoordinatorStats {
    pub connections: usize,
    pub groups: Vec<GroupSummary>,
}

#[derive(Debug, Clone)]
pub struct GroupSummary {
    pub group_code: String,
    pub members: usize,
    pub candidates: usize,
}

/// Everything produced by one critical section, applied after it ends.
#[derive(Default)]
struct Effects {
    deliveries: Vec<Delivery>,
    notices: Vec<CoordinationNotice>,
}

/// The realtime coordination engine.
pub struct Coordinator {
    state: Mutex<CoordinatorState>,
    notice_tx: broadcast::Sender<CoordinationNotice>,
}

struct CoordinatorState {
    registry: ConnectionRegistry,
    groups: GroupTable,
}

impl Coordinator {
    pub fn new() -> Self {
        let (notice_tx, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            state: Mutex::new(CoordinatorState {
                registry: ConnectionRegistry::new(),
                groups: GroupTable::new(),
            }),
            notice_tx,
        }
    }

    /// Subscribe to the side-channel notice bus.
    pub fn subscribe_notices(&self) -> broadcast::Receiver<CoordinationNotice> {
        self.notice_tx.subscribe()
    }

    /// Register an authenticated connection. When the client supplied a
    /// group at connect time this also joins it, exactly as if the first
    /// inbound frame had been a join.
    pub async fn connect(
        &self,
        connection_id: &str,
        username: &str,
        sender: EventSender,
        initial_group: Option<&str>,
    ) {
        let mut fx = Effects::default();
        {
            let mut state = self.state.lock().await;
            state.registry.register(connection_id, username, sender.clone());
            info!(
                connection_id = %connection_id,
                username = %username,
                connections = state.registry.len(),
                "connection registered"
            );
            if let Some(group_code) = initial_group {
                state.join(group_code, username, None, sender, &mut fx);
            }
        }
        self.apply(fx);
    }

    /// Dispatch one inbound event from a registered connection. The
    /// authenticated connection identity is authoritative; username
    /// fields in the payload are display-only.
    pub async fn handle_event(&self, connection_id: &str, event: ClientEvent) {
        let mut fx = Effects::default();
        {
            let mut state = self.state.lock().await;
            let (username, sender) = match state.registry.get(connection_id) {
                Some(conn) => (conn.username.clone(), conn.sender.clone()),
                None => {
                    debug!(connection_id = %connection_id, "event from unregistered connection dropped");
                    return;
                }
            };

            match event {
                ClientEvent::JoinGroup {
                    group_code, name, ..
                } => state.join(&group_code, &username, name.as_deref(), sender, &mut fx),
                ClientEvent::LeaveGroup {
                    group_code, name, ..
                } => state.leave(&group_code, &username, name.as_deref(), &mut fx),
                ClientEvent::RestaurantVote {
                    group_code,
                    restaurant_id,
                    restaurant_name,
                    liked,
                } => state.vote(
                    &group_code,
                    &restaurant_id,
                    &restaurant_name,
                    liked,
                    &username,
                    &mut fx,
                ),
                ClientEvent::ResetSelection {
                    group_code, name, ..
                } => state.reset(&group_code, &username, name.as_deref(), &mut fx),
                ClientEvent::ReadyStatusChange {
                    group_code,
                    is_ready,
                    ..
                } => state.set_ready(&group_code, &username, is_ready, &mut fx),
                ClientEvent::GroupDissolvedByHost {
                    group_code,
                    message,
                } => state.dissolve(&group_code, message, &mut fx),
                ClientEvent::RestaurantMatch {
                    group_code,
                    restaurant_id,
                    restaurant_name,
                    message,
                } => state.forward_match(
                    &group_code,
                    &restaurant_id,
                    &restaurant_name,
                    message,
                    &mut fx,
                ),
            }
        }
        self.apply(fx);
    }

    /// Tear down a closed connection: unregister it and leave every group
    /// its user was a member of. This is the only disconnect cleanup path
    /// and must be reached on every code path that ends a connection.
    pub async fn disconnect(&self, connection_id: &str) {
        let mut fx = Effects::default();
        {
            let mut state = self.state.lock().await;
            let Some(conn) = state.registry.remove(connection_id) else {
                return;
            };
            info!(
                connection_id = %connection_id,
                username = %conn.username,
                connections = state.registry.len(),
                "connection closed"
            );
            for group_code in state.groups.groups_containing(&conn.username) {
                state.leave(&group_code, &conn.username, None, &mut fx);
            }
        }
        self.apply(fx);
    }

    /// Snapshot counters for periodic status logging.
    pub async fn stats(&self) -> CoordinatorStats {
        let state = self.state.lock().await;
        CoordinatorStats {
            connections: state.registry.len(),
            groups: state
                .groups
                .iter()
                .map(|(code, group)| GroupSummary {
                    group_code: code.clone(),
                    members: group.member_count(),
                    candidates: group.candidate_count(),
                })
                .collect(),
        }
    }

    fn apply(&self, fx: Effects) {
        dispatch(fx.deliveries);
        for notice in fx.notices {
            // Fire-and-forget: no subscribers is fine.
            let _ = self.notice_tx.send(notice);
        }
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordinatorState {
    fn join(
        &mut self,
        group_code: &str,
        username: &str,
        name: Option<&str>,
        sender: EventSender,
        fx: &mut Effects,
    ) {
        let display_name = name.unwrap_or(username).to_string();
        let group = self.groups.get_or_create(group_code);
        group.insert_member(username, &display_name, sender);
        info!(
            group_code = %group_code,
            username = %username,
            members = group.member_count(),
            "member joined"
        );
        // The joiner receives their own join event too; late joiners learn
        // about themselves the same way everyone else does.
        let event = ServerEvent::UserJoined {
            username: username.to_string(),
            name: display_name,
            group_code: group_code.to_string(),
        };
        fan_out(group, &event, &mut fx.deliveries);
    }

    fn leave(&mut self, group_code: &str, username: &str, name: Option<&str>, fx: &mut Effects) {
        let Some(group) = self.groups.get_mut(group_code) else {
            debug!(group_code = %group_code, "leave for unknown group dropped");
            return;
        };
        let display_name = name
            .or_else(|| group.display_name(username))
            .unwrap_or(username)
            .to_string();
        if !group.remove_member(username) {
            debug!(group_code = %group_code, username = %username, "leave from non-member dropped");
            return;
        }
        info!(
            group_code = %group_code,
            username = %username,
            members = group.member_count(),
            "member left"
        );

        if group.is_empty() {
            self.groups.remove(group_code);
            info!(group_code = %group_code, "group emptied and removed");
            fx.notices.push(CoordinationNotice::group_removed(group_code));
        } else {
            let event = ServerEvent::MemberLeft {
                username: username.to_string(),
                name: display_name.clone(),
                group_code: group_code.to_string(),
                message: format!("{display_name} has left the group"),
            };
            fan_out(group, &event, &mut fx.deliveries);
        }
    }

    fn vote(
        &mut self,
        group_code: &str,
        restaurant_id: &str,
        restaurant_name: &str,
        liked: bool,
        username: &str,
        fx: &mut Effects,
    ) {
        let Some(group) = self.groups.get_mut(group_code) else {
            debug!(group_code = %group_code, "vote for unknown group dropped");
            return;
        };
        group.apply_vote(restaurant_id, username, liked);
        debug!(
            group_code = %group_code,
            restaurant_id = %restaurant_id,
            username = %username,
            liked,
            likes = group.like_count(restaurant_id),
            "vote applied"
        );

        let echo = ServerEvent::RestaurantVote {
            group_code: group_code.to_string(),
            restaurant_id: restaurant_id.to_string(),
            restaurant_name: restaurant_name.to_string(),
            liked,
            username: username.to_string(),
        };
        fan_out(group, &echo, &mut fx.deliveries);

        // Only a liked vote can complete unanimity, so only then is the
        // detector consulted.
        if liked && group.is_match(restaurant_id) {
            info!(
                group_code = %group_code,
                restaurant_id = %restaurant_id,
                members = group.member_count(),
                "unanimous match"
            );
            let event = ServerEvent::RestaurantMatch {
                restaurant_id: restaurant_id.to_string(),
                restaurant_name: restaurant_name.to_string(),
                group_code: group_code.to_string(),
                message: MATCH_MESSAGE.to_string(),
            };
            fan_out(group, &event, &mut fx.deliveries);
            fx.notices.push(CoordinationNotice::match_found(
                group_code,
                restaurant_id,
                restaurant_name,
                group.member_count(),
            ));
        }
    }

    fn reset(&mut self, group_code: &str, username: &str, name: Option<&str>, fx: &mut Effects) {
        let Some(group) = self.groups.get_mut(group_code) else {
            debug!(group_code = %group_code, "reset for unknown group dropped");
            return;
        };
        group.clear_likes();
        info!(group_code = %group_code, username = %username, "selection reset");
        let event = ServerEvent::SelectionReset {
            group_code: group_code.to_string(),
            username: username.to_string(),
            name: name.unwrap_or(username).to_string(),
        };
        fan_out(group, &event, &mut fx.deliveries);
    }

    fn set_ready(&mut self, group_code: &str, username: &str, is_ready: bool, fx: &mut Effects) {
        let Some(group) = self.groups.get_mut(group_code) else {
            debug!(group_code = %group_code, "ready update for unknown group dropped");
            return;
        };
        if !group.set_ready(username, is_ready) {
            debug!(group_code = %group_code, username = %username, "ready update from non-member dropped");
            return;
        }
        let event = ServerEvent::MemberReadyUpdate {
            group_code: group_code.to_string(),
            username: username.to_string(),
            is_ready,
        };
        fan_out(group, &event, &mut fx.deliveries);

        if is_ready && group.all_ready() {
            info!(group_code = %group_code, members = group.member_count(), "all members ready");
            let event = ServerEvent::AllMembersReady {
                group_code: group_code.to_string(),
                message: ALL_READY_MESSAGE.to_string(),
            };
            fan_out(group, &event, &mut fx.deliveries);
        }
    }

    /// Advisory dissolution: members are told to leave and do so
    /// voluntarily; the engine does not force-disconnect anyone. Host
    /// authority is validated by the collaborating persistence layer.
    fn dissolve(&mut self, group_code: &str, message: Option<String>, fx: &mut Effects) {
        let Some(group) = self.groups.get(group_code) else {
            debug!(group_code = %group_code, "dissolve for unknown group dropped");
            return;
        };
        info!(group_code = %group_code, members = group.member_count(), "group dissolved by host");
        let event = ServerEvent::GroupDissolved {
            message: message.unwrap_or_else(|| DISSOLVED_MESSAGE.to_string()),
            redirect: true,
            group_code: group_code.to_string(),
        };
        fan_out(group, &event, &mut fx.deliveries);
        fx.notices
            .push(CoordinationNotice::group_dissolved(group_code));
    }

    fn forward_match(
        &mut self,
        group_code: &str,
        restaurant_id: &str,
        restaurant_name: &str,
        message: Option<String>,
        fx: &mut Effects,
    ) {
        let Some(group) = self.groups.get(group_code) else {
            debug!(group_code = %group_code, "match forward for unknown group dropped");
            return;
        };
        let event = ServerEvent::RestaurantMatch {
            restaurant_id: restaurant_id.to_string(),
            restaurant_name: restaurant_name.to_string(),
            group_code: group_code.to_string(),
            message: message.unwrap_or_else(|| MATCH_MESSAGE.to_string()),
        };
        fan_out(group, &event, &mut fx.deliveries);
    }
}

// ============================================================================
// TESTS
// ============================================================================
