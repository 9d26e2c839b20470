//! Wire event model.
//!
//! Every frame on the realtime channel is a `{type, data}` envelope.
//! Inbound frames deserialize into [`ClientEvent`]; anything missing a
//! required field or carrying an unknown tag is rejected at this boundary
//! as [`EventError::Malformed`] instead of surfacing as a runtime error
//! deeper in the engine. Outbound frames are [`ServerEvent`] values,
//! serialized once per broadcast.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced at the wire boundary.
#[derive(Debug, Error)]
pub enum EventError {
    /// Payload was not valid JSON, used an unknown tag, or is missing
    /// required fields. The event is dropped; the connection stays open.
    #[error("malformed event: {0}")]
    Malformed(#[from] serde_json::Error),
}

// ============================================================================
// INBOUND
// ============================================================================

/// Events a connected client may send.
///
/// The `username` fields mirror the wire format; the coordinator trusts the
/// authenticated connection identity, not the payload, when mutating state.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Join a group, creating it on first use.
    JoinGroup {
        group_code: String,
        username: String,
        #[serde(default)]
        name: Option<String>,
    },
    /// Leave a group. A no-op if the sender is not a member.
    LeaveGroup {
        group_code: String,
        username: String,
        #[serde(default)]
        name: Option<String>,
    },
    /// Like or un-like a candidate restaurant.
    RestaurantVote {
        group_code: String,
        restaurant_id: String,
        #[serde(default)]
        restaurant_name: String,
        #[serde(default)]
        liked: bool,
    },
    /// Clear every like-set in the group; membership survives.
    ResetSelection {
        group_code: String,
        username: String,
        #[serde(default)]
        name: Option<String>,
    },
    /// Flip the sender's ready flag for the pre-selection lobby.
    ReadyStatusChange {
        group_code: String,
        username: String,
        is_ready: bool,
    },
    /// Host dissolved the group; advisory broadcast, host authority is
    /// validated by the collaborating persistence layer, not here.
    GroupDissolvedByHost {
        group_code: String,
        #[serde(default)]
        message: Option<String>,
    },
    /// Re-broadcast a match announcement produced elsewhere.
    RestaurantMatch {
        group_code: String,
        restaurant_id: String,
        #[serde(default)]
        restaurant_name: String,
        #[serde(default)]
        message: Option<String>,
    },
}

impl ClientEvent {
    /// Parse one inbound text frame.
    pub fn parse(text: &str) -> Result<Self, EventError> {
        Ok(serde_json::from_str(text)?)
    }
}

// ============================================================================
// OUTBOUND
// ============================================================================

/// Events fanned out to every current member of a group.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    UserJoined {
        username: String,
        name: String,
        group_code: String,
    },
    MemberLeft {
        username: String,
        name: String,
        group_code: String,
        message: String,
    },
    /// Echo of an applied vote, enriched with the authenticated voter.
    RestaurantVote {
        group_code: String,
        restaurant_id: String,
        restaurant_name: String,
        liked: bool,
        username: String,
    },
    RestaurantMatch {
        restaurant_id: String,
        restaurant_name: String,
        group_code: String,
        message: String,
    },
    SelectionReset {
        group_code: String,
        username: String,
        name: String,
    },
    MemberReadyUpdate {
        group_code: String,
        username: String,
        is_ready: bool,
    },
    AllMembersReady {
        group_code: String,
        message: String,
    },
    GroupDissolved {
        message: String,
        redirect: bool,
        group_code: String,
    },
}

impl ServerEvent {
    /// Serialize for transmission on the realtime channel.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================
