//! Side-channel coordination notices.
//!
//! Collaborating layers (match-history persistence, group status updates)
//! observe the engine through a broadcast bus of these notices instead of
//! being called into directly. Publication is fire-and-forget: a lagging
//! or absent subscriber never affects coordination.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Facts the engine announces as they happen.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum CoordinationNotice {
    /// Every current member of the group liked the same candidate.
    MatchFound {
        group_code: String,
        restaurant_id: String,
        restaurant_name: String,
        member_count: usize,
        timestamp: DateTime<Utc>,
    },
    /// The host dissolved the group; the collaborating store should mark
    /// it inactive.
    GroupDissolved {
        group_code: String,
        timestamp: DateTime<Utc>,
    },
    /// Membership reached zero and the group row plus its vote rows were
    /// garbage collected.
    GroupRemoved {
        group_code: String,
        timestamp: DateTime<Utc>,
    },
}

impl CoordinationNotice {
    pub fn match_found(
        group_code: &str,
        restaurant_id: &str,
        restaurant_name: &str,
        member_count: usize,
    ) -> Self {
        Self::MatchFound {
            group_code: group_code.to_string(),
            restaurant_id: restaurant_id.to_string(),
            restaurant_name: restaurant_name.to_string(),
            member_count,
            timestamp: Utc::now(),
        }
    }

    pub fn group_dissolved(group_code: &str) -> Self {
        Self::GroupDissolved {
            group_code: group_code.to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn group_removed(group_code: &str) -> Self {
        Self::GroupRemoved {
            group_code: group_code.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Serialize for logging or forwarding.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
