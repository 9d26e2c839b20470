//! Group membership table and vote ledger.
//!
//! A group exists in the engine if and only if it has at least one
//! connected member: rows are created lazily on first join and deleted,
//! together with every vote row, the moment membership reaches zero.
//! Like-sets hold user identities, so a member appears in at most one
//! state per candidate; re-voting the same way is idempotent and voting
//! the opposite way toggles.

use std::collections::{HashMap, HashSet};

use crate::registry::EventSender;

/// Unanimity rule: every current member likes the candidate, and the
/// group has at least two members. A single-member group agreeing with
/// itself is not a coordination event.
pub fn unanimous(like_count: usize, member_count: usize) -> bool {
    like_count == member_count && member_count >= 2
}

/// One connected member of a group.
#[derive(Debug, Clone)]
pub(crate) struct Member {
    pub sender: EventSender,
    pub display_name: String,
    pub is_ready: bool,
}

/// Per-group coordination state: the member set and the like-sets of
/// every candidate seen so far.
#[derive(Debug, Default)]
pub struct GroupState {
    members: HashMap<String, Member>,
    likes: HashMap<String, HashSet<String>>,
}

impl GroupState {
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Number of candidates with a vote row, liked or not.
    pub fn candidate_count(&self) -> usize {
        self.likes.len()
    }

    pub fn contains(&self, username: &str) -> bool {
        self.members.contains_key(username)
    }

    /// Insert or overwrite a member entry. A re-join with a fresh
    /// connection silently replaces the old channel handle, which is how
    /// reconnect-without-explicit-leave works; the ready flag starts over
    /// with the new connection.
    pub fn insert_member(&mut self, username: &str, display_name: &str, sender: EventSender) {
        self.members.insert(
            username.to_string(),
            Member {
                sender,
                display_name: display_name.to_string(),
                is_ready: false,
            },
        );
    }

    /// Remove a member. Returns whether they were present.
    pub fn remove_member(&mut self, username: &str) -> bool {
        self.members.remove(username).is_some()
    }

    pub(crate) fn members(&self) -> impl Iterator<Item = (&String, &Member)> {
        self.members.iter()
    }

    /// Apply one vote. Liked adds the user to the candidate's like-set,
    /// not-liked removes them; both directions are idempotent. Returns
    /// whether the like-set changed.
    pub fn apply_vote(&mut self, restaurant_id: &str, username: &str, liked: bool) -> bool {
        let likes = self.likes.entry(restaurant_id.to_string()).or_default();
        if liked {
            likes.insert(username.to_string())
        } else {
            likes.remove(username)
        }
    }

    pub fn like_count(&self, restaurant_id: &str) -> usize {
        self.likes.get(restaurant_id).map_or(0, HashSet::len)
    }

    /// Consult the unanimity rule for one candidate against the current
    /// member set. Recomputed on demand, never cached: membership and
    /// votes both move between calls.
    pub fn is_match(&self, restaurant_id: &str) -> bool {
        unanimous(self.like_count(restaurant_id), self.member_count())
    }

    /// Empty every like-set. The rows themselves survive, so the next
    /// vote on a known candidate reuses its entry.
    pub fn clear_likes(&mut self) {
        for likes in self.likes.values_mut() {
            likes.clear();
        }
    }

    /// Update a present member's ready flag. Returns false for
    /// non-members.
    pub fn set_ready(&mut self, username: &str, is_ready: bool) -> bool {
        match self.members.get_mut(username) {
            Some(member) => {
                member.is_ready = is_ready;
                true
            }
            None => false,
        }
    }

    /// Ready quorum: at least two members and every one of them ready.
    pub fn all_ready(&self) -> bool {
        self.members.len() >= 2 && self.members.values().all(|m| m.is_ready)
    }

    pub(crate) fn display_name(&self, username: &str) -> Option<&str> {
        self.members.get(username).map(|m| m.display_name.as_str())
    }
}

/// Table of every live group, keyed by group code.
#[derive(Debug, Default)]
pub struct GroupTable {
    groups: HashMap<String, GroupState>,
}

impl GroupTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, group_code: &str) -> Option<&GroupState> {
        self.groups.get(group_code)
    }

    pub fn get_mut(&mut self, group_code: &str) -> Option<&mut GroupState> {
        self.groups.get_mut(group_code)
    }

    /// Fetch a group row, creating it on first join.
    pub fn get_or_create(&mut self, group_code: &str) -> &mut GroupState {
        self.groups.entry(group_code.to_string()).or_default()
    }

    /// Drop a group row and all of its vote rows.
    pub fn remove(&mut self, group_code: &str) -> Option<GroupState> {
        self.groups.remove(group_code)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Every group code currently containing the given user. Owned codes,
    /// so callers can mutate the table while iterating the result.
    pub fn groups_containing(&self, username: &str) -> Vec<String> {
        self.groups
            .iter()
            .filter(|(_, group)| group.contains(username))
            .map(|(code, _)| code.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &GroupState)> {
        self.groups.iter()
    }
}

// ============================================================================
// TESTS
// ============================================================================
