//! # Platematch Core
//!
//! In-memory coordination engine for realtime group restaurant matching.
//! Friends share a short-lived voting session, swipe on candidate
//! restaurants, and are told the moment the whole group converges on the
//! same choice.
//!
//! - **Connection registry**: opaque connection identities mapped to live
//!   delivery channels
//! - **Group membership table**: lazily created rows, garbage collected
//!   the moment the last member leaves
//! - **Vote ledger**: per-candidate like-sets with idempotent, toggling
//!   votes
//! - **Match detection**: O(1) unanimity check (`likes == members >= 2`),
//!   recomputed after every liked vote, never cached
//! - **Best-effort broadcast**: at-most-once fan-out that tolerates
//!   individual dead channels
//! - **Notice bus**: fire-and-forget side channel for collaborating
//!   persistence layers
//!
//! The engine owns no sockets. A transport layer feeds it parsed
//! [`ClientEvent`]s and drains per-connection channels of
//! [`ServerEvent`]s; everything in between is pure in-memory state behind
//! one exclusive section.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use platematch_core::{ClientEvent, Coordinator};
//! use tokio::sync::mpsc;
//!
//! let coordinator = Coordinator::new();
//!
//! // A connection authenticated as "alice" arrives, auto-joining ABC123.
//! let (tx, mut rx) = mpsc::unbounded_channel();
//! coordinator.connect("conn-1", "alice", tx, Some("ABC123")).await;
//!
//! // Inbound frames are parsed at the boundary and dispatched by tag.
//! let event = ClientEvent::parse(
//!     r#"{"type":"restaurant_vote","data":{"group_code":"ABC123","restaurant_id":"r1","liked":true}}"#,
//! )?;
//! coordinator.handle_event("conn-1", event).await;
//!
//! // rx now yields the vote echo for alice's transport task to deliver.
//! ```

// ============================================================================
// MODULES
// ============================================================================

mod broadcast;

pub mod coordinator;
pub mod event;
pub mod group;
pub mod notice;
pub mod registry;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use coordinator::{Coordinator, CoordinatorStats, GroupSummary};
pub use event::{ClientEvent, EventError, ServerEvent};
pub use group::{unanimous, GroupState, GroupTable};
pub use notice::CoordinationNotice;
pub use registry::{Connection, ConnectionRegistry, EventSender};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        ClientEvent, CoordinationNotice, Coordinator, CoordinatorStats, EventError, EventSender,
        ServerEvent,
    };
}
