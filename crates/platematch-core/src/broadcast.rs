//! Best-effort broadcast dispatch.
//!
//! Deliveries are computed while the coordinator holds its exclusive
//! section, then dispatched here after the section is released. A send is
//! a channel push consumed by the recipient's transport task; a failed
//! push (receiver already gone, e.g. a half-closed connection the
//! liveness probe has not reaped yet) is logged and skipped. It never
//! aborts delivery to the remaining members and never rolls back the
//! mutation that produced the event.

use tracing::warn;

use crate::event::ServerEvent;
use crate::group::GroupState;
use crate::registry::EventSender;

/// One pending (recipient, event) pair.
#[derive(Debug)]
pub(crate) struct Delivery {
    pub username: String,
    pub sender: EventSender,
    pub event: ServerEvent,
}

/// Queue one event for every current member of a group.
pub(crate) fn fan_out(group: &GroupState, event: &ServerEvent, out: &mut Vec<Delivery>) {
    for (username, member) in group.members() {
        out.push(Delivery {
            username: username.clone(),
            sender: member.sender.clone(),
            event: event.clone(),
        });
    }
}

/// Attempt every queued delivery, at most once per recipient.
pub(crate) fn dispatch(deliveries: Vec<Delivery>) {
    for delivery in deliveries {
        if delivery.sender.send(delivery.event).is_err() {
            warn!(
                username = %delivery.username,
                "dropping event for unreachable member"
            );
        }
    }
}
