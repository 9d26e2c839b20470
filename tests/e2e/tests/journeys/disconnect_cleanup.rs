//! Transport-closure cleanup and delivery-failure tolerance.

use platematch_core::ServerEvent;
use platematch_e2e_tests::harness::{self, TestBed};

#[tokio::test]
async fn test_disconnect_sweeps_every_group() {
    let bed = TestBed::new();

    // alice is in G1 (alone) and G2 (with bob)
    let alice = bed.connect("alice", Some("G1")).await;
    bed.send(&alice, harness::join("G2", "alice")).await;
    let mut bob = bed.connect("bob", Some("G2")).await;
    bob.drain();

    bed.disconnect(&alice).await;

    // G1 emptied and was garbage collected together with its vote rows;
    // G2 survives with bob and hears the departure.
    let stats = bed.coordinator.stats().await;
    assert_eq!(stats.groups.len(), 1);
    assert_eq!(stats.groups[0].group_code, "G2");
    assert_eq!(stats.groups[0].members, 1);

    assert!(bob.drain().iter().any(|e| matches!(
        e,
        ServerEvent::MemberLeft { username, .. } if username == "alice"
    )));
}

#[tokio::test]
async fn test_membership_arithmetic_over_join_leave_sequences() {
    let bed = TestBed::new();
    let alice = bed.connect("alice", Some("G1")).await;
    let bob = bed.connect("bob", Some("G1")).await;
    let carol = bed.connect("carol", Some("G1")).await;

    bed.send(&bob, harness::leave("G1", "bob")).await;
    // leaving twice is a no-op, not an error
    bed.send(&bob, harness::leave("G1", "bob")).await;

    assert_eq!(bed.coordinator.stats().await.groups[0].members, 2);

    bed.send(&alice, harness::leave("G1", "alice")).await;
    bed.send(&carol, harness::leave("G1", "carol")).await;
    assert!(bed.coordinator.stats().await.groups.is_empty());
}

#[tokio::test]
async fn test_unreachable_member_is_skipped_not_fatal() {
    let bed = TestBed::new();
    let mut alice = bed.connect("alice", Some("G1")).await;
    let _bob_conn = bed.connect_unreachable("bob", Some("G1")).await;
    let mut carol = bed.connect("carol", Some("G1")).await;
    alice.drain();
    carol.drain();

    bed.send(&alice, harness::vote("G1", "r1", "", true)).await;

    // bob's channel is dead, but alice and carol still hear the echo and
    // the vote itself landed.
    for member in [&mut alice, &mut carol] {
        assert!(member.drain().iter().any(|e| matches!(
            e,
            ServerEvent::RestaurantVote { restaurant_id, .. } if restaurant_id == "r1"
        )));
    }
    assert_eq!(bed.coordinator.stats().await.groups[0].members, 3);
}

#[tokio::test]
async fn test_reconnect_replaces_stale_handle() {
    let bed = TestBed::new();
    let mut stale = bed.connect("alice", Some("G1")).await;
    let bob = bed.connect("bob", Some("G1")).await;

    // alice reconnects without an explicit leave; the member entry keeps
    // her identity but points at the new channel.
    let mut fresh = bed.connect("alice", Some("G1")).await;
    stale.drain();
    fresh.drain();

    bed.send(&bob, harness::vote("G1", "r1", "", true)).await;
    assert!(stale.drain().is_empty());
    assert!(!fresh.drain().is_empty());
    assert_eq!(bed.coordinator.stats().await.groups[0].members, 2);
}
