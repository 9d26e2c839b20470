//! Host-initiated dissolution, the ready lobby, and the notice bus.

use platematch_core::{CoordinationNotice, ServerEvent};
use platematch_e2e_tests::harness::{self, TestBed};

#[tokio::test]
async fn test_dissolution_is_advisory() {
    let bed = TestBed::new();
    let mut alice = bed.connect("alice", Some("ABC123")).await;
    let mut bob = bed.connect("bob", Some("ABC123")).await;
    alice.drain();
    bob.drain();

    bed.send(&alice, harness::dissolve("ABC123")).await;

    for member in [&mut alice, &mut bob] {
        let events = member.drain();
        assert!(events.iter().any(|e| matches!(
            e,
            ServerEvent::GroupDissolved { redirect: true, group_code, .. }
                if group_code == "ABC123"
        )));
    }

    // Members leave voluntarily; the engine removed nobody.
    assert_eq!(bed.coordinator.stats().await.groups[0].members, 2);

    bed.send(&alice, harness::leave("ABC123", "alice")).await;
    bed.send(&bob, harness::leave("ABC123", "bob")).await;
    assert!(bed.coordinator.stats().await.groups.is_empty());
}

#[tokio::test]
async fn test_notice_bus_records_session_lifecycle() {
    let bed = TestBed::new();
    let mut notices = bed.coordinator.subscribe_notices();

    let alice = bed.connect("alice", Some("ABC123")).await;
    let bob = bed.connect("bob", Some("ABC123")).await;

    bed.send(&alice, harness::vote("ABC123", "r1", "Thai Garden", true))
        .await;
    bed.send(&bob, harness::vote("ABC123", "r1", "Thai Garden", true))
        .await;
    bed.send(&alice, harness::dissolve("ABC123")).await;
    bed.disconnect(&alice).await;
    bed.disconnect(&bob).await;

    let mut seen = Vec::new();
    while let Ok(notice) = notices.try_recv() {
        seen.push(notice);
    }
    assert!(matches!(
        seen[0],
        CoordinationNotice::MatchFound { member_count: 2, .. }
    ));
    assert!(matches!(seen[1], CoordinationNotice::GroupDissolved { .. }));
    assert!(matches!(seen[2], CoordinationNotice::GroupRemoved { .. }));
    assert_eq!(seen.len(), 3);

    // The wire form collaborators consume is the same tagged envelope the
    // realtime channel uses.
    let json: serde_json::Value = serde_json::from_str(&seen[0].to_json()).unwrap();
    assert_eq!(json["type"], "match_found");
    assert_eq!(json["data"]["restaurant_id"], "r1");
}

#[tokio::test]
async fn test_ready_lobby_quorum() {
    let bed = TestBed::new();
    let mut alice = bed.connect("alice", Some("ABC123")).await;
    let mut bob = bed.connect("bob", Some("ABC123")).await;
    alice.drain();
    bob.drain();

    bed.send(&alice, harness::ready("ABC123", "alice", true)).await;
    let events = bob.drain();
    assert!(events.iter().any(|e| matches!(
        e,
        ServerEvent::MemberReadyUpdate { username, is_ready: true, .. } if username == "alice"
    )));
    assert!(!events
        .iter()
        .any(|e| matches!(e, ServerEvent::AllMembersReady { .. })));

    // bob completes the quorum
    bed.send(&bob, harness::ready("ABC123", "bob", true)).await;
    for member in [&mut alice, &mut bob] {
        assert_eq!(
            member.drain_count(|e| matches!(e, ServerEvent::AllMembersReady { .. })),
            1
        );
    }

    // A newcomer arrives un-ready, breaking the quorum until they opt in.
    let mut carol = bed.connect("carol", Some("ABC123")).await;
    carol.drain();
    alice.drain();
    bob.drain();

    bed.send(&carol, harness::ready("ABC123", "carol", true)).await;
    assert_eq!(
        carol.drain_count(|e| matches!(e, ServerEvent::AllMembersReady { .. })),
        1
    );
}
