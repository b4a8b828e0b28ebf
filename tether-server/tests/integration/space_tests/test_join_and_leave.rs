use serde_json::json;

use tether_core::ServerMessage;

use crate::init_tracing;
use crate::utils::Harness;

#[tokio::test]
async fn join_notifies_joiner_then_peers() {
    init_tracing();
    let mut h = Harness::new();

    let mut first = h.connect();
    let participants = h.join_ok(&mut first, "alpha");
    assert_eq!(participants, vec![first.id]);

    let mut second = h.connect();
    let participants = h.join_ok(&mut second, "alpha");
    assert_eq!(participants.len(), 2);
    assert!(participants.contains(&first.id));
    assert!(participants.contains(&second.id));

    match first.next() {
        ServerMessage::UserJoined { sid, participants } => {
            assert_eq!(sid, second.id);
            assert_eq!(participants.len(), 2);
        }
        other => panic!("expected user_joined, got {other:?}"),
    }
    // The joiner itself must not see a user_joined echo.
    second.assert_silent();
}

#[tokio::test]
async fn leave_notifies_remaining_members_and_reaps_empty_spaces() {
    init_tracing();
    let mut h = Harness::new();

    let mut a = h.connect();
    let mut b = h.connect();
    h.join_ok(&mut a, "alpha");
    h.join_ok(&mut b, "alpha");
    a.drain();

    h.send(&a, json!({"type": "leave_space", "data": {}}));
    match b.next() {
        ServerMessage::UserLeft { sid } => assert_eq!(sid, a.id),
        other => panic!("expected user_left, got {other:?}"),
    }
    assert_eq!(h.engine.stats().total_participants, 1);

    h.send(&b, json!({"type": "leave_space", "data": {}}));
    assert_eq!(h.engine.stats().active_spaces, 0);

    // Leaving twice is a no-op.
    h.send(&b, json!({"type": "leave_space", "data": {}}));
    b.assert_silent();
}

#[tokio::test]
async fn join_then_leave_restores_prior_state() {
    init_tracing();
    let mut h = Harness::new();

    let mut resident = h.connect();
    h.join_ok(&mut resident, "alpha");
    let before = h.engine.stats();

    let mut visitor = h.connect();
    h.join_ok(&mut visitor, "alpha");
    h.send(&visitor, json!({"type": "leave_space", "data": {}}));

    let after = h.engine.stats();
    assert_eq!(after.active_spaces, before.active_spaces);
    assert_eq!(after.total_participants, before.total_participants);
}

#[tokio::test]
async fn joining_another_space_leaves_the_first() {
    init_tracing();
    let mut h = Harness::new();

    let mut stay = h.connect();
    let mut mover = h.connect();
    h.join_ok(&mut stay, "alpha");
    h.join_ok(&mut mover, "alpha");
    stay.drain();

    h.join_ok(&mut mover, "beta");
    match stay.next() {
        ServerMessage::UserLeft { sid } => assert_eq!(sid, mover.id),
        other => panic!("expected user_left, got {other:?}"),
    }

    let stats = h.engine.stats();
    assert_eq!(stats.active_spaces, 2);
    assert_eq!(stats.total_participants, 2);
}
