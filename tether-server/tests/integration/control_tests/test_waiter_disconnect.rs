use crate::init_tracing;
use crate::utils::{ALPHA_SECRET, Harness, expect_granted, expect_pending};

/// A waiter that disconnects mid-queue is skipped at promotion time, not
/// granted and not allowed to stall the queue.
#[tokio::test]
async fn disconnected_waiter_is_skipped_on_promotion() {
    init_tracing();
    let mut h = Harness::new();

    let mut robot = h.connect();
    h.identify_ok(&mut robot, "alpha-bot", "alpha", ALPHA_SECRET);

    let mut h1 = h.connect();
    h.join_ok(&mut h1, "alpha");
    h.request_control(&h1);
    assert_eq!(expect_granted(&mut h1), robot.id);

    let mut h2 = h.connect();
    h.join_ok(&mut h2, "alpha");
    h.request_control(&h2);
    expect_pending(&mut h2, 1);

    let mut h3 = h.connect();
    h.join_ok(&mut h3, "alpha");
    h.request_control(&h3);
    expect_pending(&mut h3, 2);

    h.disconnect(&h2);
    h1.drain();
    h3.drain();
    robot.drain();

    h.release_control(&h1);
    robot.drain();
    h1.drain();

    // h3 is promoted directly; no repositioning message, no skip.
    assert_eq!(expect_granted(&mut h3), robot.id);
}
