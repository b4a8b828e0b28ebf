use tether_core::ServerMessage;

use crate::init_tracing;
use crate::utils::{ALPHA_SECRET, BETA_SECRET, Harness, expect_error, expect_granted, expect_pending};

#[tokio::test]
async fn request_outside_a_space_is_rejected() {
    init_tracing();
    let mut h = Harness::new();
    let mut client = h.connect();

    h.request_control(&client);
    expect_error(&mut client, "You must join a space first");
}

#[tokio::test]
async fn robots_cannot_request_their_own_lease() {
    init_tracing();
    let mut h = Harness::new();

    let mut robot = h.connect();
    h.identify_ok(&mut robot, "alpha-bot", "alpha", ALPHA_SECRET);

    h.request_control(&robot);
    expect_error(&mut robot, "Robots cannot request control");
}

#[tokio::test]
async fn vacant_lease_with_empty_queue_grants_immediately() {
    init_tracing();
    let mut h = Harness::new();

    let mut robot = h.connect();
    h.identify_ok(&mut robot, "alpha-bot", "alpha", ALPHA_SECRET);

    let mut human = h.connect();
    h.join_ok(&mut human, "alpha");
    robot.drain();

    h.request_control(&human);
    match human.next() {
        ServerMessage::ControlGranted {
            robot_id,
            robot_name,
        } => {
            assert_eq!(robot_id, robot.id);
            assert_eq!(robot_name, "alpha-bot unit");
        }
        other => panic!("expected control_granted, got {other:?}"),
    }
    // Grants go to the controller alone.
    robot.assert_silent();
}

#[tokio::test]
async fn repeated_request_keeps_the_same_queue_position() {
    init_tracing();
    let mut h = Harness::new();

    let mut robot = h.connect();
    h.identify_ok(&mut robot, "alpha-bot", "alpha", ALPHA_SECRET);

    let mut holder = h.connect();
    let mut waiter = h.connect();
    let mut tail = h.connect();
    for client in [&mut holder, &mut waiter, &mut tail] {
        h.join_ok(client, "alpha");
    }
    holder.drain();
    waiter.drain();

    h.request_control(&holder);
    expect_granted(&mut holder);
    h.request_control(&waiter);
    expect_pending(&mut waiter, 1);
    h.request_control(&tail);
    expect_pending(&mut tail, 2);

    // Asking again neither advances nor duplicates the entry.
    h.request_control(&waiter);
    expect_pending(&mut waiter, 1);
    h.request_control(&tail);
    expect_pending(&mut tail, 2);
}

#[tokio::test]
async fn current_controller_cannot_request_again() {
    init_tracing();
    let mut h = Harness::new();

    let mut robot = h.connect();
    h.identify_ok(&mut robot, "alpha-bot", "alpha", ALPHA_SECRET);

    let mut human = h.connect();
    h.join_ok(&mut human, "alpha");
    h.request_control(&human);
    expect_granted(&mut human);

    h.request_control(&human);
    expect_error(&mut human, "You already control a robot");
}

#[tokio::test]
async fn release_by_robot_frees_the_lease() {
    init_tracing();
    let mut h = Harness::new();

    let mut robot = h.connect();
    h.identify_ok(&mut robot, "alpha-bot", "alpha", ALPHA_SECRET);

    let mut human = h.connect();
    h.join_ok(&mut human, "alpha");
    h.request_control(&human);
    expect_granted(&mut human);
    robot.drain();

    h.release_control(&robot);
    match human.next() {
        ServerMessage::ControlReleased {
            robot_id: Some(released),
            controller_id: None,
            reason: None,
        } => assert_eq!(released, robot.id),
        other => panic!("expected control_released, got {other:?}"),
    }

    // The lease is vacant again: the next request grants straight away.
    h.request_control(&human);
    assert_eq!(expect_granted(&mut human), robot.id);
}

#[tokio::test]
async fn request_then_release_restores_vacancy_and_empties_the_queue() {
    init_tracing();
    let mut h = Harness::new();

    let mut robot = h.connect();
    h.identify_ok(&mut robot, "alpha-bot", "alpha", ALPHA_SECRET);

    let mut human = h.connect();
    h.join_ok(&mut human, "alpha");
    robot.drain();

    h.request_control(&human);
    expect_granted(&mut human);
    h.release_control(&human);
    robot.drain();
    human.drain();

    // Another human now gets an immediate grant, proving the lease went
    // back to vacant with nothing queued.
    let mut other = h.connect();
    h.join_ok(&mut other, "alpha");
    h.request_control(&other);
    assert_eq!(expect_granted(&mut other), robot.id);
}

#[tokio::test]
async fn release_by_a_queued_human_just_leaves_the_line() {
    init_tracing();
    let mut h = Harness::new();

    let mut robot = h.connect();
    h.identify_ok(&mut robot, "alpha-bot", "alpha", ALPHA_SECRET);

    let mut holder = h.connect();
    let mut quitter = h.connect();
    let mut tail = h.connect();
    for client in [&mut holder, &mut quitter, &mut tail] {
        h.join_ok(client, "alpha");
    }
    holder.drain();
    quitter.drain();

    h.request_control(&holder);
    expect_granted(&mut holder);
    h.request_control(&quitter);
    expect_pending(&mut quitter, 1);
    h.request_control(&tail);
    expect_pending(&mut tail, 2);

    h.release_control(&quitter);
    quitter.assert_silent();

    h.release_control(&holder);
    robot.drain();
    holder.drain();
    assert_eq!(expect_granted(&mut tail), robot.id);
}

#[tokio::test]
async fn release_by_an_uninvolved_client_is_a_no_op() {
    init_tracing();
    let mut h = Harness::new();

    let mut bystander = h.connect();
    h.join_ok(&mut bystander, "beta");
    h.release_control(&bystander);
    bystander.assert_silent();
}

#[tokio::test]
async fn queues_are_independent_per_space() {
    init_tracing();
    let mut h = Harness::new();

    let mut alpha_bot = h.connect();
    h.identify_ok(&mut alpha_bot, "alpha-bot", "alpha", ALPHA_SECRET);
    let mut beta_bot = h.connect();
    h.identify_ok(&mut beta_bot, "beta-bot", "beta", BETA_SECRET);

    let mut alpha_human = h.connect();
    h.join_ok(&mut alpha_human, "alpha");
    let mut beta_human = h.connect();
    h.join_ok(&mut beta_human, "beta");

    h.request_control(&alpha_human);
    assert_eq!(expect_granted(&mut alpha_human), alpha_bot.id);
    h.request_control(&beta_human);
    assert_eq!(expect_granted(&mut beta_human), beta_bot.id);
}
