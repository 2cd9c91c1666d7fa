use loop_bridge::{BridgeBuilder, BridgeConfig, InnerLoop, PollPoller};
use std::time::Duration;

struct Noop;

impl InnerLoop for Noop {
    fn next_timeout_millis(&self) -> i32 {
        0
    }

    fn advance_nonblocking(&mut self) {}
}

#[test]
fn test_builder_creation() {
    let bridge = BridgeBuilder::new().build(Noop).unwrap();
    drop(bridge);
}

#[test]
fn test_builder_defaults() {
    let builder = BridgeBuilder::new();
    assert_eq!(*builder.config(), BridgeConfig::default());

    let config = builder.config();
    assert_eq!(config.idle_wait, Duration::ZERO);
    assert_eq!(config.max_wait, None);
    assert_eq!(config.rebuild_after, 0);
}

#[test]
fn test_builder_options_reach_bridge() {
    let bridge = BridgeBuilder::new()
        .idle_wait(Duration::from_millis(5))
        .max_wait(Duration::from_millis(16))
        .rebuild_after(4)
        .build(Noop)
        .unwrap();

    let config = bridge.config();
    assert_eq!(config.idle_wait, Duration::from_millis(5));
    assert_eq!(config.max_wait, Some(Duration::from_millis(16)));
    assert_eq!(config.rebuild_after, 4);
}

#[test]
fn test_builder_multiple_instances_are_independent() {
    let mut first = BridgeBuilder::new().build(Noop).unwrap();
    let mut second = BridgeBuilder::new().build(Noop).unwrap();

    first.request_wake();
    first.poll_once();
    second.poll_once();

    assert_eq!(first.stats().wakes_consumed, 1);
    assert_eq!(second.stats().wakes_consumed, 0);
    assert_eq!(second.stats().timeouts, 1);
}

#[test]
fn test_builder_with_poll_backend() {
    let mut bridge = BridgeBuilder::new()
        .build_with_poller::<_, PollPoller>(Noop)
        .unwrap();

    bridge.request_wake();
    bridge.poll_once();
    bridge.poll_once();

    let stats = bridge.stats();
    assert_eq!(stats.wakes_consumed, 1);
    assert_eq!(stats.timeouts, 1);
    assert_eq!(stats.polls, 2);
}
