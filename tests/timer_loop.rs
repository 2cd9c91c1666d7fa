use loop_bridge::{BridgeBuilder, LoopBridge, TimerLoop};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_timer_fires_through_bridge() {
    let mut bridge = LoopBridge::new(TimerLoop::new()).unwrap();
    let fired = Rc::new(RefCell::new(None));

    let f = fired.clone();
    bridge
        .inner_mut()
        .add_timer(Duration::from_millis(30), move || *f.borrow_mut() = Some(Instant::now()));

    let start = Instant::now();
    let mut polls = 0;
    while fired.borrow().is_none() && polls < 10 {
        bridge.poll_once();
        polls += 1;
    }

    let fired_at = fired.borrow().expect("timer should have fired");
    assert!(fired_at - start >= Duration::from_millis(30));
    assert!(polls <= 3, "took {polls} polls");
}

#[test]
fn test_posted_job_runs_on_next_poll() {
    let mut bridge = BridgeBuilder::new()
        .idle_wait(Duration::from_secs(5))
        .build(TimerLoop::new())
        .unwrap();
    let poster = bridge.inner().poster(bridge.waker());
    let (tx, rx) = mpsc::channel();

    let producer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(30));
        assert!(poster.post(move || tx.send(thread::current().id()).unwrap()));
    });

    let start = Instant::now();
    bridge.poll_once();
    let elapsed = start.elapsed();
    producer.join().unwrap();

    assert!(elapsed < Duration::from_secs(4), "waited {elapsed:?}");
    assert_eq!(rx.try_recv().unwrap(), thread::current().id());
}

#[test]
fn test_many_posts_run_in_order() {
    let mut bridge = LoopBridge::new(TimerLoop::new()).unwrap();
    let poster = bridge.inner().poster(bridge.waker());
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));

    for i in 0..10 {
        let seen = seen.clone();
        poster.post(move || seen.lock().unwrap().push(i));
    }
    assert_eq!(poster.pending(), 10);

    bridge.poll_once();

    assert_eq!(*seen.lock().unwrap(), (0..10).collect::<Vec<_>>());
    assert_eq!(poster.pending(), 0);
    assert_eq!(bridge.stats().wakes_consumed, 1);
}

#[test]
fn test_posts_from_many_threads() {
    let mut bridge = LoopBridge::new(TimerLoop::new()).unwrap();
    let poster = bridge.inner().poster(bridge.waker());
    let counter = Arc::new(AtomicUsize::new(0));

    let producers: Vec<_> = (0..4)
        .map(|_| {
            let poster = poster.clone();
            let counter = counter.clone();
            thread::spawn(move || {
                for _ in 0..25 {
                    let counter = counter.clone();
                    poster.post(move || {
                        counter.fetch_add(1, Ordering::SeqCst);
                    });
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    bridge.poll_once();
    assert_eq!(counter.load(Ordering::SeqCst), 100);
}

#[test]
fn test_host_keeps_shared_handle() {
    let timers = Rc::new(RefCell::new(TimerLoop::new()));
    let mut bridge = LoopBridge::new(timers.clone()).unwrap();
    let hits = Rc::new(RefCell::new(0));

    let h = hits.clone();
    timers.borrow_mut().add_timer(Duration::ZERO, move || *h.borrow_mut() += 1);
    bridge.poll_once();

    let h = hits.clone();
    timers.borrow_mut().add_timer(Duration::ZERO, move || *h.borrow_mut() += 1);
    bridge.poll_once();

    assert_eq!(*hits.borrow(), 2);
    assert_eq!(timers.borrow().ticks(), 2);
}

#[test]
fn test_cancelled_timer_does_not_fire_through_bridge() {
    let mut bridge = LoopBridge::new(TimerLoop::new()).unwrap();
    let fired = Rc::new(RefCell::new(false));

    let f = fired.clone();
    let id = bridge
        .inner_mut()
        .add_timer(Duration::from_millis(5), move || *f.borrow_mut() = true);
    assert!(bridge.inner_mut().cancel(id));

    thread::sleep(Duration::from_millis(10));
    bridge.poll_once();

    assert!(!*fired.borrow());
    assert_eq!(bridge.inner().pending_timers(), 0);
}
