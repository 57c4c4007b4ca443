use evthread::SendError;
use evthread::queue::{Dequeue, MessageQueue};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_items_come_out_in_send_order() {
    let queue = MessageQueue::new(8);

    for i in 0..5 {
        queue.try_send(i).unwrap();
    }

    for i in 0..5 {
        assert_eq!(queue.recv(Some(Duration::ZERO)), Dequeue::Item(i));
    }
    assert!(queue.is_empty());
}

#[test]
fn test_full_queue_rejects_without_reordering() {
    let queue = MessageQueue::new(2);

    assert_eq!(queue.try_send("a"), Ok(()));
    assert_eq!(queue.try_send("b"), Ok(()));
    assert_eq!(queue.try_send("c"), Err(SendError::QueueFull));
    assert_eq!(queue.len(), 2);

    assert_eq!(queue.try_recv(), Some("a"));
    assert_eq!(queue.try_send("d"), Ok(()));
    assert_eq!(queue.try_recv(), Some("b"));
    assert_eq!(queue.try_recv(), Some("d"));
    assert_eq!(queue.try_recv(), None);
}

#[test]
fn test_recv_times_out_after_full_duration() {
    let queue = MessageQueue::<u32>::new(1);

    let start = Instant::now();
    let result = queue.recv(Some(Duration::from_millis(50)));

    assert_eq!(result, Dequeue::Timeout);
    assert!(start.elapsed() >= Duration::from_millis(50));
}

#[test]
fn test_recv_wakes_when_another_thread_sends() {
    let queue = Arc::new(MessageQueue::new(1));

    let producer = {
        let queue = queue.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            queue.try_send(7u32).unwrap();
        })
    };

    assert_eq!(queue.recv(None), Dequeue::Item(7));
    producer.join().unwrap();
}

#[test]
fn test_single_producer_order_is_kept_across_threads() {
    let queue = Arc::new(MessageQueue::new(1_000));

    let producer = {
        let queue = queue.clone();
        thread::spawn(move || {
            for i in 0..1_000u32 {
                queue.try_send(i).unwrap();
            }
        })
    };

    let mut received = Vec::new();
    while received.len() < 1_000 {
        match queue.recv(Some(Duration::from_secs(5))) {
            Dequeue::Item(i) => received.push(i),
            other => panic!("unexpected {other:?}"),
        }
    }

    producer.join().unwrap();
    assert_eq!(received, (0..1_000).collect::<Vec<_>>());
}

#[test]
fn test_close_discards_items_and_rejects_sends() {
    let queue = MessageQueue::new(4);
    queue.try_send(1).unwrap();
    queue.try_send(2).unwrap();

    queue.close();

    assert!(queue.is_closed());
    assert!(queue.is_empty());
    assert_eq!(queue.recv(None), Dequeue::Closed);
    assert_eq!(queue.try_send(3), Err(SendError::Closed));
}

#[test]
fn test_close_wakes_blocked_receiver() {
    let queue = Arc::new(MessageQueue::<u32>::new(1));

    let receiver = {
        let queue = queue.clone();
        thread::spawn(move || queue.recv(None))
    };

    thread::sleep(Duration::from_millis(20));
    queue.close();

    assert_eq!(receiver.join().unwrap(), Dequeue::Closed);
}

#[test]
#[should_panic(expected = "queue capacity must be > 0")]
fn test_zero_capacity_panics() {
    let _ = MessageQueue::<u8>::new(0);
}
