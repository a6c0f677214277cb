use pretty_assertions::assert_eq;
use std::time::{Duration, Instant};
use swapwatch::aggregator::{Aggregator, Snapshot, UsageRecord};
use swapwatch::parser::{parse_line, Direction, PagingEvent};

fn keys(snapshot: &Snapshot) -> Vec<&str> {
    snapshot.iter().map(|r| r.process_key.as_str()).collect()
}

#[test]
fn test_end_to_end_in_and_out() {
    let mut agg = Aggregator::default();

    for line in [
        "t  PgIn  B=400  /private/var/vm/swapfile0 W foo.1",
        "t  PgOut  B=800  /private/var/vm/swapfile0 W foo.1",
    ] {
        agg.apply(&parse_line(line).unwrap());
    }

    let expected = UsageRecord {
        process_key: "foo".to_string(),
        process_id: 1,
        total_in_bytes: 1024,
        total_out_bytes: 2048,
        in_count: 1,
        out_count: 1,
    };

    assert_eq!(agg.snapshot().into_records(), vec![expected]);
}

#[test]
fn test_sort_contract() {
    let mut agg = Aggregator::default();
    agg.apply(&PagingEvent::new(Direction::In, 500, "A", 1));
    agg.apply(&PagingEvent::new(Direction::In, 300, "B", 2));
    agg.apply(&PagingEvent::new(Direction::In, 1, "C", 3));
    agg.apply(&PagingEvent::new(Direction::Out, 10, "C", 3));

    assert_eq!(keys(&agg.snapshot()), vec!["C", "A", "B"]);
}

#[test]
fn test_snapshot_idempotent() {
    let mut agg = Aggregator::default();
    for (i, key) in ["x", "y", "z", "w"].iter().enumerate() {
        agg.apply(&PagingEvent::new(Direction::In, 100, *key, i as u32));
    }

    assert_eq!(agg.snapshot(), agg.snapshot());
}

#[test]
fn test_snapshot_independent_of_live_state() {
    let mut agg = Aggregator::default();
    agg.apply(&PagingEvent::new(Direction::Out, 100, "foo", 1));
    let before = agg.snapshot();

    agg.apply(&PagingEvent::new(Direction::Out, 100, "foo", 1));

    assert_eq!(before.records()[0].total_out_bytes, 100);
    assert_eq!(agg.snapshot().records()[0].total_out_bytes, 200);
}

#[test]
fn test_counters_monotonic() {
    let mut agg = Aggregator::default();
    let events = [
        PagingEvent::new(Direction::In, 4096, "a", 1),
        PagingEvent::new(Direction::Out, 0, "a", 1),
        PagingEvent::new(Direction::Out, 8192, "b", 2),
        PagingEvent::new(Direction::In, u64::MAX, "a", 1),
        PagingEvent::new(Direction::In, 1, "a", 1),
    ];

    let mut previous = agg.snapshot();
    for event in &events {
        agg.apply(event);
        let current = agg.snapshot();

        for old in previous.iter() {
            let new = current.find(&old.process_key).unwrap();
            assert!(new.total_in_bytes >= old.total_in_bytes);
            assert!(new.total_out_bytes >= old.total_out_bytes);
            assert!(new.in_count >= old.in_count);
            assert!(new.out_count >= old.out_count);
        }
        previous = current;
    }

    assert_eq!(previous.find("a").unwrap().total_in_bytes, u64::MAX);
    assert_eq!(previous.find("a").unwrap().in_count, 3);
}

#[test]
fn test_publish_throttling() {
    let mut agg = Aggregator::new(Duration::from_millis(500));
    let now = Instant::now();
    let mut published = 0;

    agg.apply(&PagingEvent::new(Direction::In, 1, "foo", 1));
    published += agg.poll_publish_at(now).is_some() as usize;

    agg.apply(&PagingEvent::new(Direction::In, 1, "foo", 1));
    published += agg
        .poll_publish_at(now + Duration::from_millis(200))
        .is_some() as usize;

    assert_eq!(published, 1);

    let later = agg.poll_publish_at(now + Duration::from_millis(600)).unwrap();
    assert_eq!(later.records()[0].in_count, 2);
}
