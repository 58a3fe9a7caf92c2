//! Integration tests: runtime-domain parallel for-each end to end.

use std::collections::LinkedList;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use parfor::{forward, parallel_for_each, ForEach, ForEachError, ThreadConfig, Visitor};

const TEST_SIZE: usize = 2048;

#[test]
fn test_index_written_into_each_slot() {
    let mut numbers = vec![0usize; TEST_SIZE];
    let counter = AtomicUsize::new(0);

    parallel_for_each(
        numbers.as_mut_slice(),
        Visitor::indexed(|val: &mut usize, idx| {
            *val = idx;
            counter.fetch_add(1, Ordering::Relaxed);
            Ok::<(), String>(())
        }),
        &ThreadConfig::default(),
    )
    .unwrap();

    assert_eq!(counter.load(Ordering::Relaxed), TEST_SIZE);
    assert_eq!(numbers, (0..TEST_SIZE).collect::<Vec<_>>());
}

#[test]
fn test_counter_matches_len_for_many_shapes() {
    for len in [0usize, 1, 2, 7, 64, 1000, 2049] {
        for threads in [1usize, 2, 3, 8, 33, 128] {
            let counter = AtomicUsize::new(0);
            ForEach::new(
                0..len,
                Visitor::element(|_i: usize| {
                    counter.fetch_add(1, Ordering::Relaxed);
                    Ok::<(), ()>(())
                }),
            )
            .threads(threads)
            .run()
            .unwrap();
            assert_eq!(counter.load(Ordering::Relaxed), len, "len={} threads={}", len, threads);
        }
    }
}

#[test]
fn test_single_failure_is_returned_for_any_worker_count() {
    for threads in [1usize, 2, 4, 7, 16, 64] {
        let numbers = vec![0usize; TEST_SIZE];
        let result = ForEach::new(
            numbers.as_slice(),
            Visitor::indexed(|_val: &usize, idx| {
                if idx == TEST_SIZE / 2 {
                    Err(format!("test failure at {}", idx))
                } else {
                    Ok(())
                }
            }),
        )
        .threads(threads)
        .run();

        match result {
            Err(ForEachError::Element { index, error, .. }) => {
                assert_eq!(index, TEST_SIZE / 2);
                assert_eq!(error, "test failure at 1024");
            }
            other => panic!("threads={}: expected element failure, got {:?}", threads, other),
        }
    }
}

#[test]
fn test_abort_stops_other_workers_early() {
    // Worker 0 fails on its first element; the others spin until they see abort.
    let processed = AtomicUsize::new(0);
    let result = ForEach::new(
        0..4000usize,
        Visitor::with_worker(|i: usize, _idx, worker| {
            if worker == 0 && i == 0 {
                return Err("stop");
            }
            processed.fetch_add(1, Ordering::Relaxed);
            std::thread::sleep(std::time::Duration::from_micros(200));
            Ok(())
        }),
    )
    .threads(4)
    .run();

    assert!(matches!(result, Err(ForEachError::Element { index: 0, worker: 0, .. })));
    // Each of the other three workers sees abort within a few elements.
    assert!(processed.load(Ordering::Relaxed) < 100);
}

#[test]
fn test_forward_domain_visits_in_order_per_chunk() {
    let list: LinkedList<usize> = (0..1000).collect();
    let seen = Mutex::new(vec![usize::MAX; 1000]);

    ForEach::new(
        forward(&list),
        Visitor::indexed(|value: &usize, idx| {
            seen.lock().unwrap()[idx] = *value;
            Ok::<(), ()>(())
        }),
    )
    .threads(6)
    .run()
    .unwrap();

    assert_eq!(seen.into_inner().unwrap(), (0..1000).collect::<Vec<_>>());
}

#[test]
fn test_progress_counts_every_chunk() {
    let reports = Mutex::new(Vec::new());
    ForEach::new(
        0..100usize,
        Visitor::element(|_i: usize| Ok::<(), ()>(())),
    )
    .threads(8)
    .progress(|done: usize| reports.lock().unwrap().push(done))
    .run()
    .unwrap();

    let mut reports = reports.into_inner().unwrap();
    reports.sort_unstable();
    assert_eq!(reports, (1..=8).collect::<Vec<_>>());
}

#[test]
fn test_failed_chunk_still_counts_as_completed() {
    let completed = AtomicUsize::new(0);
    let result = ForEach::new(
        0..40usize,
        Visitor::element(|i: usize| if i == 3 { Err(i) } else { Ok(()) }),
    )
    .threads(4)
    .progress(|done: usize| {
        completed.fetch_max(done, Ordering::Relaxed);
    })
    .run();

    assert!(result.is_err());
    assert_eq!(completed.load(Ordering::Relaxed), 4);
}

#[test]
fn test_panicking_callback_surfaces_as_worker_panicked() {
    let result = ForEach::new(
        0..16usize,
        Visitor::element(|i: usize| {
            if i == 15 {
                panic!("callback blew up");
            }
            Ok::<(), ()>(())
        }),
    )
    .threads(4)
    .run();

    match result {
        Err(ForEachError::WorkerPanicked { worker, message }) => {
            assert_eq!(worker, 3);
            assert!(message.contains("callback blew up"));
        }
        other => panic!("expected WorkerPanicked, got {:?}", other),
    }
}

#[test]
fn test_repeated_runs_are_identical() {
    let input: Vec<u64> = (0..TEST_SIZE as u64).collect();
    let run = || {
        let mut out = vec![0u64; TEST_SIZE];
        let mut zipped: Vec<(&u64, &mut u64)> = input.iter().zip(out.iter_mut()).collect();
        ForEach::new(
            zipped.as_mut_slice(),
            Visitor::element(|pair: &mut (&u64, &mut u64)| {
                *pair.1 = pair.0 * pair.0 + 1;
                Ok::<(), ()>(())
            }),
        )
        .threads(5)
        .run()
        .unwrap();
        drop(zipped);
        out
    };

    let first = run();
    for _ in 0..5 {
        assert_eq!(run(), first);
    }
}
