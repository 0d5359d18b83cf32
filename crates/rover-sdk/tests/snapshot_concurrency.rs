//! 快照并发测试
//!
//! 验证后台线程发布、调度线程读取时不会出现撕裂状态，以及后台线程能按停止标志退出。

use rover_sdk::driver::worker::spawn_worker;
use rover_sdk::driver::{PollingWorker, RunFlag, SnapshotCell};
use rover_sdk::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// 成对写入的状态，`doubled` 必须始终等于 `value * 2`
#[derive(Debug, Clone, Copy, Default)]
struct Pair {
    value: u64,
    doubled: u64,
}

/// 测试多读者并发读取
#[test]
fn test_concurrent_readers_never_see_torn_state() {
    let cell = SnapshotCell::new(Pair::default());
    let writes = 5_000u64;
    let num_readers = 8;

    let writer_cell = cell.clone();
    let writer = thread::spawn(move || {
        for i in 1..=writes {
            writer_cell.publish(Pair {
                value: i,
                doubled: i * 2,
            });
            thread::yield_now();
        }
    });

    let readers: Vec<_> = (0..num_readers)
        .map(|_| {
            let cell = cell.clone();
            thread::spawn(move || {
                let mut last = 0u64;
                for _ in 0..writes {
                    let pair = cell.load();
                    assert_eq!(pair.doubled, pair.value * 2);
                    // 单写者：读者看到的值不会倒退
                    assert!(pair.value >= last);
                    last = pair.value;
                    thread::yield_now();
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(cell.load().value, writes);
    assert_eq!(cell.version(), writes);
}

/// 测试轮询 worker 在全局停止标志翻转后退出
#[test]
fn test_polling_worker_stops_on_run_flag() {
    let cell = SnapshotCell::new(0u64);
    let mut next = 0u64;
    let worker = PollingWorker::new(cell.clone(), Duration::from_millis(1), move || {
        next += 1;
        Ok(next)
    });

    let running = RunFlag::new();
    let handle = spawn_worker("counter", Box::new(worker), running.clone()).unwrap();
    assert_eq!(handle.name(), "counter");

    thread::sleep(Duration::from_millis(30));
    running.stop();
    handle.join_timeout(Duration::from_secs(2)).unwrap();

    let published = *cell.load();
    assert!(published >= 1);
    assert_eq!(cell.version(), published);
}

/// 测试轮询失败时保留上一次快照
#[test]
fn test_failed_polls_keep_last_snapshot() {
    let cell = SnapshotCell::new(Arc::new(ImageFrame::new(4, 4)));
    let mut polls = 0u32;
    let worker = PollingWorker::new(cell.clone(), Duration::from_millis(1), move || {
        polls += 1;
        if polls == 1 {
            Ok(Arc::new(ImageFrame::new(8, 8)))
        } else {
            Err(PartError::Transient("camera timeout".to_string()))
        }
    });

    let running = RunFlag::new();
    let handle = spawn_worker("camera", Box::new(worker), running.clone()).unwrap();
    thread::sleep(Duration::from_millis(20));
    running.stop();
    handle.join_timeout(Duration::from_secs(2)).unwrap();

    assert_eq!(cell.version(), 1);
    assert_eq!(cell.load().width(), 8);
}

/// 测试 join 超时不会阻塞调用方
#[test]
fn test_join_timeout_returns_for_stuck_worker() {
    struct Stuck;

    impl BackgroundUpdate for Stuck {
        fn update(&mut self, _running: &RunFlag) {
            thread::sleep(Duration::from_millis(500));
        }
    }

    let handle = spawn_worker("stuck", Box::new(Stuck), RunFlag::new()).unwrap();
    let start = std::time::Instant::now();
    assert!(handle.join_timeout(Duration::from_millis(20)).is_err());
    assert!(start.elapsed() < Duration::from_millis(400));
}
