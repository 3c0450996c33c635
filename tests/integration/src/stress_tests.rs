//! Stress Tests - Concurrent Calls on Shared Connections
//!
//! These tests exercise call-local marshaling state by:
//! - Running many concurrent calls over one bound connection
//! - Mixing operations with different payload shapes
//! - Checking every reply against its own request
//! - Measuring throughput and latency

mod common;

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tokio::sync::Barrier;

use common::*;
use msrpc::CallOptions;
use msrpc_ndr::{ConformantArray, NdrWString, UniquePtr};

/// Many tasks share one `BoundConn`; no reply may carry another call's data
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_calls_share_bound_conn() {
    init_logging();

    const TASKS: usize = 32;
    const CALLS_PER_TASK: usize = 50;

    let conn = connect_echo().await;
    let stats = Arc::new(ConcurrentStats::new());
    let barrier = Arc::new(Barrier::new(TASKS));

    let handles: Vec<_> = (0..TASKS)
        .map(|task| {
            let conn = Arc::clone(&conn);
            let stats = Arc::clone(&stats);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                for call in 0..CALLS_PER_TASK {
                    let text = format!("task_{}_call_{}", task, call);
                    let start = Instant::now();
                    match conn.call(Echo::new(&text), &CallOptions::default()).await {
                        Ok(op) if op.reply.as_str() == text => stats.record_success(start.elapsed()),
                        Ok(op) => {
                            eprintln!("task {} got {:?} for {:?}", task, op.reply.as_str(), text);
                            stats.record_failure();
                        }
                        Err(e) => {
                            eprintln!("task {} call {} failed: {}", task, call, e);
                            stats.record_failure();
                        }
                    }
                }
            })
        })
        .collect();

    for handle in join_all(handles).await {
        handle.unwrap();
    }

    println!(
        "{} calls, avg latency {:?}, max latency {:?}",
        stats.success_count(),
        stats.avg_latency(),
        stats.max_latency()
    );
    assert_eq!(stats.failure_count(), 0);
    assert_eq!(stats.success_count(), (TASKS * CALLS_PER_TASK) as u64);
    assert_eq!(conn.call_count(), (TASKS * CALLS_PER_TASK) as u32);
}

/// Interleaved operations of different shapes keep their own results
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mixed_operations_interleave() {
    init_logging();

    let conn = connect_echo().await;
    let options = CallOptions::default();

    let sums = (0..64).map(|n: i32| {
        let conn = Arc::clone(&conn);
        let options = options.clone();
        async move {
            let values: Vec<i32> = (0..=n).collect();
            let op = Sum {
                values: ConformantArray::new(values),
                ..Default::default()
            };
            let total = conn.call(op, &options).await.unwrap().total;
            assert_eq!(total, (n as i64) * (n as i64 + 1) / 2);
        }
    });

    let measures = (0..64).map(|n: usize| {
        let conn = Arc::clone(&conn);
        let options = options.clone();
        async move {
            let text = match n % 3 {
                0 => UniquePtr::null(),
                _ => UniquePtr::new(NdrWString::new(&"x".repeat(n))),
            };
            let expected = if n % 3 == 0 { -1 } else { n as i32 };
            let op = Measure {
                text,
                ..Default::default()
            };
            assert_eq!(conn.call(op, &options).await.unwrap().length, expected);
        }
    });

    let sums = tokio::spawn(join_all(sums));
    let measures = tokio::spawn(join_all(measures));
    sums.await.unwrap();
    measures.await.unwrap();
    assert_eq!(conn.call_count(), 128);
}

/// Failures on some calls do not disturb the calls around them
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failures_stay_with_their_call() {
    init_logging();

    let conn = connect_echo().await;
    let calls = (0..100u32).map(|n| {
        let conn = Arc::clone(&conn);
        async move {
            let text = if n % 2 == 0 {
                format!("status:{:08x}", 0x8007_0000 + n)
            } else {
                format!("ok {}", n)
            };
            (n, conn.call(Echo::new(&text), &CallOptions::default()).await)
        }
    });

    for (n, result) in join_all(calls).await {
        match result {
            Ok(op) => {
                assert_eq!(n % 2, 1);
                assert_eq!(op.reply.as_str(), format!("ok {}", n));
            }
            Err(e) => {
                assert_eq!(n % 2, 0);
                let code = e.status().map(|s| s.code());
                assert_eq!(code, Some(0x8007_0000 + n));
            }
        }
    }
}
