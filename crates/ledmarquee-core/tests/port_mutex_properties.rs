//! Property-based tests for the port queue.
//!
//! Random schedules of plain, keyed, and failing operations, interleaved
//! with pauses that let the worker make progress. After every schedule the
//! queue invariants must hold on the recorded trace.

use std::time::Duration;

use futures::{FutureExt, future::BoxFuture};
use ledmarquee_core::{DRAW_KEY, PortMutex};
use ledmarquee_harness::{ExecutionTrace, InvariantRegistry};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum QueueOp {
    /// Plain operation taking `work_ms`, failing if `fails`.
    Plain { work_ms: u8, fails: bool },
    /// Keyed draw taking `work_ms`.
    Keyed { work_ms: u8 },
    /// Let the worker run for a while before the next submission.
    Pause { ms: u8 },
}

fn op_strategy() -> impl Strategy<Value = QueueOp> {
    prop_oneof![
        3 => (0u8..20, any::<bool>()).prop_map(|(work_ms, fails)| QueueOp::Plain { work_ms, fails }),
        4 => (0u8..20).prop_map(|work_ms| QueueOp::Keyed { work_ms }),
        2 => (0u8..30).prop_map(|ms| QueueOp::Pause { ms }),
    ]
}

fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

fn test_port() -> PortMutex {
    let (host, _device) = tokio::io::duplex(64);
    PortMutex::from_transport(host, Duration::from_millis(100), "prop")
}

/// Submit `ops` in order and wait for every submission to resolve.
async fn run_schedule(port: &PortMutex, trace: &ExecutionTrace, ops: Vec<QueueOp>) {
    let mut waiting: Vec<BoxFuture<'static, ()>> = Vec::new();

    for (id, op) in (0u64..).zip(ops) {
        match op {
            QueueOp::Plain { work_ms, fails } => {
                trace.submitted(id);
                let t = trace.clone();
                let done = port.acquire(move |_| async move {
                    t.started(id);
                    tokio::time::sleep(Duration::from_millis(u64::from(work_ms))).await;
                    t.finished(id);
                    if fails { Err("injected failure") } else { Ok(id) }
                });
                waiting.push(done.map(|_| ()).boxed());
            },
            QueueOp::Keyed { work_ms } => {
                trace.submitted_keyed(id, DRAW_KEY);
                let t = trace.clone();
                let done = port.acquire_idempotent(DRAW_KEY, move |_| async move {
                    t.started(id);
                    tokio::time::sleep(Duration::from_millis(u64::from(work_ms))).await;
                    t.finished(id);
                    Ok::<(), &str>(())
                });
                waiting.push(done.boxed());
            },
            QueueOp::Pause { ms } => {
                tokio::time::sleep(Duration::from_millis(u64::from(ms))).await;
            },
        }
    }

    futures::future::join_all(waiting).await;
}

proptest! {
    /// Queue invariants hold under arbitrary schedules.
    #[test]
    fn prop_queue_invariants_hold(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let rt = paused_runtime();
        let trace = ExecutionTrace::new();

        rt.block_on(async {
            let port = test_port();
            run_schedule(&port, &trace, ops).await;
        });

        let result = InvariantRegistry::drained().check_all(&trace);
        prop_assert!(result.is_ok(), "{:?}", result.err());
    }

    /// Every plain operation runs, failing ones included.
    #[test]
    fn prop_plain_ops_all_run(fails in prop::collection::vec(any::<bool>(), 1..20)) {
        let rt = paused_runtime();
        let trace = ExecutionTrace::new();
        let count = fails.len() as u64;
        let ops = fails.into_iter().map(|fails| QueueOp::Plain { work_ms: 1, fails }).collect();

        rt.block_on(async {
            let port = test_port();
            run_schedule(&port, &trace, ops).await;
        });

        prop_assert_eq!(trace.start_order(), (0..count).collect::<Vec<_>>());
    }
}

#[tokio::test(start_paused = true)]
async fn burst_behind_slow_op_runs_only_latest() {
    let port = test_port();
    let trace = ExecutionTrace::new();

    let mut ops = vec![QueueOp::Plain { work_ms: 200, fails: false }];
    ops.extend((0..5).map(|_| QueueOp::Keyed { work_ms: 5 }));
    run_schedule(&port, &trace, ops).await;

    assert_eq!(trace.start_order(), vec![0, 5]);
    InvariantRegistry::drained().assert_all(&trace, "after burst");
}

#[tokio::test(start_paused = true)]
async fn keyed_ops_spaced_out_all_run() {
    let port = test_port();
    let trace = ExecutionTrace::new();

    let ops = vec![
        QueueOp::Keyed { work_ms: 5 },
        QueueOp::Pause { ms: 20 },
        QueueOp::Keyed { work_ms: 5 },
        QueueOp::Pause { ms: 20 },
        QueueOp::Keyed { work_ms: 5 },
    ];
    run_schedule(&port, &trace, ops).await;

    assert_eq!(trace.start_order(), vec![0, 2, 4]);
}

#[tokio::test]
async fn failed_op_yields_none_and_queue_continues() {
    let port = test_port();

    let failed = port.acquire(|_| async { Err::<u8, _>("device unplugged") }).await;
    let next = port.acquire(|_| async { Ok::<_, &str>(7u8) }).await;

    assert_eq!(failed, None);
    assert_eq!(next, Some(7));
}

#[tokio::test]
async fn clones_share_one_queue() {
    let port = test_port();
    let other = port.clone();
    let trace = ExecutionTrace::new();

    let t = trace.clone();
    let first = port.acquire(move |_| async move {
        t.started(1);
        tokio::time::sleep(Duration::from_millis(10)).await;
        t.finished(1);
        Ok::<_, &str>(())
    });
    let t = trace.clone();
    let second = other.acquire(move |_| async move {
        t.started(2);
        t.finished(2);
        Ok::<_, &str>(())
    });
    trace.submitted(1);
    trace.submitted(2);

    futures::join!(first, second);

    assert_eq!(trace.start_order(), vec![1, 2]);
    InvariantRegistry::standard().assert_all(&trace, "across clones");
}
