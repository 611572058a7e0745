//! Integration tests for managed resources.
//!
//! These tests drive whole recipes through forked fibers and check the
//! ordering guarantees: release exactly once, never without a successful
//! acquire, always before the caller sees the exit, and in reverse order.

use std::path::PathBuf;
use std::sync::Arc;

use reservoir::managed::{self, Managed, ManagedExt, Reservation};
use reservoir::prelude::*;
use reservoir::testing::{EventLog, Latch};
use reservoir::{assert_failure, assert_interrupted, assert_success};

#[derive(Debug, Clone, PartialEq)]
enum AppError {
    Io(String),
    Rejected(&'static str),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

fn temp_file_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("reservoir_managed_test_{}.txt", name))
}

/// A resource whose acquire and release are recorded in `log`.
fn tracked(
    log: &EventLog,
    name: &'static str,
) -> impl Managed<Output = &'static str, Error = AppError, Env = ()> {
    let acquire_log = log.clone();
    let release_log = log.clone();
    managed::make(
        from_fn(move |_: &()| {
            acquire_log.push(format!("acquire {}", name));
            Ok::<_, AppError>(name)
        }),
        move |name| async move {
            release_log.push(format!("release {}", name));
        },
    )
}

/// A resource whose release records the exit it observed.
fn exit_aware(log: &EventLog) -> impl Managed<Output = u8, Error = AppError, Env = ()> {
    let release_log = log.clone();
    managed::make_exit(pure::<_, AppError, ()>(1), move |_, exit: &Exit<(), AppError>| {
        let seen = match exit {
            Exit::Success(()) => "success".to_string(),
            Exit::Failure(cause) => cause_kind(cause),
        };
        async move { release_log.push(format!("release after {}", seen)) }
    })
}

fn cause_kind(cause: &Cause<AppError>) -> String {
    if cause.is_interrupted() {
        "interruption".to_string()
    } else if cause.is_die() {
        "defect".to_string()
    } else {
        "failure".to_string()
    }
}

// ============================================================================
// Scenario A: a file opened for the duration of a failing body
// ============================================================================

#[tokio::test]
async fn file_is_closed_once_when_the_body_fails() {
    let path = temp_file_path("scenario_a");
    let log = EventLog::new();

    let file = {
        let open_path = path.clone();
        let close_log = log.clone();
        managed::make(
            from_async(move |_: &()| async move {
                tokio::fs::write(&open_path, "header\n").await?;
                Ok::<_, AppError>(open_path)
            }),
            move |path: PathBuf| async move {
                let _ = tokio::fs::remove_file(&path).await;
                close_log.push("close");
            },
        )
    };

    let exit = file
        .with(|path| {
            let path = path.clone();
            from_async(move |_: &()| async move {
                let contents = tokio::fs::read_to_string(&path).await?;
                assert_eq!(contents, "header\n");
                Err::<(), _>(AppError::Rejected("malformed row"))
            })
        })
        .execute(&())
        .await;

    assert_eq!(exit, Exit::fail(AppError::Rejected("malformed row")));
    assert_eq!(log.events(), vec!["close"]);
    assert!(!path.exists());
}

// ============================================================================
// P1: release exactly once for every body outcome
// ============================================================================

#[tokio::test]
async fn release_runs_exactly_once_for_each_body_outcome() {
    let log = EventLog::new();

    let ok = exit_aware(&log).with(|n| pure(*n)).execute(&()).await;
    assert_eq!(assert_success!(ok), 1);

    let failed = exit_aware(&log)
        .with(|_| fail::<u8, _, ()>(AppError::Rejected("nope")))
        .execute(&())
        .await;
    assert_failure!(failed);

    let died = exit_aware(&log)
        .with(|_| die::<u8, AppError, ()>("corrupt state"))
        .execute(&())
        .await;
    assert!(assert_failure!(died).is_die());

    let started = Latch::new();
    let signal = started.clone();
    let fiber = fork(
        exit_aware(&log).with(move |_| {
            signal.open();
            never::<u8, AppError, ()>()
        }),
        &(),
    );
    started.wait().await;
    assert_interrupted!(fiber.interrupt().await);

    assert_eq!(
        log.events(),
        vec![
            "release after success",
            "release after failure",
            "release after defect",
            "release after interruption",
        ]
    );
}

// ============================================================================
// P2 and Scenario C: no release without a resource
// ============================================================================

#[tokio::test]
async fn failed_acquire_never_releases() {
    let log = EventLog::new();
    let release_log = log.clone();
    let managed = managed::make(
        fail::<u8, _, ()>(AppError::Rejected("pool exhausted")),
        move |_| async move { release_log.push("release") },
    );

    let exit = managed.with(|n| pure(*n)).execute(&()).await;
    assert_eq!(exit, Exit::fail(AppError::Rejected("pool exhausted")));
    assert!(log.is_empty());
}

#[tokio::test]
async fn interrupted_interruptible_acquire_never_releases() {
    let log = EventLog::new();
    let waiting = Latch::new();

    let managed = {
        let log = log.clone();
        let waiting = waiting.clone();
        managed::make_reservation(from_fn(move |_: &()| {
            let acquire = from_async(move |_: &()| async move {
                waiting.open();
                std::future::pending::<Result<u8, AppError>>().await
            });
            let release = move |_: u8, _: &Exit<(), AppError>| async move { log.push("release") };
            Ok::<_, AppError>(Reservation::new(acquire, release))
        }))
    };

    let body_log = log.clone();
    let fiber = fork(
        managed.with(move |_| {
            body_log.push("body");
            pure(())
        }),
        &(),
    );
    waiting.wait().await;
    let exit = fiber.interrupt().await;

    assert_eq!(exit, Exit::interrupt(FiberId::NONE));
    assert!(log.is_empty());
}

#[tokio::test]
async fn uninterruptible_acquire_completes_and_is_released() {
    let log = EventLog::new();
    let acquiring = Latch::new();
    let finish = Latch::new();

    let managed = {
        let acquire_log = log.clone();
        let release_log = log.clone();
        let acquiring = acquiring.clone();
        let finish = finish.clone();
        managed::make(
            from_async(move |_: &()| async move {
                acquiring.open();
                finish.wait().await;
                acquire_log.push("acquired");
                Ok::<_, AppError>(())
            }),
            move |_| async move { release_log.push("released") },
        )
    };

    let fiber = fork(managed.with(|_| never::<(), AppError, ()>()), &());
    acquiring.wait().await;
    fiber.interrupt_fork();
    finish.open();

    let exit = fiber.join().await;
    assert_interrupted!(exit);
    assert_eq!(log.events(), vec!["acquired", "released"]);
}

// ============================================================================
// P3: release completes before the interrupted caller resumes
// ============================================================================

#[tokio::test]
async fn interrupt_waits_for_a_slow_release() {
    let log = EventLog::new();
    let in_use = Latch::new();

    let managed = {
        let release_log = log.clone();
        managed::make(pure::<_, AppError, ()>(()), move |_| async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            release_log.push("release finished");
        })
    };

    let signal = in_use.clone();
    let fiber = fork(
        managed.with(move |_| {
            signal.open();
            never::<(), AppError, ()>()
        }),
        &(),
    );
    in_use.wait().await;
    let exit = fiber.interrupt().await;
    log.push("caller resumed");

    assert_interrupted!(exit);
    assert_eq!(log.events(), vec!["release finished", "caller resumed"]);
}

// ============================================================================
// P4: a failing second acquisition releases the first
// ============================================================================

#[tokio::test]
async fn second_acquire_failure_releases_the_first() {
    let log = EventLog::new();
    let second_log = log.clone();

    let chain = tracked(&log, "A").flat_map(move |_| {
        let acquire_log = second_log.clone();
        let release_log = second_log.clone();
        managed::make(
            from_fn(move |_: &()| {
                acquire_log.push("acquire B fails");
                Err::<&'static str, _>(AppError::Rejected("B unavailable"))
            }),
            move |_| async move { release_log.push("release B") },
        )
    });

    let exit = chain.with(|b| pure(*b)).execute(&()).await;
    assert_eq!(exit, Exit::fail(AppError::Rejected("B unavailable")));
    assert_eq!(log.events(), vec!["acquire A", "acquire B fails", "release A"]);
}

// ============================================================================
// Scenario B: queue then file, interrupted while in use
// ============================================================================

#[derive(Debug)]
struct Queue {
    sender: tokio::sync::mpsc::Sender<String>,
    spool: PathBuf,
}

#[derive(Debug, Clone)]
struct Spool {
    path: PathBuf,
    queue: Arc<Queue>,
}

/// A spool file whose location is chosen by the queue it belongs to.
fn spool_for(
    queue: &Arc<Queue>,
    log: &EventLog,
) -> impl Managed<Output = Spool, Error = AppError, Env = ()> {
    let queue = Arc::clone(queue);
    let release_log = log.clone();
    managed::make(
        from_async(move |_: &()| async move {
            tokio::fs::write(&queue.spool, "").await?;
            Ok::<_, AppError>(Spool {
                path: queue.spool.clone(),
                queue,
            })
        }),
        move |spool: Spool| async move {
            let _ = tokio::fs::remove_file(&spool.path).await;
            release_log.push("release file");
        },
    )
}

#[tokio::test]
async fn queue_and_file_are_released_in_reverse_order_on_interrupt() {
    let log = EventLog::new();
    let path = temp_file_path("scenario_b");
    let (sender, mut receiver) = tokio::sync::mpsc::channel::<String>(8);

    let queue = {
        let release_log = log.clone();
        let spool = path.clone();
        managed::make(
            from_fn(move |_: &()| Ok::<_, AppError>(Arc::new(Queue { sender, spool }))),
            move |queue: Arc<Queue>| async move {
                let _ = queue.sender.send("queue closed".to_string()).await;
                release_log.push("release queue");
            },
        )
    };

    let file_log = log.clone();
    let resources = queue.flat_map(move |queue| spool_for(queue, &file_log));

    let fiber = fork(
        resources.with(|spool| {
            let spool = spool.clone();
            from_async(move |_: &()| async move {
                tokio::fs::write(&spool.path, "job-1\n").await?;
                let _ = spool.queue.sender.send("working".to_string()).await;
                std::future::pending::<Result<(), AppError>>().await
            })
        }),
        &(),
    );

    assert_eq!(receiver.recv().await.as_deref(), Some("working"));
    assert_eq!(tokio::fs::read_to_string(&path).await.ok().as_deref(), Some("job-1\n"));
    let exit = fiber.interrupt().await;

    assert_interrupted!(exit);
    assert_eq!(log.events(), vec!["release file", "release queue"]);
    assert_eq!(receiver.recv().await.as_deref(), Some("queue closed"));
    assert!(!path.exists());
}

// ============================================================================
// Finalizer defects
// ============================================================================

#[tokio::test]
async fn release_defects_are_aggregated_after_the_body_cause() {
    let log = EventLog::new();
    let outer_log = log.clone();
    let outer = managed::make(pure::<_, AppError, ()>("outer"), move |_| async move {
        outer_log.push("release outer");
    });
    let broken = managed::make(pure::<_, AppError, ()>("broken"), |_| async {
        if true {
            panic!("close failed");
        }
    });

    let exit = outer
        .flat_map(move |_| broken)
        .with(|_| fail::<(), _, ()>(AppError::Rejected("body failed")))
        .execute(&())
        .await;

    let cause = assert_failure!(exit);
    assert_eq!(cause.failures(), vec![&AppError::Rejected("body failed")]);
    assert_eq!(cause.defects()[0].message(), "close failed");
    assert_eq!(log.events(), vec!["release outer"]);
}

// ============================================================================
// Drop safety
// ============================================================================

#[tokio::test]
async fn aborting_the_task_still_releases() {
    let log = EventLog::new();
    let in_use = Latch::new();
    let signal = in_use.clone();
    let effect = tracked(&log, "lease").with(move |_| {
        signal.open();
        never::<(), AppError, ()>()
    });

    let task = tokio::spawn(async move { effect.execute(&()).await });
    in_use.wait().await;
    task.abort();
    assert!(task.await.is_err_and(|err| err.is_cancelled()));

    log.wait_for_len(2).await;
    assert_eq!(log.events(), vec!["acquire lease", "release lease"]);
}

#[tokio::test]
async fn timing_out_a_with_call_still_releases() {
    let log = EventLog::new();
    let effect = tracked(&log, "slot").with(|_| never::<(), AppError, ()>());

    let timed_out = tokio::time::timeout(
        std::time::Duration::from_millis(10),
        effect.execute(&()),
    )
    .await;
    assert!(timed_out.is_err());

    log.wait_for_len(2).await;
    assert_eq!(log.events(), vec!["acquire slot", "release slot"]);
}

#[tokio::test]
async fn timing_out_during_release_still_finishes_every_finalizer() {
    let log = EventLog::new();
    let slow_log = log.clone();
    let chain = tracked(&log, "a").flat_map(move |_| {
        managed::make(pure::<_, AppError, ()>("b"), move |name| async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            slow_log.push(format!("release {}", name));
        })
    });

    let timed_out = tokio::time::timeout(
        std::time::Duration::from_millis(10),
        chain.with(|_| pure::<_, AppError, ()>(())).execute(&()),
    )
    .await;
    assert!(timed_out.is_err());

    log.wait_for_len(3).await;
    assert_eq!(log.events(), vec!["acquire a", "release b", "release a"]);
}
