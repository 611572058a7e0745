//! Property-based tests for interrupt regions and release ordering

use proptest::prelude::*;
use reservoir::managed::{self, ManagedExt};
use reservoir::prelude::*;
use reservoir::testing::EventLog;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build runtime")
}

fn status_strategy() -> impl Strategy<Value = InterruptStatus> {
    any::<bool>().prop_map(InterruptStatus::from_bool)
}

/// Observes the status before and after the inner regions at every level.
fn nested(statuses: Vec<InterruptStatus>) -> BoxedEffect<Vec<(InterruptStatus, InterruptStatus)>, String, ()> {
    let Some((&status, rest)) = statuses.split_first() else {
        return pure(Vec::new()).boxed();
    };
    let rest = rest.to_vec();
    check_interruptible()
        .and_then(move |before| {
            nested(rest).and_then(move |inner| {
                check_interruptible().map(move |after| {
                    let mut observed = vec![(before, after)];
                    observed.extend(inner);
                    observed
                })
            })
        })
        .with_interrupt_status(status)
        .boxed()
}

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Succeed,
    Fail,
    Die,
    Panic,
}

fn outcome_strategy() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        Just(Outcome::Succeed),
        Just(Outcome::Fail),
        Just(Outcome::Die),
        Just(Outcome::Panic),
    ]
}

fn body(outcome: Outcome) -> BoxedEffect<(), String, ()> {
    match outcome {
        Outcome::Succeed => pure(()).boxed(),
        Outcome::Fail => fail("body failed".to_string()).boxed(),
        Outcome::Die => die("body died").boxed(),
        Outcome::Panic => from_fn(|_: &()| -> Result<(), String> { panic!("body panicked") }).boxed(),
    }
}

/// Resources `index..depth`, each used by a `with` nested in the previous one.
fn nested_use(log: EventLog, index: usize, depth: usize, outcome: Outcome) -> BoxedEffect<(), String, ()> {
    let acquire_log = log.clone();
    let release_log = log.clone();
    let resource = managed::make(
        from_fn(move |_: &()| {
            acquire_log.push(format!("acquire {}", index));
            Ok::<_, String>(index)
        }),
        move |index| async move { release_log.push(format!("release {}", index)) },
    );
    resource
        .with(move |_| {
            if index + 1 < depth {
                nested_use(log, index + 1, depth, outcome)
            } else {
                body(outcome)
            }
        })
        .boxed()
}

proptest! {
    #[test]
    fn prop_every_region_restores_its_status(
        statuses in prop::collection::vec(status_strategy(), 0..8)
    ) {
        let observed = runtime().block_on(nested(statuses.clone()).execute(&()));
        let expected: Vec<_> = statuses.iter().map(|&s| (s, s)).collect();
        prop_assert_eq!(observed, Exit::Success(expected));
    }

    #[test]
    fn prop_uninterruptible_is_sticky_under_nesting(depth in 1usize..6) {
        let statuses = vec![InterruptStatus::Uninterruptible; depth];
        let observed = runtime().block_on(nested(statuses).execute(&()));
        let all_masked = observed
            .success()
            .is_some_and(|levels| levels.iter().all(|&(b, a)| b.is_uninterruptible() && a.is_uninterruptible()));
        prop_assert!(all_masked);
    }

    #[test]
    fn prop_nested_resources_release_once_in_reverse_order(
        depth in 1usize..6,
        outcome in outcome_strategy(),
    ) {
        let log = EventLog::new();
        let exit = runtime().block_on(nested_use(log.clone(), 0, depth, outcome).execute(&()));

        let acquired: Vec<String> = (0..depth).map(|i| format!("acquire {}", i)).collect();
        let released: Vec<String> = (0..depth).rev().map(|i| format!("release {}", i)).collect();
        let expected: Vec<String> = acquired.into_iter().chain(released).collect();
        prop_assert_eq!(log.events(), expected);

        match outcome {
            Outcome::Succeed => prop_assert_eq!(exit, Exit::Success(())),
            Outcome::Fail => prop_assert_eq!(exit, Exit::fail("body failed".to_string())),
            Outcome::Die | Outcome::Panic => {
                prop_assert!(exit.cause().is_some_and(|cause| cause.is_die()))
            }
        }
    }

    #[test]
    fn prop_status_bool_round_trip(status in status_strategy()) {
        prop_assert_eq!(InterruptStatus::from_bool(status.to_bool()), status);
        prop_assert_eq!(status.is_interruptible(), status.to_bool());
    }
}
